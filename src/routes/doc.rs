use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateDetailsRequest},
        basket::{
            AddItemsRequest, BasketItemPatch, ItemsCreated, ItemsDeleted, ItemsUpdated,
            NewBasketItem, RemoveItemsRequest, UpdateItemsRequest,
        },
        contacts::{
            ContactsDeleted, CreateContactRequest, DeleteContactsRequest, UpdateContactRequest,
        },
        orders::PlaceOrderRequest,
        partner::{PartnerStateRequest, PartnerUpdateRequest, ShopsUpdated, StateFlag, SyncSummary},
    },
    models::{
        Category, Contact, OrderDetail, OrderLine, OrderState, ProductOffer, ProductRef, Shop,
        UserProfile, UserRole,
    },
    response::{ApiResponse, Meta},
    routes::{basket, catalog, health, orders, params, partner, user},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        user::register,
        user::confirm,
        user::login,
        user::details,
        user::update_details,
        user::list_contacts,
        user::create_contact,
        user::update_contact,
        user::delete_contacts,
        partner::update_price_list,
        partner::get_state,
        partner::set_state,
        partner::partner_orders,
        basket::view_basket,
        basket::add_items,
        basket::update_items,
        basket::remove_items,
        orders::list_orders,
        orders::place_order,
        catalog::list_products,
        catalog::list_categories,
        catalog::list_shops
    ),
    components(
        schemas(
            UserProfile,
            UserRole,
            Contact,
            Shop,
            Category,
            ProductRef,
            ProductOffer,
            OrderLine,
            OrderDetail,
            OrderState,
            RegisterRequest,
            ConfirmRequest,
            LoginRequest,
            LoginResponse,
            UpdateDetailsRequest,
            CreateContactRequest,
            UpdateContactRequest,
            DeleteContactsRequest,
            ContactsDeleted,
            AddItemsRequest,
            NewBasketItem,
            UpdateItemsRequest,
            BasketItemPatch,
            RemoveItemsRequest,
            ItemsCreated,
            ItemsUpdated,
            ItemsDeleted,
            PlaceOrderRequest,
            PartnerUpdateRequest,
            PartnerStateRequest,
            StateFlag,
            SyncSummary,
            ShopsUpdated,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<UserProfile>,
            ApiResponse<LoginResponse>,
            ApiResponse<OrderDetail>,
            ApiResponse<SyncSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "User", description = "Accounts, sessions and delivery contacts"),
        (name = "Partner", description = "Supplier catalog sync and shop state"),
        (name = "Basket", description = "Basket endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Catalog", description = "Public catalog browse"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
