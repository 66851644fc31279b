use axum_procurement_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        auth::{ConfirmRequest, LoginRequest, RegisterRequest},
        basket::{AddItemsRequest, BasketItemPatch, NewBasketItem, RemoveItemsRequest, UpdateItemsRequest},
        contacts::{CreateContactRequest, DeleteContactsRequest, UpdateContactRequest},
        orders::PlaceOrderRequest,
    },
    error::AppError,
    feed,
    middleware::auth::AuthUser,
    models::{OrderState, UserRole},
    routes::params::ProductQuery,
    services::{
        auth_service, basket_service, catalog_service, contact_service, order_service,
        sync_service,
    },
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};

const SUPPLIER_FEED: &str = r#"
shop_name: Svyaznoy
categories:
  - id: 224
    name: Smartphones
  - id: 15
    name: Accessories
goods:
  - id: 4216292
    category: 224
    model: apple/iphone/xs-max
    name: Smartphone Apple iPhone XS Max 512GB (golden)
    price: 110000
    price_rrc: 116990
    quantity: 14
    parameters:
      "Color": golden
      "Built-in memory (GB)": 512
  - id: 5000001
    category: 15
    model: cable/usb-c
    name: USB-C charging cable 1m
    price: 450
    price_rrc: 590
    quantity: 120
  - id: 5000002
    category: 15
    model: case/leather
    name: Leather case for iPhone XS Max
    price: 1100
    price_rrc: 1490
    quantity: 30
    parameters:
      "Color": black
"#;

// Integration flow: register and confirm both parties -> supplier syncs a
// feed -> buyer fills a basket -> places the order -> both sides see it.
#[tokio::test]
async fn register_sync_basket_and_place_order_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    // Login signs tokens with a secret read from the environment at call time.
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };

    let state = setup_state(&database_url).await?;

    // Buyer registers; the account stays inactive until the token comes back.
    let created =
        auth_service::register(&state.pool, register_request("anna@example.com", None)).await?;
    let buyer = created.data.expect("buyer profile");
    assert_eq!(buyer.role, UserRole::Buyer);
    assert!(buyer.contacts.is_empty());

    let premature = auth_service::login(&state.pool, login_request("anna@example.com")).await;
    assert!(matches!(premature, Err(AppError::BadCredentials)));

    let token = confirm_token(&state, buyer.id).await?;
    auth_service::confirm(
        &state.pool,
        ConfirmRequest {
            email: Some("anna@example.com".into()),
            token: Some(token),
        },
    )
    .await?;

    let logged_in = auth_service::login(&state.pool, login_request("anna@example.com")).await?;
    assert!(logged_in.data.expect("login data").token.starts_with("Bearer "));

    // Supplier account, confirmed the same way, then a synced catalog.
    let created = auth_service::register(
        &state.pool,
        register_request("supplier@example.com", Some(UserRole::Shop)),
    )
    .await?;
    let supplier = created.data.expect("supplier profile");
    let token = confirm_token(&state, supplier.id).await?;
    auth_service::confirm(
        &state.pool,
        ConfirmRequest {
            email: Some("supplier@example.com".into()),
            token: Some(token),
        },
    )
    .await?;

    let price_feed = feed::parse(SUPPLIER_FEED)?;
    price_feed.validate()?;
    let summary = sync_service::apply_feed(&state, supplier.id, &price_feed).await?;
    assert_eq!(summary.categories, 2);
    assert_eq!(summary.goods, 3);

    let auth_buyer = AuthUser {
        user_id: buyer.id,
        role: "buyer".into(),
    };
    let auth_supplier = AuthUser {
        user_id: supplier.id,
        role: "shop".into(),
    };

    let listing = catalog_service::list_products(
        &state.pool,
        ProductQuery {
            page: None,
            per_page: None,
            shop_id: None,
            category_id: None,
        },
    )
    .await?;
    let offers = listing.data.expect("offers");
    assert_eq!(offers.len(), 3);
    let phone = offers
        .iter()
        .find(|o| o.external_id == 4216292)
        .expect("phone offer");
    assert_eq!(phone.price, 110000);
    assert_eq!(phone.parameters["Color"], "golden");
    assert_eq!(phone.parameters["Built-in memory (GB)"], "512");
    assert_eq!(phone.shop.name, "Svyaznoy");
    // Parameters land on their own good, not on neighbors from the same feed.
    let case = offers
        .iter()
        .find(|o| o.external_id == 5000002)
        .expect("case offer");
    assert_eq!(case.parameters["Color"], "black");
    assert_eq!(case.parameters.len(), 1);

    // An empty basket reads as a success with no data.
    let empty = basket_service::view(&state, &auth_buyer).await?;
    assert_eq!(empty.message, "Basket is empty");
    assert!(empty.data.is_none());

    let added = basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![NewBasketItem {
                product_info: Some(phone.id),
                quantity: Some(2),
            }],
        },
    )
    .await?;
    assert_eq!(added.data.expect("created").created, 1);

    // Re-adding the same offer conflicts instead of growing the line.
    let duplicate = basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![NewBasketItem {
                product_info: Some(phone.id),
                quantity: Some(1),
            }],
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // A zero quantity is rejected up front.
    let zero = basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![NewBasketItem {
                product_info: Some(phone.id),
                quantity: Some(0),
            }],
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::Validation { .. })));

    // An unknown offer fails the whole batch, leaving the basket untouched.
    let cable = offers
        .iter()
        .find(|o| o.external_id == 5000001)
        .expect("cable offer");
    let missing = basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![
                NewBasketItem {
                    product_info: Some(cable.id),
                    quantity: Some(1),
                },
                NewBasketItem {
                    product_info: Some(999_999),
                    quantity: Some(1),
                },
            ],
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let basket = basket_service::view(&state, &auth_buyer)
        .await?
        .data
        .expect("basket");
    assert_eq!(basket.state, OrderState::Basket);
    assert_eq!(basket.items.len(), 1);
    assert_eq!(basket.total_sum, 220000);
    let line_id = basket.items[0].id;

    let updated = basket_service::update_items(
        &state,
        &auth_buyer,
        UpdateItemsRequest {
            items: vec![BasketItemPatch {
                id: Some(line_id),
                quantity: Some(3),
            }],
        },
    )
    .await?;
    assert_eq!(updated.data.expect("updated").updated, 1);

    // Another account patching that line id touches nothing.
    let foreign = basket_service::update_items(
        &state,
        &auth_supplier,
        UpdateItemsRequest {
            items: vec![BasketItemPatch {
                id: Some(line_id),
                quantity: Some(50),
            }],
        },
    )
    .await?;
    assert_eq!(foreign.data.expect("updated").updated, 0);

    // Removal from another account is the same silent miss.
    let foreign_remove = basket_service::remove_items(
        &state,
        &auth_supplier,
        RemoveItemsRequest {
            items: Some(line_id.to_string()),
        },
    )
    .await?;
    assert_eq!(foreign_remove.data.expect("deleted").deleted, 0);
    let intact = basket_service::view(&state, &auth_buyer)
        .await?
        .data
        .expect("basket");
    assert_eq!(intact.items.len(), 1);
    assert_eq!(intact.items[0].quantity, 3);

    // Removal wants at least one numeric token.
    let garbage = basket_service::remove_items(
        &state,
        &auth_buyer,
        RemoveItemsRequest {
            items: Some("x,y".into()),
        },
    )
    .await;
    assert!(matches!(garbage, Err(AppError::Validation { .. })));

    let contact = contact_service::create(&state, &auth_buyer, contact_request())
        .await?
        .data
        .expect("contact");

    // Contact mutations are owner-scoped the same way: a foreign or unknown
    // id reads as a clean no-op, and the row stays as it was.
    let foreign_update = contact_service::update(
        &state,
        &auth_supplier,
        UpdateContactRequest {
            id: Some(contact.id),
            city: Some("Elsewhere".into()),
            street: None,
            house: None,
            structure: None,
            building: None,
            apartment: None,
            phone: None,
        },
    )
    .await?;
    assert_eq!(foreign_update.message, "OK");
    assert!(foreign_update.data.is_none());

    let unknown_update = contact_service::update(
        &state,
        &auth_buyer,
        UpdateContactRequest {
            id: Some(999_999),
            city: Some("Elsewhere".into()),
            street: None,
            house: None,
            structure: None,
            building: None,
            apartment: None,
            phone: None,
        },
    )
    .await?;
    assert!(unknown_update.data.is_none());

    let foreign_delete = contact_service::delete(
        &state,
        &auth_supplier,
        DeleteContactsRequest {
            items: Some(contact.id.to_string()),
        },
    )
    .await?;
    assert_eq!(foreign_delete.data.expect("deleted").deleted, 0);

    let contacts = contact_service::list(&state, &auth_buyer)
        .await?
        .data
        .expect("contacts");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].city, "Moscow");

    // Unknown order ids and contacts the caller does not own both read as
    // missing.
    let unknown_order = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(999_999),
            contact: Some(contact.id),
        },
    )
    .await;
    assert!(matches!(unknown_order, Err(AppError::NotFound)));

    let unknown_contact = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(basket.id),
            contact: Some(999_999),
        },
    )
    .await;
    assert!(matches!(unknown_contact, Err(AppError::NotFound)));

    let placed = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(basket.id),
            contact: Some(contact.id),
        },
    )
    .await?;
    let order = placed.data.expect("order");
    assert_eq!(order.state, OrderState::New);
    assert_eq!(order.total_sum, 330000);
    assert_eq!(order.contact.as_ref().map(|c| c.id), Some(contact.id));

    // The basket slot is free again.
    let empty = basket_service::view(&state, &auth_buyer).await?;
    assert!(empty.data.is_none());

    // Placing the same order twice conflicts.
    let again = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(basket.id),
            contact: Some(contact.id),
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    // The buyer sees the order; so does the supplier whose offer it contains.
    let mine = order_service::list_orders(&state, &auth_buyer)
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, order.id);
    assert_eq!(mine[0].items.len(), 1);

    let partner = order_service::list_partner_orders(&state, &auth_supplier)
        .await?
        .data
        .expect("partner orders");
    assert!(partner.iter().any(|o| o.id == order.id));

    let refused = order_service::list_partner_orders(&state, &auth_buyer).await;
    assert!(matches!(refused, Err(AppError::Forbidden)));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, product_parameters, parameters, product_infos, \
         products, shop_categories, categories, shops, contacts, confirm_tokens, audit_logs, \
         users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

fn register_request(email: &str, role: Option<UserRole>) -> RegisterRequest {
    RegisterRequest {
        first_name: Some("Anna".into()),
        last_name: Some("Petrova".into()),
        email: Some(email.into()),
        password: Some("correct-horse-battery".into()),
        company: Some("Acme Retail".into()),
        position: Some("Manager".into()),
        role,
    }
}

fn login_request(email: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.into()),
        password: Some("correct-horse-battery".into()),
    }
}

fn contact_request() -> CreateContactRequest {
    CreateContactRequest {
        city: Some("Moscow".into()),
        street: Some("Tverskaya".into()),
        house: Some("1".into()),
        structure: None,
        building: None,
        apartment: Some("20".into()),
        phone: Some("+79991234567".into()),
    }
}

async fn confirm_token(state: &AppState, user_id: i32) -> anyhow::Result<String> {
    let (key,): (String,) = sqlx::query_as("SELECT key FROM confirm_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(key)
}
