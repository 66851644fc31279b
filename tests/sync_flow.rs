use axum_procurement_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        basket::{AddItemsRequest, NewBasketItem},
        contacts::CreateContactRequest,
        orders::PlaceOrderRequest,
        partner::{PartnerStateRequest, PartnerUpdateRequest, StateFlag},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    feed,
    middleware::auth::AuthUser,
    models::OrderState,
    routes::params::ProductQuery,
    services::{
        basket_service, catalog_service, contact_service, order_service, partner_service,
        sync_service,
    },
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};

const FEED_V1: &str = r#"
shop_name: Beta Components
categories:
  - id: 224
    name: Smartphones
  - id: 15
    name: Accessories
goods:
  - id: 101
    category: 224
    name: Smartphone Alpha 64GB
    price: 30000
    price_rrc: 34990
    quantity: 5
    parameters:
      "Color": black
      "RAM (GB)": 4
  - id: 102
    category: 15
    name: Silicone case
    price: 300
    price_rrc: 490
    quantity: 40
"#;

// Same shop, one good repriced, one good gone, one new category.
const FEED_V2: &str = r#"
shop_name: Beta Components
categories:
  - id: 224
    name: Smartphones
  - id: 7
    name: Cables
goods:
  - id: 101
    category: 224
    name: Smartphone Alpha 64GB
    price: 28000
    price_rrc: 31990
    quantity: 11
    parameters:
      "Color": red
"#;

const FEED_DUPLICATE: &str = r#"
shop_name: Beta Components
categories:
  - id: 224
    name: Smartphones
goods:
  - id: 101
    category: 224
    name: Smartphone Alpha 64GB
    price: 1000
    price_rrc: 1000
    quantity: 1
  - id: 101
    category: 224
    name: Smartphone Alpha 64GB
    price: 2000
    price_rrc: 2000
    quantity: 2
"#;

// A re-sync fully replaces the shop's offers while categories only grow, and
// a failing sync leaves the previous catalog in place.
#[tokio::test]
async fn resync_replaces_offers_and_failures_roll_back() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run sync flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let supplier_id = create_user(&state, "shop", "beta@example.com").await?;
    let buyer_id = create_user(&state, "buyer", "buyer@example.com").await?;
    let auth_supplier = AuthUser {
        user_id: supplier_id,
        role: "shop".into(),
    };
    let auth_buyer = AuthUser {
        user_id: buyer_id,
        role: "buyer".into(),
    };

    let v1 = feed::parse(FEED_V1)?;
    v1.validate()?;
    let summary = sync_service::apply_feed(&state, supplier_id, &v1).await?;
    assert_eq!(summary.categories, 2);
    assert_eq!(summary.goods, 2);

    let offers = list_all_offers(&state).await?;
    assert_eq!(offers.len(), 2);
    let mut external_ids: Vec<i32> = offers.iter().map(|o| o.external_id).collect();
    external_ids.sort_unstable();
    assert_eq!(external_ids, vec![101, 102]);
    let old_phone = offers
        .iter()
        .find(|o| o.external_id == 101)
        .expect("phone offer")
        .clone();
    assert_eq!(old_phone.price, 30000);
    assert_eq!(old_phone.parameters.len(), 2);

    // Re-syncing the same document creates fresh offer rows with the same
    // content and grows none of the shared tables.
    let counts_before = table_counts(&state).await?;
    sync_service::apply_feed(&state, supplier_id, &v1).await?;
    assert_eq!(table_counts(&state).await?, counts_before);

    let offers = list_all_offers(&state).await?;
    assert_eq!(offers.len(), 2);
    let resynced_phone = offers
        .iter()
        .find(|o| o.external_id == 101)
        .expect("phone offer")
        .clone();
    assert_ne!(resynced_phone.id, old_phone.id);
    assert_eq!(resynced_phone.price, old_phone.price);
    assert_eq!(resynced_phone.quantity, old_phone.quantity);
    assert_eq!(resynced_phone.parameters, old_phone.parameters);
    let old_phone = resynced_phone;

    // A basket line against the v1 offer, to watch the replace cascade.
    basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![NewBasketItem {
                product_info: Some(old_phone.id),
                quantity: Some(1),
            }],
        },
    )
    .await?;

    let v2 = feed::parse(FEED_V2)?;
    v2.validate()?;
    let summary = sync_service::apply_feed(&state, supplier_id, &v2).await?;
    assert_eq!(summary.categories, 2);
    assert_eq!(summary.goods, 1);

    let offers = list_all_offers(&state).await?;
    assert_eq!(offers.len(), 1);
    let new_phone = &offers[0];
    // Fresh offer row, not an update of the old one.
    assert_ne!(new_phone.id, old_phone.id);
    assert_eq!(new_phone.price, 28000);
    assert_eq!(new_phone.quantity, 11);
    assert_eq!(new_phone.parameters.len(), 1);
    assert_eq!(new_phone.parameters["Color"], "red");

    // Categories from earlier feeds are kept.
    let categories = catalog_service::list_categories(&state.pool)
        .await?
        .data
        .expect("categories");
    let ids: Vec<i32> = categories.iter().map(|c| c.id).collect();
    assert!(ids.contains(&224));
    assert!(ids.contains(&15));
    assert!(ids.contains(&7));

    // The basket line went with the replaced offer.
    let basket = basket_service::view(&state, &auth_buyer)
        .await?
        .data
        .expect("basket");
    assert!(basket.items.is_empty());
    assert_eq!(basket.total_sum, 0);

    // A feed repeating an external id fails and rolls back to the v2 catalog.
    let dup = feed::parse(FEED_DUPLICATE)?;
    dup.validate()?;
    let conflict = sync_service::apply_feed(&state, supplier_id, &dup).await;
    assert!(matches!(conflict, Err(AppError::Conflict(_))));

    let offers = list_all_offers(&state).await?;
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].id, new_phone.id);
    assert_eq!(offers[0].price, 28000);

    // Role and URL checks happen before anything is fetched.
    let refused = sync_service::sync_from_url(
        &state,
        &auth_buyer,
        PartnerUpdateRequest {
            url: Some("https://supplier.example.com/feed.yaml".into()),
        },
    )
    .await;
    assert!(matches!(refused, Err(AppError::Forbidden)));

    let bad_scheme = sync_service::sync_from_url(
        &state,
        &auth_supplier,
        PartnerUpdateRequest {
            url: Some("ftp://supplier.example.com/feed.yaml".into()),
        },
    )
    .await;
    assert!(matches!(bad_scheme, Err(AppError::Validation { .. })));

    let no_url = sync_service::sync_from_url(
        &state,
        &auth_supplier,
        PartnerUpdateRequest { url: None },
    )
    .await;
    assert!(matches!(no_url, Err(AppError::Validation { .. })));

    // Switching the shop off hides its offers from the product browse; the
    // shop row itself stays listed.
    let shop = partner_service::get_state(&state, &auth_supplier)
        .await?
        .data
        .expect("shop");
    assert!(shop.accepting_orders);

    let switched = partner_service::set_state(
        &state,
        &auth_supplier,
        PartnerStateRequest {
            state: Some(StateFlag::Text("off".into())),
        },
    )
    .await?;
    assert_eq!(switched.data.expect("updated").updated, 1);

    let shops = catalog_service::list_shops(&state.pool)
        .await?
        .data
        .expect("shops");
    assert_eq!(shops.len(), 1);
    assert!(!shops[0].accepting_orders);
    assert!(list_all_offers(&state).await?.is_empty());

    // Adding to the basket still works while the shop is off, but placing
    // the order does not.
    basket_service::add_items(
        &state,
        &auth_buyer,
        AddItemsRequest {
            items: vec![NewBasketItem {
                product_info: Some(new_phone.id),
                quantity: Some(1),
            }],
        },
    )
    .await?;
    let basket = basket_service::view(&state, &auth_buyer)
        .await?
        .data
        .expect("basket");
    let contact = contact_service::create(
        &state,
        &auth_buyer,
        CreateContactRequest {
            city: Some("Tver".into()),
            street: Some("Sovetskaya".into()),
            house: Some("12".into()),
            structure: None,
            building: None,
            apartment: None,
            phone: Some("+79001112233".into()),
        },
    )
    .await?
    .data
    .expect("contact");

    let closed = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(basket.id),
            contact: Some(contact.id),
        },
    )
    .await;
    assert!(matches!(closed, Err(AppError::Conflict(_))));

    partner_service::set_state(
        &state,
        &auth_supplier,
        PartnerStateRequest {
            state: Some(StateFlag::Bool(true)),
        },
    )
    .await?;
    let shops = catalog_service::list_shops(&state.pool)
        .await?
        .data
        .expect("shops");
    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].name, "Beta Components");
    assert!(shops[0].accepting_orders);
    assert_eq!(list_all_offers(&state).await?.len(), 1);

    // With the shop back on, the same basket places cleanly.
    let placed = order_service::place_order(
        &state,
        &auth_buyer,
        PlaceOrderRequest {
            id: Some(basket.id),
            contact: Some(contact.id),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.state, OrderState::New);
    assert_eq!(placed.total_sum, 28000);

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

async fn table_counts(state: &AppState) -> anyhow::Result<(i64, i64, i64)> {
    let (categories,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
        .fetch_one(&state.pool)
        .await?;
    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.pool)
        .await?;
    let (parameters,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parameters")
        .fetch_one(&state.pool)
        .await?;
    Ok((categories, products, parameters))
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<i32> {
    let user = UserActive {
        id: NotSet,
        first_name: NotSet,
        last_name: NotSet,
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        company: NotSet,
        position: NotSet,
        role: Set(role.into()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn list_all_offers(
    state: &AppState,
) -> anyhow::Result<Vec<axum_procurement_api::models::ProductOffer>> {
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
    Ok(listing.data.expect("offers"))
}
