use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_procurement_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    feed,
    services::sync_service,
    state::AppState,
};

const DEMO_FEED: &str = r#"
shop_name: Demo Electronics
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
      "Screen size (inches)": 6.5
      "Resolution (px)": 2688x1242
      "Built-in memory (GB)": 512
      "Color": golden
  - id: 4216313
    category: 224
    model: apple/iphone/xr
    name: Smartphone Apple iPhone XR 256GB (black)
    price: 65990
    price_rrc: 69990
    quantity: 9
    parameters:
      "Screen size (inches)": 6.1
      "Built-in memory (GB)": 256
      "Color": black
  - id: 5000001
    category: 15
    model: cable/usb-c
    name: USB-C charging cable 1m
    price: 450
    price_rrc: 590
    quantity: 120
    parameters:
      "Length (m)": 1
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let buyer_id = ensure_user(&pool, "buyer@example.com", "buyer12345", "buyer").await?;
    let supplier_id = ensure_user(&pool, "supplier@example.com", "supplier12345", "shop").await?;

    let orm = create_orm_conn(&config.database_url).await?;
    let state = AppState { pool, orm };
    seed_catalog(&state, supplier_id).await?;

    println!("Seed completed. Buyer ID: {buyer_id}, Supplier ID: {supplier_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i32> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash, role, is_active)
        VALUES ('Demo', 'User', $1, $2, $3, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (i32,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(state: &AppState, supplier_id: i32) -> anyhow::Result<()> {
    let price_feed = feed::parse(DEMO_FEED)?;
    price_feed.validate()?;

    let summary = sync_service::apply_feed(state, supplier_id, &price_feed).await?;
    println!(
        "Seeded catalog for shop {} ({} categories, {} offers)",
        summary.shop_id, summary.categories, summary.goods
    );
    Ok(())
}
