use std::collections::BTreeMap;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{
        Claims, ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest,
        UpdateDetailsRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, UserProfile, UserRole},
    notify::{self, Notification},
    response::{ApiResponse, Meta},
};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    company: String,
    position: String,
    role: String,
    is_active: bool,
}

fn require<'a>(
    fields: &mut BTreeMap<String, String>,
    name: &str,
    value: &'a Option<String>,
) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            fields.insert(name.to_string(), "This field is required".to_string());
            ""
        }
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

pub async fn register(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let mut fields = BTreeMap::new();
    let first_name = require(&mut fields, "first_name", &payload.first_name).to_string();
    let last_name = require(&mut fields, "last_name", &payload.last_name).to_string();
    let email = require(&mut fields, "email", &payload.email).to_string();
    let password = require(&mut fields, "password", &payload.password).to_string();

    if !email.is_empty() && !email.contains('@') {
        fields.insert(
            "email".to_string(),
            "must be a valid email address".to_string(),
        );
    }
    if !password.is_empty() && password.chars().count() < 8 {
        fields.insert(
            "password".to_string(),
            "must be at least 8 characters".to_string(),
        );
    }
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let exist: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::invalid_field("email", "already registered"));
    }

    let password_hash = hash_password(&password)?;
    let company = payload.company.as_deref().unwrap_or("").trim().to_string();
    let position = payload.position.as_deref().unwrap_or("").trim().to_string();
    let role = payload.role.unwrap_or(UserRole::Buyer);

    let mut txn = pool.begin().await?;

    let inserted = sqlx::query_as::<_, (i32,)>(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash, company, position, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(first_name.as_str())
    .bind(last_name.as_str())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(company.as_str())
    .bind(position.as_str())
    .bind(role.as_str())
    .fetch_one(&mut *txn)
    .await;

    let (user_id,) = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db))
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            return Err(AppError::invalid_field("email", "already registered"));
        }
        Err(err) => return Err(err.into()),
    };

    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO confirm_tokens (user_id, key) VALUES ($1, $2)")
        .bind(user_id)
        .bind(token.as_str())
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    notify::dispatch(
        pool,
        Notification::UserRegistered {
            user_id,
            email: email.clone(),
            token,
        },
    )
    .await;

    let profile = load_profile(pool, user_id).await?;
    Ok(ApiResponse::success("User created", profile, None))
}

pub async fn confirm(pool: &DbPool, payload: ConfirmRequest) -> AppResult<ApiResponse<()>> {
    let mut fields = BTreeMap::new();
    let email = require(&mut fields, "email", &payload.email).to_string();
    let token = require(&mut fields, "token", &payload.token).to_string();
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let found: Option<(i32, i32)> = sqlx::query_as(
        r#"
        SELECT u.id, t.id
        FROM users u
        JOIN confirm_tokens t ON t.user_id = u.id
        WHERE u.email = $1 AND t.key = $2
        "#,
    )
    .bind(email.as_str())
    .bind(token.as_str())
    .fetch_optional(pool)
    .await?;

    let (user_id, token_id) =
        found.ok_or_else(|| AppError::validation("Invalid confirmation email or token"))?;

    let mut txn = pool.begin().await?;
    sqlx::query("UPDATE users SET is_active = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(&mut *txn)
        .await?;
    sqlx::query("DELETE FROM confirm_tokens WHERE id = $1")
        .bind(token_id)
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user_id),
        "user_confirm",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::empty("Account confirmed"))
}

pub async fn login(pool: &DbPool, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let mut fields = BTreeMap::new();
    let email = require(&mut fields, "email", &payload.email).to_string();
    let password = require(&mut fields, "password", &payload.password).to_string();
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let user: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT id, first_name, last_name, email, password_hash, company, position, role, is_active
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::BadCredentials),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadCredentials);
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_login",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn details(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let profile = load_profile(pool, user.user_id).await?;
    Ok(ApiResponse::success("OK", profile, Some(Meta::empty())))
}

pub async fn update_details(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateDetailsRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let current: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT id, first_name, last_name, email, password_hash, company, position, role, is_active
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_optional(pool)
    .await?;
    let current = current.ok_or(AppError::NotFound)?;

    let mut fields = BTreeMap::new();

    let first_name = match payload.first_name.as_deref().map(str::trim) {
        Some("") => {
            fields.insert("first_name".to_string(), "must not be empty".to_string());
            current.first_name.clone()
        }
        Some(v) => v.to_string(),
        None => current.first_name.clone(),
    };
    let last_name = match payload.last_name.as_deref().map(str::trim) {
        Some("") => {
            fields.insert("last_name".to_string(), "must not be empty".to_string());
            current.last_name.clone()
        }
        Some(v) => v.to_string(),
        None => current.last_name.clone(),
    };
    let email = match payload.email.as_deref().map(str::trim) {
        Some(v) if v.is_empty() || !v.contains('@') => {
            fields.insert(
                "email".to_string(),
                "must be a valid email address".to_string(),
            );
            current.email.clone()
        }
        Some(v) => v.to_string(),
        None => current.email.clone(),
    };
    let password_hash = match payload.password.as_deref() {
        Some(v) if v.chars().count() < 8 => {
            fields.insert(
                "password".to_string(),
                "must be at least 8 characters".to_string(),
            );
            current.password_hash.clone()
        }
        Some(v) => hash_password(v)?,
        None => current.password_hash.clone(),
    };
    let company = payload
        .company
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| current.company.clone());
    let position = payload
        .position
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| current.position.clone());

    if email != current.email {
        let taken: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email.as_str())
                .bind(current.id)
                .fetch_optional(pool)
                .await?;
        if taken.is_some() {
            fields.insert("email".to_string(), "already registered".to_string());
        }
    }

    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = $1, last_name = $2, email = $3, password_hash = $4,
            company = $5, position = $6
        WHERE id = $7
        "#,
    )
    .bind(first_name.as_str())
    .bind(last_name.as_str())
    .bind(email.as_str())
    .bind(password_hash.as_str())
    .bind(company.as_str())
    .bind(position.as_str())
    .bind(current.id)
    .execute(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(current.id),
        "user_update",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let profile = load_profile(pool, current.id).await?;
    Ok(ApiResponse::success("Details updated", profile, None))
}

async fn load_profile(pool: &DbPool, user_id: i32) -> AppResult<UserProfile> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT id, first_name, last_name, email, password_hash, company, position, role, is_active
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let row = row.ok_or(AppError::NotFound)?;

    let contacts: Vec<Contact> = sqlx::query_as(
        r#"
        SELECT id, city, street, house, structure, building, apartment, phone
        FROM contacts
        WHERE user_id = $1
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let role = UserRole::parse(&row.role)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown role {}", row.role)))?;

    Ok(UserProfile {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        company: row.company,
        position: row.position,
        role,
        contacts,
    })
}
