use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        auth::{
            ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateDetailsRequest,
        },
        contacts::{
            ContactsDeleted, CreateContactRequest, DeleteContactsRequest, UpdateContactRequest,
        },
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Contact, UserProfile},
    response::ApiResponse,
    services::{auth_service, contact_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register/confirm", post(confirm))
        .route("/login", post(login))
        .route("/details", get(details).post(update_details))
        .route(
            "/contact",
            get(list_contacts)
                .post(create_contact)
                .put(update_contact)
                .delete(delete_contacts),
        )
}

#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created", body = ApiResponse<UserProfile>),
        (status = 400, description = "Validation failed")
    ),
    tag = "User"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::register(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/user/register/confirm",
    request_body = ConfirmRequest,
    tag = "User"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = auth_service::confirm(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/user/details", tag = "User")]
pub async fn details(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::details(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/user/details",
    request_body = UpdateDetailsRequest,
    tag = "User"
)]
pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateDetailsRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_details(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/user/contact", tag = "User")]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Contact>>>> {
    let resp = contact_service::list(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/user/contact",
    request_body = CreateContactRequest,
    tag = "User"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::create(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/user/contact",
    request_body = UpdateContactRequest,
    tag = "User"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::update(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/user/contact",
    request_body = DeleteContactsRequest,
    tag = "User"
)]
pub async fn delete_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteContactsRequest>,
) -> AppResult<Json<ApiResponse<ContactsDeleted>>> {
    let resp = contact_service::delete(&state, &user, payload).await?;
    Ok(Json(resp))
}
