use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::partner::{PartnerStateRequest, PartnerUpdateRequest, ShopsUpdated, SyncSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{OrderDetail, Shop},
    response::ApiResponse,
    services::{order_service, partner_service, sync_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update", post(update_price_list))
        .route("/state", get(get_state).post(set_state))
        .route("/orders", get(partner_orders))
}

#[utoipa::path(
    post,
    path = "/partner/update",
    request_body = PartnerUpdateRequest,
    responses(
        (status = 200, description = "Catalog updated", body = ApiResponse<SyncSummary>),
        (status = 400, description = "Bad URL or malformed feed"),
        (status = 403, description = "Shop accounts only"),
        (status = 502, description = "Feed fetch failed")
    ),
    tag = "Partner"
)]
pub async fn update_price_list(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PartnerUpdateRequest>,
) -> AppResult<Json<ApiResponse<SyncSummary>>> {
    let resp = sync_service::sync_from_url(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/partner/state", tag = "Partner")]
pub async fn get_state(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = partner_service::get_state(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/partner/state",
    request_body = PartnerStateRequest,
    tag = "Partner"
)]
pub async fn set_state(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PartnerStateRequest>,
) -> AppResult<Json<ApiResponse<ShopsUpdated>>> {
    let resp = partner_service::set_state(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/partner/orders", tag = "Partner")]
pub async fn partner_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<OrderDetail>>>> {
    let resp = order_service::list_partner_orders(&state, &user).await?;
    Ok(Json(resp))
}
