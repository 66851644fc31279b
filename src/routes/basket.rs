use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::basket::{
        AddItemsRequest, ItemsCreated, ItemsDeleted, ItemsUpdated, RemoveItemsRequest,
        UpdateItemsRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::OrderDetail,
    response::ApiResponse,
    services::basket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(view_basket)
            .post(add_items)
            .put(update_items)
            .delete(remove_items),
    )
}

#[utoipa::path(get, path = "/basket", tag = "Basket")]
pub async fn view_basket(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = basket_service::view(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/basket",
    request_body = AddItemsRequest,
    responses(
        (status = 200, description = "Items added", body = ApiResponse<ItemsCreated>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Unknown offer"),
        (status = 409, description = "Already in basket")
    ),
    tag = "Basket"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsCreated>>> {
    let resp = basket_service::add_items(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/basket",
    request_body = UpdateItemsRequest,
    tag = "Basket"
)]
pub async fn update_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsUpdated>>> {
    let resp = basket_service::update_items(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/basket",
    request_body = RemoveItemsRequest,
    tag = "Basket"
)]
pub async fn remove_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RemoveItemsRequest>,
) -> AppResult<Json<ApiResponse<ItemsDeleted>>> {
    let resp = basket_service::remove_items(&state, &user, payload).await?;
    Ok(Json(resp))
}
