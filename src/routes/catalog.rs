use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    error::AppResult,
    models::{Category, ProductOffer, Shop},
    response::ApiResponse,
    routes::params::ProductQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/categories", get(list_categories))
        .route("/shops", get(list_shops))
}

#[utoipa::path(
    get,
    path = "/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Page size"),
        ("shop_id" = Option<i32>, Query, description = "Restrict to one shop"),
        ("category_id" = Option<i32>, Query, description = "Restrict to one category")
    ),
    responses(
        (status = 200, description = "Offers of shops accepting orders", body = ApiResponse<Vec<ProductOffer>>)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductOffer>>>> {
    let resp = catalog_service::list_products(&state.pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/categories", tag = "Catalog")]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let resp = catalog_service::list_categories(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/shops", tag = "Catalog")]
pub async fn list_shops(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Shop>>>> {
    let resp = catalog_service::list_shops(&state.pool).await?;
    Ok(Json(resp))
}
