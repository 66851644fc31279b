use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    audit::log_audit,
    dto::partner::{PartnerStateRequest, ShopsUpdated},
    entity::shops::{Column as ShopCol, Entity as Shops},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_shop},
    models::Shop,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The caller's shop as created by their first sync; none yet is NotFound.
pub async fn get_state(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Shop>> {
    ensure_shop(user)?;

    let shop = Shops::find()
        .filter(ShopCol::UserId.eq(user.user_id))
        .order_by_asc(ShopCol::Id)
        .one(&state.orm)
        .await?;
    let shop = shop.ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        Shop {
            id: shop.id,
            name: shop.name,
            accepting_orders: shop.accepting_orders,
        },
        Some(Meta::empty()),
    ))
}

/// Flips order intake for every shop the caller owns.
pub async fn set_state(
    state: &AppState,
    user: &AuthUser,
    payload: PartnerStateRequest,
) -> AppResult<ApiResponse<ShopsUpdated>> {
    ensure_shop(user)?;

    let flag = payload
        .state
        .ok_or_else(|| AppError::invalid_field("state", "This field is required"))?;
    let value = flag
        .as_bool()
        .ok_or_else(|| AppError::invalid_field("state", "must be a boolean flag"))?;

    let result = Shops::update_many()
        .col_expr(ShopCol::AcceptingOrders, Expr::value(value))
        .filter(ShopCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "partner_state",
        Some("shops"),
        Some(serde_json::json!({
            "accepting_orders": value,
            "updated": result.rows_affected,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "State updated",
        ShopsUpdated {
            updated: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}
