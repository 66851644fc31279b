use std::collections::BTreeMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    dto::basket::{
        AddItemsRequest, ItemsCreated, ItemsDeleted, ItemsUpdated, RemoveItemsRequest,
        UpdateItemsRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_infos::Entity as ProductInfos,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderDetail, OrderState},
    response::{ApiResponse, Meta},
    routes::params::parse_id_list,
    services::order_service,
    state::AppState,
};

/// The caller's basket row, created on first use. Fetched `FOR UPDATE` so
/// concurrent mutations of one basket serialize.
pub async fn get_or_create_basket(
    txn: &DatabaseTransaction,
    user_id: i32,
) -> AppResult<OrderModel> {
    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?;

    match basket {
        Some(b) => Ok(b),
        None => Ok(OrderActive {
            id: NotSet,
            user_id: Set(user_id),
            state: Set(OrderState::Basket.as_str().to_string()),
            contact_id: Set(None),
            created_at: NotSet,
        }
        .insert(txn)
        .await?),
    }
}

pub async fn view(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderDetail>> {
    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .one(&state.orm)
        .await?;
    // Absence is not an error: nothing has been added yet.
    let Some(basket) = basket else {
        return Ok(ApiResponse::empty("Basket is empty"));
    };

    let detail = order_service::assemble_orders(state, vec![basket])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("basket vanished during read")))?;

    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Adds offers to the basket in one transaction; the first failure rolls the
/// whole batch back.
pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    payload: AddItemsRequest,
) -> AppResult<ApiResponse<ItemsCreated>> {
    if payload.items.is_empty() {
        return Err(AppError::invalid_field("items", "must not be empty"));
    }

    let mut fields = BTreeMap::new();
    let mut items = Vec::with_capacity(payload.items.len());
    for (idx, item) in payload.items.iter().enumerate() {
        let product_info = match item.product_info {
            Some(v) => v,
            None => {
                fields.insert(
                    format!("items[{idx}].product_info"),
                    "This field is required".to_string(),
                );
                0
            }
        };
        let quantity = match item.quantity {
            Some(v) if v > 0 => v,
            Some(_) => {
                fields.insert(
                    format!("items[{idx}].quantity"),
                    "must be greater than zero".to_string(),
                );
                0
            }
            None => {
                fields.insert(
                    format!("items[{idx}].quantity"),
                    "This field is required".to_string(),
                );
                0
            }
        };
        items.push((product_info, quantity));
    }
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let txn = state.orm.begin().await?;
    let basket = get_or_create_basket(&txn, user.user_id).await?;

    let mut created = 0u64;
    for (product_info_id, quantity) in items {
        let offer = ProductInfos::find_by_id(product_info_id).one(&txn).await?;
        if offer.is_none() {
            return Err(AppError::NotFound);
        }

        OrderItemActive {
            id: NotSet,
            order_id: Set(basket.id),
            product_info_id: Set(product_info_id),
            quantity: Set(quantity),
        }
        .insert(&txn)
        .await?;
        created += 1;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "basket_add",
        Some("order_items"),
        Some(serde_json::json!({ "created": created })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Items added",
        ItemsCreated { created },
        Some(Meta::empty()),
    ))
}

/// Updates quantities in one transaction. Ids outside the caller's basket
/// match nothing and are silently skipped.
pub async fn update_items(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateItemsRequest,
) -> AppResult<ApiResponse<ItemsUpdated>> {
    if payload.items.is_empty() {
        return Err(AppError::invalid_field("items", "must not be empty"));
    }

    let mut fields = BTreeMap::new();
    let mut items = Vec::with_capacity(payload.items.len());
    for (idx, item) in payload.items.iter().enumerate() {
        let id = match item.id {
            Some(v) => v,
            None => {
                fields.insert(
                    format!("items[{idx}].id"),
                    "This field is required".to_string(),
                );
                0
            }
        };
        let quantity = match item.quantity {
            Some(v) if v > 0 => v,
            Some(_) => {
                fields.insert(
                    format!("items[{idx}].quantity"),
                    "must be greater than zero".to_string(),
                );
                0
            }
            None => {
                fields.insert(
                    format!("items[{idx}].quantity"),
                    "This field is required".to_string(),
                );
                0
            }
        };
        items.push((id, quantity));
    }
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let txn = state.orm.begin().await?;
    let basket = get_or_create_basket(&txn, user.user_id).await?;

    let mut updated = 0u64;
    for (id, quantity) in items {
        let result = OrderItems::update_many()
            .col_expr(OrderItemCol::Quantity, Expr::value(quantity))
            .filter(
                Condition::all()
                    .add(OrderItemCol::OrderId.eq(basket.id))
                    .add(OrderItemCol::Id.eq(id)),
            )
            .exec(&txn)
            .await?;
        updated += result.rows_affected;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "basket_update",
        Some("order_items"),
        Some(serde_json::json!({ "updated": updated })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Items updated",
        ItemsUpdated { updated },
        Some(Meta::empty()),
    ))
}

pub async fn remove_items(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveItemsRequest,
) -> AppResult<ApiResponse<ItemsDeleted>> {
    let items = payload
        .items
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::invalid_field("items", "This field is required"))?;

    let ids = parse_id_list(items);
    if ids.is_empty() {
        return Err(AppError::invalid_field(
            "items",
            "must contain at least one numeric id",
        ));
    }

    let txn = state.orm.begin().await?;
    let basket = get_or_create_basket(&txn, user.user_id).await?;

    let result = OrderItems::delete_many()
        .filter(
            Condition::all()
                .add(OrderItemCol::OrderId.eq(basket.id))
                .add(OrderItemCol::Id.is_in(ids)),
        )
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "basket_remove",
        Some("order_items"),
        Some(serde_json::json!({ "deleted": result.rows_affected })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Items removed",
        ItemsDeleted {
            deleted: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}
