use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};

use crate::{
    dto::orders::PlaceOrderRequest,
    entity::{
        contacts::{Column as ContactCol, Entity as Contacts},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_infos::{Column as ProductInfoCol, Entity as ProductInfos},
        shops::{Column as ShopCol, Entity as Shops},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_shop},
    models::{Contact, OrderDetail, OrderLine, OrderState},
    notify::{self, Notification},
    response::{ApiResponse, Meta},
    services::catalog_service,
    state::AppState,
};

/// Turns the caller's basket into a placed order: state flips to `new` and
/// the delivery contact is attached, all under a row lock so a concurrent
/// placement of the same basket cannot slip through.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let mut fields = BTreeMap::new();
    let order_id = match payload.id {
        Some(v) => v,
        None => {
            fields.insert("id".to_string(), "This field is required".to_string());
            0
        }
    };
    let contact_id = match payload.contact {
        Some(v) => v,
        None => {
            fields.insert("contact".to_string(), "This field is required".to_string());
            0
        }
    };
    if !fields.is_empty() {
        return Err(AppError::invalid_fields(fields));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = order.ok_or(AppError::NotFound)?;

    if order.state != OrderState::Basket.as_str() {
        return Err(AppError::Conflict("Order already placed".to_string()));
    }

    // The closed-shop gate applies at placement, not at basket-add time.
    let item_offer_ids: Vec<i32> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| item.product_info_id)
        .collect();
    let closed = ProductInfos::find()
        .filter(ProductInfoCol::Id.is_in(item_offer_ids))
        .inner_join(Shops)
        .filter(ShopCol::AcceptingOrders.eq(false))
        .one(&txn)
        .await?;
    if closed.is_some() {
        return Err(AppError::Conflict("Shop is not accepting orders".to_string()));
    }

    let contact = Contacts::find()
        .filter(
            Condition::all()
                .add(ContactCol::Id.eq(contact_id))
                .add(ContactCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;
    let contact = contact.ok_or(AppError::NotFound)?;

    let mut active: OrderActive = order.into();
    active.state = Set(OrderState::New.as_str().to_string());
    active.contact_id = Set(Some(contact.id));
    let order = active.update(&txn).await?;

    txn.commit().await?;

    notify::dispatch(
        &state.pool,
        Notification::OrderPlaced {
            user_id: user.user_id,
            order_id: order.id,
        },
    )
    .await;

    let detail = assemble_orders(state, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished during read")))?;

    Ok(ApiResponse::success(
        "Order placed",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<OrderDetail>>> {
    let orders = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.ne(OrderState::Basket.as_str())),
        )
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;

    let details = assemble_orders(state, orders).await?;
    Ok(ApiResponse::success("OK", details, Some(Meta::empty())))
}

/// Orders that contain at least one offer from a shop owned by the caller.
pub async fn list_partner_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<OrderDetail>>> {
    ensure_shop(user)?;

    let ids: Vec<(i32,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT o.id
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        JOIN product_infos pi ON pi.id = oi.product_info_id
        JOIN shops s ON s.id = pi.shop_id
        WHERE s.user_id = $1 AND o.state <> $2
        "#,
    )
    .bind(user.user_id)
    .bind(OrderState::Basket.as_str())
    .fetch_all(&state.pool)
    .await?;
    let ids: Vec<i32> = ids.into_iter().map(|(id,)| id).collect();

    let orders = Orders::find()
        .filter(OrderCol::Id.is_in(ids))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;

    let details = assemble_orders(state, orders).await?;
    Ok(ApiResponse::success("OK", details, Some(Meta::empty())))
}

/// Decorates order rows with items, offer snapshots, contact and `total_sum`
/// in a fixed number of queries regardless of order count.
pub(crate) async fn assemble_orders(
    state: &AppState,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Id)
        .all(&state.orm)
        .await?;

    let mut offer_ids: Vec<i32> = items.iter().map(|i| i.product_info_id).collect();
    offer_ids.sort_unstable();
    offer_ids.dedup();
    let offers = catalog_service::load_offers(&state.pool, &offer_ids).await?;

    let mut contact_ids: Vec<i32> = orders.iter().filter_map(|o| o.contact_id).collect();
    contact_ids.sort_unstable();
    contact_ids.dedup();
    let contacts: Vec<Contact> = if contact_ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as(
            r#"
            SELECT id, city, street, house, structure, building, apartment, phone
            FROM contacts
            WHERE id = ANY($1)
            "#,
        )
        .bind(&contact_ids)
        .fetch_all(&state.pool)
        .await?
    };
    let contact_by_id: BTreeMap<i32, Contact> =
        contacts.into_iter().map(|c| (c.id, c)).collect();

    let mut lines_by_order: BTreeMap<i32, Vec<OrderLine>> = BTreeMap::new();
    for item in items {
        // A concurrent sync can cascade the item away between the two reads.
        let Some(offer) = offers.get(&item.product_info_id) else {
            continue;
        };
        lines_by_order.entry(item.order_id).or_default().push(OrderLine {
            id: item.id,
            quantity: item.quantity,
            product_info: offer.clone(),
        });
    }

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        let order_state = OrderState::parse(&order.state).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown order state {}", order.state))
        })?;
        let lines = lines_by_order.remove(&order.id).unwrap_or_default();
        let total_sum = lines
            .iter()
            .map(|line| i64::from(line.quantity) * line.product_info.price)
            .sum();

        details.push(OrderDetail {
            id: order.id,
            user_id: order.user_id,
            state: order_state,
            created_at: order.created_at.with_timezone(&Utc),
            contact: order
                .contact_id
                .and_then(|id| contact_by_id.get(&id).cloned()),
            total_sum,
            items: lines,
        });
    }

    Ok(details)
}
