use std::collections::BTreeMap;

use sqlx::FromRow;

use crate::{
    db::DbPool,
    error::AppResult,
    models::{Category, ProductOffer, ProductRef, Shop},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
};

#[derive(FromRow)]
struct OfferRow {
    id: i32,
    external_id: i32,
    model: String,
    quantity: i32,
    price: i64,
    price_rrc: i64,
    product_name: String,
    category_id: i32,
    category_name: String,
    shop_id: i32,
    shop_name: String,
    accepting_orders: bool,
}

#[derive(FromRow)]
struct ParameterRow {
    product_info_id: i32,
    name: String,
    value: String,
}

/// Resolves full offer snapshots (product, category, shop, parameters) for a
/// set of product_info ids in two queries.
pub(crate) async fn load_offers(
    pool: &DbPool,
    ids: &[i32],
) -> AppResult<BTreeMap<i32, ProductOffer>> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let rows = sqlx::query_as::<_, OfferRow>(
        r#"
        SELECT pi.id, pi.external_id, pi.model, pi.quantity, pi.price, pi.price_rrc,
               p.name AS product_name, c.id AS category_id, c.name AS category_name,
               s.id AS shop_id, s.name AS shop_name, s.accepting_orders
        FROM product_infos pi
        JOIN products p ON p.id = pi.product_id
        JOIN categories c ON c.id = p.category_id
        JOIN shops s ON s.id = pi.shop_id
        WHERE pi.id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let params = sqlx::query_as::<_, ParameterRow>(
        r#"
        SELECT pp.product_info_id, pr.name, pp.value
        FROM product_parameters pp
        JOIN parameters pr ON pr.id = pp.parameter_id
        WHERE pp.product_info_id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut by_info: BTreeMap<i32, BTreeMap<String, String>> = BTreeMap::new();
    for row in params {
        by_info
            .entry(row.product_info_id)
            .or_default()
            .insert(row.name, row.value);
    }

    let mut offers = BTreeMap::new();
    for row in rows {
        let parameters = by_info.remove(&row.id).unwrap_or_default();
        offers.insert(
            row.id,
            ProductOffer {
                id: row.id,
                external_id: row.external_id,
                model: row.model,
                product: ProductRef {
                    name: row.product_name,
                    category: Category {
                        id: row.category_id,
                        name: row.category_name,
                    },
                },
                shop: Shop {
                    id: row.shop_id,
                    name: row.shop_name,
                    accepting_orders: row.accepting_orders,
                },
                quantity: row.quantity,
                price: row.price,
                price_rrc: row.price_rrc,
                parameters,
            },
        );
    }

    Ok(offers)
}

/// Public catalog: offers of shops currently accepting orders.
pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<Vec<ProductOffer>>> {
    let (page, limit, offset) = query.pagination().normalize();

    let ids: Vec<(i32,)> = sqlx::query_as(
        r#"
        SELECT pi.id
        FROM product_infos pi
        JOIN shops s ON s.id = pi.shop_id
        JOIN products p ON p.id = pi.product_id
        WHERE s.accepting_orders = TRUE
          AND ($1::int4 IS NULL OR pi.shop_id = $1)
          AND ($2::int4 IS NULL OR p.category_id = $2)
        ORDER BY pi.id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.shop_id)
    .bind(query.category_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM product_infos pi
        JOIN shops s ON s.id = pi.shop_id
        JOIN products p ON p.id = pi.product_id
        WHERE s.accepting_orders = TRUE
          AND ($1::int4 IS NULL OR pi.shop_id = $1)
          AND ($2::int4 IS NULL OR p.category_id = $2)
        "#,
    )
    .bind(query.shop_id)
    .bind(query.category_id)
    .fetch_one(pool)
    .await?;

    let ids: Vec<i32> = ids.into_iter().map(|(id,)| id).collect();
    let mut offers = load_offers(pool, &ids).await?;
    let items: Vec<ProductOffer> = ids.iter().filter_map(|id| offers.remove(id)).collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", items, Some(meta)))
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories: Vec<Category> = sqlx::query_as("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success("OK", categories, Some(Meta::empty())))
}

/// Closed shops stay listed here; only their offers drop out of the product
/// browse.
pub async fn list_shops(pool: &DbPool) -> AppResult<ApiResponse<Vec<Shop>>> {
    let shops: Vec<Shop> =
        sqlx::query_as("SELECT id, name, accepting_orders FROM shops ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(ApiResponse::success("OK", shops, Some(Meta::empty())))
}
