use std::time::Duration;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use crate::{
    audit::log_audit,
    dto::partner::{PartnerUpdateRequest, SyncSummary},
    entity::{
        categories::{ActiveModel as CategoryActive, Entity as Categories},
        parameters::{
            ActiveModel as ParameterActive, Column as ParameterCol, Entity as Parameters,
        },
        product_infos::{
            ActiveModel as ProductInfoActive, Column as ProductInfoCol, Entity as ProductInfos,
        },
        product_parameters::ActiveModel as ProductParameterActive,
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        shop_categories::{ActiveModel as ShopCategoryActive, Entity as ShopCategories},
        shops::{ActiveModel as ShopActive, Column as ShopCol, Entity as Shops},
    },
    error::{AppError, AppResult},
    feed::{self, PriceFeed},
    middleware::auth::{AuthUser, ensure_shop},
    response::{ApiResponse, Meta},
    state::AppState,
};

const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

fn feed_timeout() -> Duration {
    let secs = std::env::var("FEED_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_FEED_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Fetches a supplier price list and replaces the shop's catalog with it.
/// The document is fully parsed and validated before the store is touched.
pub async fn sync_from_url(
    state: &AppState,
    user: &AuthUser,
    payload: PartnerUpdateRequest,
) -> AppResult<ApiResponse<SyncSummary>> {
    ensure_shop(user)?;

    let url = payload
        .url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::invalid_field("url", "This field is required"))?;

    let parsed = reqwest::Url::parse(url)
        .map_err(|_| AppError::invalid_field("url", "must be a valid URL"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::invalid_field("url", "must be an http(s) URL"));
    }

    let client = reqwest::Client::builder()
        .timeout(feed_timeout())
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| AppError::UpstreamFetch(e.to_string()))?
        .error_for_status()
        .map_err(|e| AppError::UpstreamFetch(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| AppError::UpstreamFetch(e.to_string()))?;

    let feed = feed::parse(&body)?;
    feed.validate()?;

    let summary = apply_feed(state, user.user_id, &feed).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "catalog_sync",
        Some("product_infos"),
        Some(serde_json::json!({
            "shop_id": summary.shop_id,
            "categories": summary.categories,
            "goods": summary.goods,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Catalog updated",
        summary,
        Some(Meta::empty()),
    ))
}

/// Replaces the shop's published offers with the feed contents in one
/// transaction. The shop row is locked so same-shop syncs serialize; shared
/// reference data (categories, products, parameters) only ever grows.
pub async fn apply_feed(state: &AppState, owner_id: i32, feed: &PriceFeed) -> AppResult<SyncSummary> {
    let txn = state.orm.begin().await?;

    let shop = Shops::find()
        .filter(
            Condition::all()
                .add(ShopCol::Name.eq(feed.shop_name.as_str()))
                .add(ShopCol::UserId.eq(owner_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let shop = match shop {
        Some(s) => s,
        None => {
            ShopActive {
                id: NotSet,
                name: Set(feed.shop_name.clone()),
                user_id: Set(Some(owner_id)),
                accepting_orders: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    for category in &feed.categories {
        let known = Categories::find_by_id(category.id).one(&txn).await?;
        if known.is_none() {
            CategoryActive {
                id: Set(category.id),
                name: Set(category.name.clone()),
            }
            .insert(&txn)
            .await?;
        }

        let linked = ShopCategories::find_by_id((category.id, shop.id))
            .one(&txn)
            .await?;
        if linked.is_none() {
            ShopCategoryActive {
                category_id: Set(category.id),
                shop_id: Set(shop.id),
            }
            .insert(&txn)
            .await?;
        }
    }

    // Full replace: dependent product_parameters and order_items rows go with
    // the offers via FK cascade.
    ProductInfos::delete_many()
        .filter(ProductInfoCol::ShopId.eq(shop.id))
        .exec(&txn)
        .await?;

    for good in &feed.goods {
        let product = Products::find()
            .filter(
                Condition::all()
                    .add(ProductCol::Name.eq(good.name.as_str()))
                    .add(ProductCol::CategoryId.eq(good.category)),
            )
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                ProductActive {
                    id: NotSet,
                    name: Set(good.name.clone()),
                    category_id: Set(good.category),
                }
                .insert(&txn)
                .await?
            }
        };

        let info = ProductInfoActive {
            id: NotSet,
            product_id: Set(product.id),
            shop_id: Set(shop.id),
            external_id: Set(good.id),
            model: Set(good.model.clone()),
            quantity: Set(good.quantity),
            price: Set(good.price),
            price_rrc: Set(good.price_rrc),
        }
        .insert(&txn)
        .await?;

        for (name, value) in &good.parameters {
            let parameter = Parameters::find()
                .filter(ParameterCol::Name.eq(name.as_str()))
                .one(&txn)
                .await?;
            let parameter = match parameter {
                Some(p) => p,
                None => {
                    ParameterActive {
                        id: NotSet,
                        name: Set(name.clone()),
                    }
                    .insert(&txn)
                    .await?
                }
            };

            ProductParameterActive {
                id: NotSet,
                product_info_id: Set(info.id),
                parameter_id: Set(parameter.id),
                value: Set(value.clone().into_string()),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    Ok(SyncSummary {
        shop_id: shop.id,
        categories: feed.categories.len(),
        goods: feed.goods.len(),
    })
}
