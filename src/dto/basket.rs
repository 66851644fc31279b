use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddItemsRequest {
    pub items: Vec<NewBasketItem>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct NewBasketItem {
    pub product_info: Option<i32>,
    pub quantity: Option<i32>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateItemsRequest {
    pub items: Vec<BasketItemPatch>,
}

/// `id` is the order-item id shown in the basket view, not a product id.
#[derive(Deserialize, Debug, ToSchema)]
pub struct BasketItemPatch {
    pub id: Option<i32>,
    pub quantity: Option<i32>,
}

/// `items` is a comma-separated order-item id list, e.g. `"1,2,3"`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct RemoveItemsRequest {
    pub items: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsCreated {
    pub created: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsUpdated {
    pub updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsDeleted {
    pub deleted: u64,
}
