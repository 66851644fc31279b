use serde::Deserialize;
use utoipa::ToSchema;

/// `id` names the caller's basket, `contact` one of their delivery contacts.
#[derive(Deserialize, Debug, ToSchema)]
pub struct PlaceOrderRequest {
    pub id: Option<i32>,
    pub contact: Option<i32>,
}
