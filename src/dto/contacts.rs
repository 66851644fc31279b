use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateContactRequest {
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub structure: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateContactRequest {
    pub id: Option<i32>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub structure: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
}

/// `items` is a comma-separated id list, e.g. `"3,17"`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct DeleteContactsRequest {
    pub items: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactsDeleted {
    pub deleted: u64,
}
