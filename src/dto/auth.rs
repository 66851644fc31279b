use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UserRole;

/// Fields are optional at the serde level so missing ones surface as
/// field-keyed validation messages instead of a body-level reject.
#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ConfirmRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateDetailsRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
