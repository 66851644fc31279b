use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Shop,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Buyer => "buyer",
            UserRole::Shop => "shop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(UserRole::Buyer),
            "shop" => Some(UserRole::Shop),
            _ => None,
        }
    }
}

/// Order lifecycle. The basket is an order row in the `Basket` state; this
/// service only performs the `Basket -> New` transition, the rest of the
/// progression belongs to the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Basket,
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Basket => "basket",
            OrderState::New => "new",
            OrderState::Confirmed => "confirmed",
            OrderState::Assembled => "assembled",
            OrderState::Sent => "sent",
            OrderState::Delivered => "delivered",
            OrderState::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basket" => Some(OrderState::Basket),
            "new" => Some(OrderState::New),
            "confirmed" => Some(OrderState::Confirmed),
            "assembled" => Some(OrderState::Assembled),
            "sent" => Some(OrderState::Sent),
            "delivered" => Some(OrderState::Delivered),
            "canceled" => Some(OrderState::Canceled),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions, including cancellation.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Canceled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Contact {
    pub id: i32,
    pub city: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub position: String,
    pub role: UserRole,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Shop {
    pub id: i32,
    pub name: String,
    pub accepting_orders: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub name: String,
    pub category: Category,
}

/// The sellable unit: a product at a shop with price and stock, plus its
/// parameters. This is the snapshot embedded in catalog listings and order
/// items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductOffer {
    pub id: i32,
    pub external_id: i32,
    pub model: String,
    pub product: ProductRef,
    pub shop: Shop,
    pub quantity: i32,
    pub price: i64,
    pub price_rrc: i64,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: i32,
    pub quantity: i32,
    pub product_info: ProductOffer,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: i32,
    pub user_id: i32,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub contact: Option<Contact>,
    pub total_sum: i64,
    pub items: Vec<OrderLine>,
}
