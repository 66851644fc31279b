use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct PartnerUpdateRequest {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PartnerStateRequest {
    pub state: Option<StateFlag>,
}

/// Clients send the flag as a JSON bool or as a loose string
/// (`on`, `off`, `yes`, `1`, ...).
#[derive(Deserialize, Debug, Clone, ToSchema)]
#[serde(untagged)]
pub enum StateFlag {
    Bool(bool),
    Text(String),
}

impl StateFlag {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateFlag::Bool(b) => Some(*b),
            StateFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
                "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopsUpdated {
    pub updated: u64,
}

/// What a finished sync touched.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncSummary {
    pub shop_id: i32,
    pub categories: usize,
    pub goods: usize,
}
