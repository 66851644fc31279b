use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Supplier price list as shipped over YAML. Parsed and validated in full
/// before any database write, so a broken document never clips a catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeed {
    pub shop_name: String,
    pub categories: Vec<FeedCategory>,
    pub goods: Vec<FeedGood>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedCategory {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedGood {
    pub id: i32,
    pub category: i32,
    #[serde(default)]
    pub model: String,
    pub name: String,
    pub price: i64,
    pub price_rrc: i64,
    pub quantity: i32,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

/// Parameter values arrive as whatever scalar the supplier typed; everything
/// is stored as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl ParameterValue {
    pub fn into_string(self) -> String {
        match self {
            ParameterValue::Text(s) => s,
            ParameterValue::Integer(i) => i.to_string(),
            ParameterValue::Float(f) => f.to_string(),
            ParameterValue::Flag(b) => b.to_string(),
        }
    }
}

pub fn parse(document: &str) -> AppResult<PriceFeed> {
    serde_yaml::from_str(document)
        .map_err(|err| AppError::invalid_field("feed", format!("malformed document: {err}")))
}

impl PriceFeed {
    /// Checks the whole document and reports every problem at once, keyed by
    /// the offending field.
    pub fn validate(&self) -> AppResult<()> {
        let mut fields = BTreeMap::new();

        if self.shop_name.trim().is_empty() {
            fields.insert("shop_name".to_string(), "must not be empty".to_string());
        }

        let mut seen = BTreeSet::new();
        for (idx, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                fields.insert(
                    format!("categories[{idx}].name"),
                    "must not be empty".to_string(),
                );
            }
            if !seen.insert(category.id) {
                fields.insert(
                    format!("categories[{idx}].id"),
                    format!("duplicate category id {}", category.id),
                );
            }
        }

        for (idx, good) in self.goods.iter().enumerate() {
            if good.name.trim().is_empty() {
                fields.insert(
                    format!("goods[{idx}].name"),
                    "must not be empty".to_string(),
                );
            }
            if good.price < 0 {
                fields.insert(
                    format!("goods[{idx}].price"),
                    "must not be negative".to_string(),
                );
            }
            if good.price_rrc < 0 {
                fields.insert(
                    format!("goods[{idx}].price_rrc"),
                    "must not be negative".to_string(),
                );
            }
            if good.quantity < 0 {
                fields.insert(
                    format!("goods[{idx}].quantity"),
                    "must not be negative".to_string(),
                );
            }
            if !seen.contains(&good.category) {
                fields.insert(
                    format!("goods[{idx}].category"),
                    format!("references undeclared category {}", good.category),
                );
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_fields(fields))
        }
    }
}
