use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a restaurant as exposed by the restaurant directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub minimum_order: Decimal,
    #[serde(default = "default_open")]
    pub is_open: bool,
    #[serde(default)]
    pub rating: f64,
}

fn default_open() -> bool {
    true
}
