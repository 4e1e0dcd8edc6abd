use crate::entities::{InventoryStatus, inventory_entity};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventorySearchQuery {
    /// Matches name, SKU or description
    pub search: Option<String>,
    /// Item type filter; `all` or empty disables it
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemResponse {
    pub id: i64,
    pub name: String,
    pub item_type: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub status: InventoryStatus,
}

impl From<inventory_entity::Model> for InventoryItemResponse {
    fn from(m: inventory_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            item_type: m.item_type,
            sku: m.sku,
            description: m.description,
            quantity: m.quantity,
            price: m.price,
            status: m.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventorySearchResponse {
    pub items: Vec<InventoryItemResponse>,
    pub count: usize,
}
