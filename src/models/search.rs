use crate::models::{InventoryItemResponse, OrderResponse};
use crate::entities::customer_entity;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    All,
    Orders,
    Customers,
    Inventory,
}

impl SearchScope {
    pub fn includes(&self, other: SearchScope) -> bool {
        *self == SearchScope::All || *self == other
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GlobalSearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type", default)]
    pub scope: SearchScope,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerSearchResult {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<customer_entity::Model> for CustomerSearchResult {
    fn from(m: customer_entity::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SearchResults {
    pub orders: Vec<OrderResponse>,
    pub customers: Vec<CustomerSearchResult>,
    pub inventory: Vec<InventoryItemResponse>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct GlobalSearchResponse {
    pub results: SearchResults,
    pub total: usize,
}

impl GlobalSearchResponse {
    pub fn new(results: SearchResults) -> Self {
        let total = results.orders.len() + results.customers.len() + results.inventory.len();
        Self { results, total }
    }
}
