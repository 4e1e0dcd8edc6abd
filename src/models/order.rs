use crate::domain::TaskProgress;
use crate::entities::{OrderStatus, customer_entity, order_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub description: Option<String>,
    pub status: OrderStatus,
    /// cents
    pub total_amount: i64,
    pub remaining_amount: i64,
    pub is_fully_paid: bool,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderResponse {
    pub fn new(order: order_entity::Model, customer: Option<&customer_entity::Model>) -> Self {
        Self {
            is_fully_paid: order.is_fully_paid(),
            id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            customer_name: customer.map(|c| c.full_name.clone()),
            description: order.description,
            status: order.status,
            total_amount: order.total_amount,
            remaining_amount: order.remaining_amount,
            due_date: order.due_date,
            completed_at: order.completed_at,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskProgressResponse {
    pub total: u64,
    pub completed: u64,
}

impl From<TaskProgress> for TaskProgressResponse {
    fn from(p: TaskProgress) -> Self {
        Self {
            total: p.total,
            completed: p.completed,
        }
    }
}

/// Order status view, including the sum of recorded payments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub total_paid: i64,
    pub tasks: TaskProgressResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<OrderStatus>,
}
