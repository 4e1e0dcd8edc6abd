use crate::entities::{OrderStatus, TaskStatus, staff_task_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskStatusRequest {
    pub task_id: i64,
    pub status: TaskStatus,
    pub notes: Option<String>,
    /// Propagate the change to the parent order's status
    #[serde(default)]
    pub update_order_status: bool,
    /// When given, must be the task's order
    pub order_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub order_id: i64,
    pub staff_id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<staff_task_entity::Model> for TaskResponse {
    fn from(m: staff_task_entity::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            staff_id: m.staff_id,
            title: m.title,
            status: m.status,
            notes: m.notes,
            started_at: m.started_at,
            completed_at: m.completed_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskStatusResponse {
    pub task: TaskResponse,
    /// Order status after propagation; `None` when propagation was not requested
    pub order_status: Option<OrderStatus>,
    pub order_updated: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<TaskStatus>,
}
