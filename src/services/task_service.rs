use crate::database::DbPool;
use crate::domain::{
    Action, AuthUser, TaskTimestamps, authorize, next_task_timestamps, reconcile_order_status,
};
use crate::entities::{
    NotificationType, OrderStatus, TaskStatus, order_entity as orders,
    staff_task_entity as staff_tasks,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, TaskQuery, TaskResponse, UpdateTaskStatusRequest,
    UpdateTaskStatusResponse,
};
use crate::services::notification_service::{NewNotification, NotificationService};
use crate::services::order_service::{find_customer, task_progress};
use crate::utils::non_empty;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct TaskService {
    pool: DbPool,
}

impl TaskService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Moves a task to a new status and, when asked, reconciles its order.
    ///
    /// Task and order rows are both locked and updated in one transaction;
    /// an error anywhere leaves both untouched.
    pub async fn update_task_status(
        &self,
        user: &AuthUser,
        request: UpdateTaskStatusRequest,
    ) -> AppResult<UpdateTaskStatusResponse> {
        let txn = self.pool.begin().await?;

        let task = staff_tasks::Entity::find_by_id(request.task_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        authorize(user, Action::UpdateTask, Some(task.staff_id))?;

        if let Some(order_id) = request.order_id
            && order_id != task.order_id
        {
            return Err(AppError::ValidationError(
                "Task does not belong to the given order".to_string(),
            ));
        }

        let now = Utc::now();
        let previous_status = task.status;
        let stamps = next_task_timestamps(
            TaskTimestamps {
                started_at: task.started_at,
                completed_at: task.completed_at,
            },
            request.status,
            now,
        );

        let order_id = task.order_id;
        let mut active = task.into_active_model();
        active.status = Set(request.status);
        active.started_at = Set(stamps.started_at);
        active.completed_at = Set(stamps.completed_at);
        active.updated_at = Set(Some(now));
        if let Some(notes) = non_empty(request.notes) {
            active.notes = Set(Some(notes));
        }
        let task = active.update(&txn).await?;

        let (order_status, order_updated) = if request.update_order_status {
            let (status, updated) = propagate_to_order(&txn, order_id, request.status).await?;
            (Some(status), updated)
        } else {
            (None, false)
        };

        txn.commit().await?;

        log::info!(
            "Task {} moved {} -> {} by user {} (order {}, order updated: {})",
            task.id,
            previous_status,
            task.status,
            user.user_id,
            task.order_id,
            order_updated
        );

        Ok(UpdateTaskStatusResponse {
            task: task.into(),
            order_status,
            order_updated,
        })
    }

    /// Tasks assigned to the caller, most recently touched first
    pub async fn list_my_tasks(
        &self,
        user: &AuthUser,
        query: &TaskQuery,
    ) -> AppResult<PaginatedResponse<TaskResponse>> {
        authorize(user, Action::ListTasks, None)?;
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select =
            staff_tasks::Entity::find().filter(staff_tasks::Column::StaffId.eq(user.user_id));
        if let Some(status) = query.status {
            select = select.filter(staff_tasks::Column::Status.eq(status));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(staff_tasks::Column::UpdatedAt)
            .order_by_desc(staff_tasks::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(TaskResponse::from).collect(),
            &params,
            total,
        ))
    }
}

/// Applies the reconciliation rule to the locked order row. Returns the
/// order's status afterwards and whether it changed.
async fn propagate_to_order(
    txn: &DatabaseTransaction,
    order_id: i64,
    task_status: TaskStatus,
) -> AppResult<(OrderStatus, bool)> {
    let order = orders::Entity::find_by_id(order_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // counted after the task update, so the task itself is included
    let progress = if task_status == TaskStatus::Completed {
        Some(task_progress(txn, order_id).await?)
    } else {
        None
    };

    let Some(next) = reconcile_order_status(order.status, task_status, progress) else {
        return Ok((order.status, false));
    };

    let now = Utc::now();
    let customer_id = order.customer_id;
    let order_number = order.order_number.clone();
    let mut active = order.into_active_model();
    active.status = Set(next);
    active.updated_at = Set(Some(now));
    if next == OrderStatus::Completed {
        active.completed_at = Set(Some(now));
    }
    active.update(txn).await?;

    if next == OrderStatus::Completed {
        let customer = find_customer(txn, customer_id).await?;
        NotificationService::create(
            txn,
            NewNotification {
                user_id: customer.user_id,
                notification_type: NotificationType::Order,
                title: "Order completed".to_string(),
                message: format!("Your order {order_number} is ready."),
                related_id: Some(order_id),
            },
        )
        .await?;
    }

    Ok((next, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{UserRole, customer_entity as customers, notification_entity};
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn transaction_log(service: TaskService) -> Vec<Transaction> {
        Arc::into_inner(service.pool)
            .unwrap()
            .into_transaction_log()
    }

    fn task(status: TaskStatus, staff_id: i64) -> staff_tasks::Model {
        staff_tasks::Model {
            id: 1,
            order_id: 10,
            staff_id,
            title: "Hem trousers".to_string(),
            status,
            notes: Some("old note".to_string()),
            started_at: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn order(status: OrderStatus) -> orders::Model {
        orders::Model {
            id: 10,
            order_number: "ORD-0010".to_string(),
            customer_id: 3,
            description: None,
            status,
            total_amount: 20_000,
            remaining_amount: 0,
            due_date: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn count(n: i64) -> Vec<BTreeMap<String, Value>> {
        vec![BTreeMap::from([("num_items".to_string(), Value::BigInt(Some(n)))])]
    }

    fn request(status: TaskStatus, propagate: bool) -> UpdateTaskStatusRequest {
        UpdateTaskStatusRequest {
            task_id: 1,
            status,
            notes: Some("  ".to_string()),
            update_order_status: propagate,
            order_id: None,
        }
    }

    #[tokio::test]
    async fn test_unassigned_staff_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::Pending, 8)]])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let err = service
            .update_task_status(
                &AuthUser::new(2, UserRole::Staff),
                request(TaskStatus::InProgress, true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_mismatched_order_id_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::Pending, 2)]])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let mut req = request(TaskStatus::InProgress, false);
        req.order_id = Some(99);
        let err = service
            .update_task_status(&AuthUser::new(2, UserRole::Staff), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_unassigned_staff_learns_nothing_about_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::Pending, 8)]])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let mut req = request(TaskStatus::InProgress, false);
        req.order_id = Some(99);
        let err = service
            .update_task_status(&AuthUser::new(2, UserRole::Staff), req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_failed_propagation_never_commits_task_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::Pending, 2)]])
            .append_query_results([vec![task(TaskStatus::InProgress, 2)]])
            .append_query_results([Vec::<orders::Model>::new()])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let err = service
            .update_task_status(
                &AuthUser::new(2, UserRole::Staff),
                request(TaskStatus::InProgress, true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let log = transaction_log(service);
        assert!(!log.is_empty());
        for txn in &log {
            assert!(
                txn.statements().iter().all(|stmt| stmt.sql != "COMMIT"),
                "unexpected commit in {txn:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_update_without_propagation_leaves_order_alone() {
        let mut updated = task(TaskStatus::InProgress, 2);
        updated.started_at = Some(Utc::now());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::Pending, 2)]])
            .append_query_results([vec![updated]])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let response = service
            .update_task_status(
                &AuthUser::new(2, UserRole::Staff),
                request(TaskStatus::InProgress, false),
            )
            .await
            .unwrap();
        assert_eq!(response.task.status, TaskStatus::InProgress);
        assert!(response.task.started_at.is_some());
        assert_eq!(response.order_status, None);
        assert!(!response.order_updated);
    }

    #[tokio::test]
    async fn test_completing_last_task_completes_order() {
        let mut completed_order = order(OrderStatus::Completed);
        completed_order.completed_at = Some(Utc::now());
        let customer = customers::Model {
            id: 3,
            user_id: 30,
            full_name: "Grace Hopper".to_string(),
            email: None,
            phone: None,
            address: None,
            created_at: None,
            updated_at: None,
        };
        let notification = notification_entity::Model {
            id: 4,
            user_id: 30,
            title: "Order completed".to_string(),
            message: "Your order ORD-0010 is ready.".to_string(),
            notification_type: NotificationType::Order,
            related_id: Some(10),
            is_read: false,
            created_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::InProgress, 2)]])
            .append_query_results([vec![task(TaskStatus::Completed, 2)]])
            .append_query_results([vec![order(OrderStatus::InProgress)]])
            .append_query_results([count(3)])
            .append_query_results([count(3)])
            .append_query_results([vec![completed_order]])
            .append_query_results([vec![customer]])
            .append_query_results([vec![notification]])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let response = service
            .update_task_status(
                &AuthUser::new(2, UserRole::Staff),
                request(TaskStatus::Completed, true),
            )
            .await
            .unwrap();
        assert_eq!(response.order_status, Some(OrderStatus::Completed));
        assert!(response.order_updated);
    }

    #[tokio::test]
    async fn test_completing_one_of_many_tasks_keeps_order_in_progress() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(TaskStatus::InProgress, 2)]])
            .append_query_results([vec![task(TaskStatus::Completed, 2)]])
            .append_query_results([vec![order(OrderStatus::InProgress)]])
            .append_query_results([count(3)])
            .append_query_results([count(2)])
            .into_connection();
        let service = TaskService::new(Arc::new(db));

        let response = service
            .update_task_status(
                &AuthUser::new(2, UserRole::Staff),
                request(TaskStatus::Completed, true),
            )
            .await
            .unwrap();
        assert_eq!(response.order_status, Some(OrderStatus::InProgress));
        assert!(!response.order_updated);
    }

    #[tokio::test]
    async fn test_customer_cannot_list_tasks() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = TaskService::new(Arc::new(db));

        let query = TaskQuery {
            page: None,
            per_page: None,
            status: None,
        };
        let err = service
            .list_my_tasks(&AuthUser::new(3, UserRole::Customer), &query)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
