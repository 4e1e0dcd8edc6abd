use crate::database::DbPool;
use crate::domain::{Action, AuthUser, TaskProgress, authorize};
use crate::entities::{
    TaskStatus, UserRole, customer_entity as customers, order_entity as orders,
    payment_entity as payments, staff_task_entity as staff_tasks,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    OrderQuery, OrderResponse, OrderStatusResponse, PaginatedResponse, PaginationParams,
};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
}

impl OrderService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Order with customer name, total paid and task progress
    pub async fn get_order_status(
        &self,
        user: &AuthUser,
        order_id: i64,
    ) -> AppResult<OrderStatusResponse> {
        let order = find_order(self.pool.as_ref(), order_id).await?;
        let customer = find_customer(self.pool.as_ref(), order.customer_id).await?;
        authorize(user, Action::ViewOrder, Some(customer.user_id))?;

        let total_paid = total_paid(self.pool.as_ref(), order.id).await?;
        let progress = task_progress(self.pool.as_ref(), order.id).await?;

        Ok(OrderStatusResponse {
            order: OrderResponse::new(order, Some(&customer)),
            total_paid,
            tasks: progress.into(),
        })
    }

    /// Orders visible to the caller, newest first
    pub async fn list_orders(
        &self,
        user: &AuthUser,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = scoped_orders(user);
        if let Some(status) = query.status {
            select = select.filter(orders::Column::Status.eq(status));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let rows = select
            .find_also_related(customers::Entity)
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        let items = rows
            .into_iter()
            .map(|(order, customer)| OrderResponse::new(order, customer.as_ref()))
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }
}

/// Orders a user may see: everything for admins, orders with a task
/// assigned to them for staff, their own orders for customers.
pub(crate) fn scoped_orders(user: &AuthUser) -> Select<orders::Entity> {
    let select = orders::Entity::find();
    match user.role {
        UserRole::Admin => select,
        UserRole::Staff => select.filter(
            orders::Column::Id.in_subquery(
                Query::select()
                    .column(staff_tasks::Column::OrderId)
                    .from(staff_tasks::Entity)
                    .and_where(staff_tasks::Column::StaffId.eq(user.user_id))
                    .to_owned(),
            ),
        ),
        UserRole::Customer => select.filter(
            orders::Column::CustomerId.in_subquery(
                Query::select()
                    .column(customers::Column::Id)
                    .from(customers::Entity)
                    .and_where(customers::Column::UserId.eq(user.user_id))
                    .to_owned(),
            ),
        ),
    }
}

pub(crate) async fn find_order<C: ConnectionTrait>(db: &C, order_id: i64) -> AppResult<orders::Model> {
    orders::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

pub(crate) async fn find_customer<C: ConnectionTrait>(
    db: &C,
    customer_id: i64,
) -> AppResult<customers::Model> {
    customers::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

pub(crate) async fn total_paid<C: ConnectionTrait>(db: &C, order_id: i64) -> AppResult<i64> {
    #[derive(Debug, FromQueryResult)]
    struct SumRow {
        total: Option<i64>,
    }

    let row = payments::Entity::find()
        .select_only()
        .column_as(
            Expr::cust("CAST(COALESCE(SUM(amount), 0) AS BIGINT)"),
            "total",
        )
        .filter(payments::Column::OrderId.eq(order_id))
        .into_model::<SumRow>()
        .one(db)
        .await?;

    Ok(row.and_then(|r| r.total).unwrap_or(0))
}

pub(crate) async fn task_progress<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> AppResult<TaskProgress> {
    let total = staff_tasks::Entity::find()
        .filter(staff_tasks::Column::OrderId.eq(order_id))
        .count(db)
        .await?;
    let completed = staff_tasks::Entity::find()
        .filter(staff_tasks::Column::OrderId.eq(order_id))
        .filter(staff_tasks::Column::Status.eq(TaskStatus::Completed))
        .count(db)
        .await?;
    Ok(TaskProgress::new(total, completed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderStatus;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};
    use std::sync::Arc;

    fn order(customer_id: i64) -> orders::Model {
        orders::Model {
            id: 11,
            order_number: "ORD-0011".to_string(),
            customer_id,
            description: Some("Three-piece suit".to_string()),
            status: OrderStatus::Pending,
            total_amount: 100_000,
            remaining_amount: 100_000,
            due_date: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn customer(id: i64, user_id: i64) -> customers::Model {
        customers::Model {
            id,
            user_id,
            full_name: "Ada Lovelace".to_string(),
            email: None,
            phone: None,
            address: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_customer_cannot_view_other_customers_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order(3)]])
            .append_query_results([vec![customer(3, 99)]])
            .into_connection();
        let service = OrderService::new(Arc::new(db));

        let caller = AuthUser::new(7, UserRole::Customer);
        let err = service.get_order_status(&caller, 11).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<orders::Model>::new()])
            .into_connection();
        let service = OrderService::new(Arc::new(db));

        let caller = AuthUser::new(1, UserRole::Admin);
        let err = service.get_order_status(&caller, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_scoped_orders_filters_by_role() {
        let admin_sql = scoped_orders(&AuthUser::new(1, UserRole::Admin))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(!admin_sql.contains("WHERE"));

        let staff_sql = scoped_orders(&AuthUser::new(2, UserRole::Staff))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(staff_sql.contains("\"staff_tasks\""));
        assert!(staff_sql.contains("\"staff_id\" = 2"));

        let customer_sql = scoped_orders(&AuthUser::new(3, UserRole::Customer))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(customer_sql.contains("\"customers\""));
        assert!(customer_sql.contains("\"user_id\" = 3"));
    }
}
