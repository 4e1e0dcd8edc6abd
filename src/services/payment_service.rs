use crate::database::DbPool;
use crate::domain::{Action, AuthUser, authorize};
use crate::entities::{NotificationType, order_entity as orders, payment_entity as payments};
use crate::error::{AppError, AppResult};
use crate::models::{PaymentResponse, RecordPaymentRequest, RecordPaymentResponse};
use crate::services::notification_service::{NewNotification, NotificationService};
use crate::services::order_service::{find_customer, find_order};
use crate::utils::{format_amount, non_empty};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

#[derive(Clone)]
pub struct PaymentService {
    pool: DbPool,
}

fn exceeds_balance(remaining: i64) -> AppError {
    AppError::BusinessRule(format!(
        "Payment amount exceeds remaining balance (remaining: {})",
        format_amount(remaining)
    ))
}

impl PaymentService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Records a payment against an order and lowers its remaining balance.
    ///
    /// The order row is locked for the whole transaction and the balance is
    /// decremented with a guarded update, so concurrent payments can never
    /// push `remaining_amount` below zero.
    pub async fn record_payment(
        &self,
        user: &AuthUser,
        request: RecordPaymentRequest,
    ) -> AppResult<RecordPaymentResponse> {
        authorize(user, Action::RecordPayment, None)?;

        if request.amount <= 0 {
            return Err(AppError::ValidationError(
                "Payment amount must be greater than zero".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let order = orders::Entity::find_by_id(request.order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if request.amount > order.remaining_amount {
            return Err(exceeds_balance(order.remaining_amount));
        }

        let updated = orders::Entity::update_many()
            .col_expr(
                orders::Column::RemainingAmount,
                Expr::col(orders::Column::RemainingAmount).sub(request.amount),
            )
            .col_expr(orders::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::RemainingAmount.gte(request.amount))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(exceeds_balance(order.remaining_amount));
        }

        let payment = payments::ActiveModel {
            order_id: Set(order.id),
            amount: Set(request.amount),
            payment_method: Set(request.payment_method),
            transaction_id: Set(non_empty(request.transaction_id)),
            notes: Set(non_empty(request.notes)),
            recorded_by: Set(user.user_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let remaining_amount = order.remaining_amount - request.amount;

        let customer = find_customer(&txn, order.customer_id).await?;
        NotificationService::create(
            &txn,
            NewNotification {
                user_id: customer.user_id,
                notification_type: NotificationType::Payment,
                title: "Payment received".to_string(),
                message: format!(
                    "We received {} for order {}. Remaining balance: {}.",
                    format_amount(request.amount),
                    order.order_number,
                    format_amount(remaining_amount)
                ),
                related_id: Some(payment.id),
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Payment {} recorded for order {} by user {}: amount={}, remaining={}",
            payment.id,
            order.order_number,
            user.user_id,
            request.amount,
            remaining_amount
        );

        Ok(RecordPaymentResponse {
            payment_id: payment.id,
            remaining_amount,
            is_fully_paid: remaining_amount <= 0,
        })
    }

    /// Payments of an order, oldest first. Same visibility as the order itself.
    pub async fn list_order_payments(
        &self,
        user: &AuthUser,
        order_id: i64,
    ) -> AppResult<Vec<PaymentResponse>> {
        let order = find_order(self.pool.as_ref(), order_id).await?;
        let customer = find_customer(self.pool.as_ref(), order.customer_id).await?;
        authorize(user, Action::ViewOrder, Some(customer.user_id))?;

        let items = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(order.id))
            .order_by_asc(payments::Column::CreatedAt)
            .order_by_asc(payments::Column::Id)
            .all(self.pool.as_ref())
            .await?;

        Ok(items.into_iter().map(PaymentResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        OrderStatus, PaymentMethod, UserRole, customer_entity as customers,
        notification_entity as notifications,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn order(remaining: i64) -> orders::Model {
        orders::Model {
            id: 10,
            order_number: "ORD-2024-0010".to_string(),
            customer_id: 3,
            description: None,
            status: OrderStatus::InProgress,
            total_amount: 100_000,
            remaining_amount: remaining,
            due_date: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn request(amount: i64) -> RecordPaymentRequest {
        RecordPaymentRequest {
            order_id: 10,
            amount,
            payment_method: PaymentMethod::Cash,
            transaction_id: Some("   ".to_string()),
            notes: Some(" deposit ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_customer_cannot_record_payment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PaymentService::new(Arc::new(db));

        let err = service
            .record_payment(&AuthUser::new(5, UserRole::Customer), request(100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = PaymentService::new(Arc::new(db));

        let err = service
            .record_payment(&AuthUser::new(1, UserRole::Admin), request(0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_paid_off_order_rejects_further_payment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order(0)]])
            .into_connection();
        let service = PaymentService::new(Arc::new(db));

        let err = service
            .record_payment(&AuthUser::new(2, UserRole::Staff), request(1))
            .await
            .unwrap_err();
        match err {
            AppError::BusinessRule(msg) => assert!(msg.contains("remaining: 0.00")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lost_race_on_guarded_update_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order(50_000)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = PaymentService::new(Arc::new(db));

        let err = service
            .record_payment(&AuthUser::new(1, UserRole::Admin), request(50_000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_payment_settles_balance() {
        let payment = payments::Model {
            id: 77,
            order_id: 10,
            amount: 50_000,
            payment_method: PaymentMethod::Cash,
            transaction_id: None,
            notes: Some("deposit".to_string()),
            recorded_by: 1,
            created_at: None,
        };
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
        let notification = notifications::Model {
            id: 1,
            user_id: 30,
            title: "Payment received".to_string(),
            message: String::new(),
            notification_type: NotificationType::Payment,
            related_id: Some(77),
            is_read: false,
            created_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order(50_000)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![payment]])
            .append_query_results([vec![customer]])
            .append_query_results([vec![notification]])
            .into_connection();
        let service = PaymentService::new(Arc::new(db));

        let response = service
            .record_payment(&AuthUser::new(1, UserRole::Admin), request(50_000))
            .await
            .unwrap();
        assert_eq!(response.payment_id, 77);
        assert_eq!(response.remaining_amount, 0);
        assert!(response.is_fully_paid);
    }
}
