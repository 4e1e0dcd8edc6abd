use crate::database::DbPool;
use crate::domain::{Action, AuthUser, authorize};
use crate::entities::{NotificationType, notification_entity as notifications};
use crate::error::{AppError, AppResult};
use crate::models::{
    NotificationCountResponse, NotificationListResponse, NotificationResponse,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// New notification content; `related_id` links back to an order or payment
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<i64>,
}

#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
}

impl NotificationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Appends a notification on any connection, so callers can include it in
    /// their own transaction.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        notification: NewNotification,
    ) -> AppResult<notifications::Model> {
        let model = notifications::ActiveModel {
            user_id: Set(notification.user_id),
            title: Set(notification.title),
            message: Set(notification.message),
            notification_type: Set(notification.notification_type),
            related_id: Set(notification.related_id),
            is_read: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(model)
    }

    pub async fn count_unread(&self, user: &AuthUser) -> AppResult<NotificationCountResponse> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user.user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(self.pool.as_ref())
            .await?;
        Ok(NotificationCountResponse { count })
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        limit: Option<u64>,
        offset: Option<u64>,
        unread_only: bool,
    ) -> AppResult<NotificationListResponse> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        let mut query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user.user_id));
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        let items = query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.pool.as_ref())
            .await?;

        let unread_count = self.count_unread(user).await?.count;

        Ok(NotificationListResponse {
            notifications: items.into_iter().map(NotificationResponse::from).collect(),
            unread_count,
        })
    }

    pub async fn mark_read(&self, user: &AuthUser, notification_id: i64) -> AppResult<()> {
        let notification = self.find_owned(user, notification_id).await?;
        if notification.is_read {
            return Ok(());
        }

        notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(notification.id))
            .exec(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Returns the number of notifications that changed
    pub async fn mark_all_read(&self, user: &AuthUser) -> AppResult<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user.user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, user: &AuthUser, notification_id: i64) -> AppResult<()> {
        let notification = self.find_owned(user, notification_id).await?;
        notifications::Entity::delete_by_id(notification.id)
            .exec(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Someone else's notification is reported as missing
    async fn find_owned(
        &self,
        user: &AuthUser,
        notification_id: i64,
    ) -> AppResult<notifications::Model> {
        let notification = notifications::Entity::find_by_id(notification_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        authorize(user, Action::ManageNotification, Some(notification.user_id))
            .map_err(|_| AppError::NotFound("Notification not found".to_string()))?;

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn notification(id: i64, user_id: i64) -> notifications::Model {
        notifications::Model {
            id,
            user_id,
            title: "Payment received".to_string(),
            message: "We received your payment".to_string(),
            notification_type: NotificationType::Payment,
            related_id: Some(10),
            is_read: false,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_cannot_delete_someone_elses_notification() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification(5, 42)]])
            .into_connection();
        let service = NotificationService::new(Arc::new(db));
        let user = AuthUser::new(7, UserRole::Customer);

        let err = service.delete(&user, 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_returns_inserted_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification(1, 42)]])
            .into_connection();

        let created = NotificationService::create(
            &db,
            NewNotification {
                user_id: 42,
                notification_type: NotificationType::Payment,
                title: "Payment received".to_string(),
                message: "We received your payment".to_string(),
                related_id: Some(10),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.user_id, 42);
        assert!(!created.is_read);
    }
}
