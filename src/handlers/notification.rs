use crate::domain::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::NotificationService;
use actix_web::{HttpResponse, ResponseError, Result, web};

fn require_id(request: &NotificationRequest) -> AppResult<i64> {
    request
        .notification_id
        .ok_or_else(|| AppError::ValidationError("notification_id is required".to_string()))
}

async fn dispatch(
    service: &NotificationService,
    user: &AuthUser,
    request: NotificationRequest,
) -> AppResult<HttpResponse> {
    let response = match request.action {
        NotificationAction::Count => {
            HttpResponse::Ok().json(ApiResponse::success(service.count_unread(user).await?))
        }
        NotificationAction::List => HttpResponse::Ok().json(ApiResponse::success(
            service
                .list(user, request.limit, request.offset, request.unread_only)
                .await?,
        )),
        NotificationAction::Read => {
            service.mark_read(user, require_id(&request)?).await?;
            HttpResponse::Ok().json(ApiResponse::message("Notification marked as read"))
        }
        NotificationAction::ReadAll => {
            let updated = service.mark_all_read(user).await?;
            HttpResponse::Ok().json(ApiResponse::success_with_message(
                serde_json::json!({ "updated": updated }),
                "All notifications marked as read",
            ))
        }
        NotificationAction::Delete => {
            service.delete(user, require_id(&request)?).await?;
            HttpResponse::Ok().json(ApiResponse::message("Notification deleted"))
        }
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notification",
    params(NotificationRequest),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Result of the requested action"),
        (status = 400, description = "Missing notification_id", body = ApiError),
        (status = 404, description = "Notification not found", body = ApiError)
    )
)]
pub async fn notifications_get(
    service: web::Data<NotificationService>,
    user: AuthUser,
    query: web::Query<NotificationRequest>,
) -> Result<HttpResponse> {
    match dispatch(&service, &user, query.into_inner()).await {
        Ok(response) => Ok(response),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notification",
    request_body = NotificationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Result of the requested action"),
        (status = 400, description = "Missing notification_id", body = ApiError),
        (status = 404, description = "Notification not found", body = ApiError)
    )
)]
pub async fn notifications_post(
    service: web::Data<NotificationService>,
    user: AuthUser,
    request: web::Json<NotificationRequest>,
) -> Result<HttpResponse> {
    match dispatch(&service, &user, request.into_inner()).await {
        Ok(response) => Ok(response),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn notification_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(notifications_get))
            .route("", web::post().to(notifications_post)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_requires_notification_id() {
        let request = NotificationRequest {
            action: NotificationAction::Read,
            ..Default::default()
        };
        assert!(matches!(
            require_id(&request),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_action_defaults_to_list() {
        let request: NotificationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.action, NotificationAction::List);
        assert!(!request.unread_only);
    }

    #[test]
    fn test_unread_only_accepts_numeric_and_bool_forms() {
        for (query, expected) in [
            ("action=list&unread_only=1", true),
            ("action=list&unread_only=true", true),
            ("action=list&unread_only=0", false),
            ("action=list", false),
        ] {
            let request = web::Query::<NotificationRequest>::from_query(query).unwrap();
            assert_eq!(request.unread_only, expected, "{query}");
        }

        let request: NotificationRequest = serde_json::from_str(r#"{"unread_only":1}"#).unwrap();
        assert!(request.unread_only);
        assert!(web::Query::<NotificationRequest>::from_query("unread_only=yes").is_err());
    }
}
