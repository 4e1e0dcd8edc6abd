use crate::domain::AuthUser;
use crate::models::*;
use crate::services::TaskService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "task",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, max 100"),
        ("status" = Option<String>, Query, description = "pending, in-progress or completed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tasks assigned to the caller"),
        (status = 403, description = "Customers have no tasks", body = ApiError)
    )
)]
pub async fn get_tasks(
    task_service: web::Data<TaskService>,
    user: AuthUser,
    query: web::Query<TaskQuery>,
) -> Result<HttpResponse> {
    match task_service.list_my_tasks(&user, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/tasks/status",
    tag = "task",
    request_body = UpdateTaskStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task updated, order reconciled when requested", body = UpdateTaskStatusResponse),
        (status = 400, description = "Invalid input", body = ApiError),
        (status = 403, description = "Task is not assigned to the caller", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    )
)]
pub async fn update_task_status(
    task_service: web::Data<TaskService>,
    user: AuthUser,
    request: web::Json<UpdateTaskStatusRequest>,
) -> Result<HttpResponse> {
    match task_service
        .update_task_status(&user, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Task status updated",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn task_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::get().to(get_tasks))
            .route("/status", web::post().to(update_task_status)),
    );
}
