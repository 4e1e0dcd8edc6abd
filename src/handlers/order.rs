use crate::domain::AuthUser;
use crate::models::*;
use crate::services::{OrderService, PaymentService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Page size, max 100"),
        ("status" = Option<String>, Query, description = "pending, in-progress, completed, delivered or cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Orders visible to the caller, newest first"),
        (status = 401, description = "Not logged in", body = ApiError)
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    user: AuthUser,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    match order_service.list_orders(&user, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}/status",
    tag = "order",
    params(
        ("id" = i64, Path, description = "Order id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order status with payments total and task progress", body = OrderStatusResponse),
        (status = 403, description = "Not the caller's order", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError)
    )
)]
pub async fn get_order_status(
    order_service: web::Data<OrderService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match order_service
        .get_order_status(&user, path.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}/payments",
    tag = "order",
    params(
        ("id" = i64, Path, description = "Order id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payments recorded against the order", body = [PaymentResponse]),
        (status = 403, description = "Not the caller's order", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError)
    )
)]
pub async fn get_order_payments(
    payment_service: web::Data<PaymentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service
        .list_order_payments(&user, path.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(get_orders))
            .route("/{id}/status", web::get().to(get_order_status))
            .route("/{id}/payments", web::get().to(get_order_payments)),
    );
}
