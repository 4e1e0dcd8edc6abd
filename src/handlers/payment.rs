use crate::domain::AuthUser;
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/payments",
    tag = "payment",
    request_body = RecordPaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment recorded", body = RecordPaymentResponse),
        (status = 400, description = "Invalid amount or method", body = ApiError),
        (status = 403, description = "Only admin and staff record payments", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError),
        (status = 422, description = "Amount exceeds the remaining balance", body = ApiError)
    )
)]
pub async fn record_payment(
    payment_service: web::Data<PaymentService>,
    user: AuthUser,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse> {
    match payment_service
        .record_payment(&user, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Payment recorded",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/payments").route("", web::post().to(record_payment)));
}
