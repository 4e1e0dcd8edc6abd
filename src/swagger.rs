use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    InventoryStatus, NotificationType, OrderStatus, PaymentMethod, TaskStatus, UserRole,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::me,
        handlers::order::get_orders,
        handlers::order::get_order_status,
        handlers::order::get_order_payments,
        handlers::task::get_tasks,
        handlers::task::update_task_status,
        handlers::payment::record_payment,
        handlers::search::global_search,
        handlers::search::search_inventory,
        handlers::notification::notifications_get,
        handlers::notification::notifications_post,
        handlers::document::invoice,
        handlers::document::receipt,
    ),
    components(
        schemas(
            UserRole,
            OrderStatus,
            TaskStatus,
            PaymentMethod,
            InventoryStatus,
            NotificationType,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            ForgotPasswordRequest,
            ForgotPasswordResponse,
            ResetPasswordRequest,
            UserResponse,
            AuthResponse,
            OrderResponse,
            OrderStatusResponse,
            TaskProgressResponse,
            TaskResponse,
            UpdateTaskStatusRequest,
            UpdateTaskStatusResponse,
            RecordPaymentRequest,
            RecordPaymentResponse,
            PaymentResponse,
            SearchScope,
            SearchResults,
            GlobalSearchResponse,
            CustomerSearchResult,
            InventoryItemResponse,
            InventorySearchResponse,
            NotificationAction,
            NotificationRequest,
            NotificationResponse,
            NotificationListResponse,
            NotificationCountResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and password reset"),
        (name = "order", description = "Order status and payment history"),
        (name = "task", description = "Staff task progress"),
        (name = "payment", description = "Payment recording"),
        (name = "search", description = "Global and inventory search"),
        (name = "notification", description = "In-app notifications"),
        (name = "document", description = "Printable invoices and receipts"),
    ),
    info(
        title = "Tailor Shop Backend API",
        version = "1.0.0",
        description = "REST API for orders, tasks, payments and documents of a tailoring business"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/payments",
            "/tasks/status",
            "/orders/{id}/status",
            "/documents/invoice/{order_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
