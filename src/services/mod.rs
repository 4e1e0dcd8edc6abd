pub mod auth_service;
pub mod document_service;
pub mod notification_service;
pub mod order_service;
pub mod payment_service;
pub mod search_service;
pub mod task_service;

pub use auth_service::AuthService;
pub use document_service::DocumentService;
pub use notification_service::{NewNotification, NotificationService};
pub use order_service::OrderService;
pub use payment_service::PaymentService;
pub use search_service::SearchService;
pub use task_service::TaskService;
