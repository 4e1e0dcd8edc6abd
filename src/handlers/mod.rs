pub mod auth;
pub mod document;
pub mod notification;
pub mod order;
pub mod payment;
pub mod search;
pub mod task;

pub use auth::auth_config;
pub use document::document_config;
pub use notification::notification_config;
pub use order::order_config;
pub use payment::payment_config;
pub use search::search_config;
pub use task::task_config;
