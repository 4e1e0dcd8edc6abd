pub mod customers;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod password_reset_tokens;
pub mod payments;
pub mod staff;
pub mod staff_tasks;
pub mod users;

pub use customers as customer_entity;
pub use inventory as inventory_entity;
pub use notifications as notification_entity;
pub use orders as order_entity;
pub use password_reset_tokens as password_reset_token_entity;
pub use payments as payment_entity;
pub use staff as staff_entity;
pub use staff_tasks as staff_task_entity;
pub use users as user_entity;

pub use inventory::InventoryStatus;
pub use notifications::NotificationType;
pub use orders::OrderStatus;
pub use payments::PaymentMethod;
pub use staff_tasks::TaskStatus;
pub use users::UserRole;
