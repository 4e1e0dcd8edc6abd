pub mod common;
pub mod document;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod pagination;
pub mod payment;
pub mod search;
pub mod task;
pub mod user;

pub use common::*;
pub use document::*;
pub use inventory::*;
pub use notification::*;
pub use order::*;
pub use pagination::*;
pub use payment::*;
pub use search::*;
pub use task::*;
pub use user::*;
