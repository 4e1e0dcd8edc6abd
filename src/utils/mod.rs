pub mod html;
pub mod jwt;
pub mod money;
pub mod password;
pub mod token;
pub mod validation;

pub use html::escape_html;
pub use jwt::*;
pub use money::{format_amount, format_money};
pub use password::*;
pub use token::{generate_reset_token, hash_token};
pub use validation::*;
