use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,50}$").expect("valid username regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("valid phone regex"));

pub fn validate_username(username: &str) -> AppResult<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::ValidationError(
            "Username must be 3-50 characters of letters, digits or underscore".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > 255 || !EMAIL_RE.is_match(email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::ValidationError("Invalid phone number".to_string()));
    }
    Ok(())
}

/// Trim optional free text; empty strings become `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
