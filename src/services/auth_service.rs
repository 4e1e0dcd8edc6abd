use crate::config::AuthConfig;
use crate::database::DbPool;
use crate::domain::AuthUser;
use crate::entities::{
    UserRole, customer_entity as customers, password_reset_token_entity as reset_tokens,
    staff_entity as staff, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthResponse, ForgotPasswordResponse, LoginRequest, RegisterRequest, UserResponse,
};
use crate::utils::*;
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    SqlErr, TransactionTrait,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, password reset instructions have been sent.";

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

fn invalid_reset_token() -> AppError {
    AppError::ValidationError("Invalid or expired reset token".to_string())
}

/// Unique violations on `users` mean a concurrent registration won the race
fn map_duplicate(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::ValidationError("Username or email is already registered".to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService, config: AuthConfig) -> Self {
        Self {
            pool,
            jwt_service,
            config,
        }
    }

    /// Self-service sign up; always creates a `customer` with its profile
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();
        let full_name = request.full_name.trim().to_string();
        let phone = non_empty(request.phone);

        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&request.password)?;
        if full_name.is_empty() || full_name.chars().count() > 100 {
            return Err(AppError::ValidationError(
                "Full name is required (max 100 characters)".to_string(),
            ));
        }
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }

        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username.as_str()))
                    .add(users::Column::Email.eq(email.as_str())),
            )
            .one(self.pool.as_ref())
            .await?;
        if let Some(existing) = existing {
            let msg = if existing.username == username {
                "Username is already taken"
            } else {
                "Email is already registered"
            };
            return Err(AppError::ValidationError(msg.to_string()));
        }

        let password_hash = hash_password(&request.password)?;

        let txn = self.pool.begin().await?;
        let user = users::ActiveModel {
            username: Set(username),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Customer),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_duplicate)?;

        let customer = customers::ActiveModel {
            user_id: Set(user.id),
            full_name: Set(full_name),
            email: Set(Some(email)),
            phone: Set(phone),
            address: Set(non_empty(request.address)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Registered customer user {} ({})", user.id, user.username);

        self.auth_response(user, Some(customer.full_name))
    }

    /// Accepts a username or an email. Unknown, inactive and wrong-password
    /// attempts all fail the same way.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let login = request.login.trim();
        if login.is_empty() || request.password.is_empty() {
            return Err(invalid_credentials());
        }

        let user = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(login))
                    .add(users::Column::Email.eq(login.to_lowercase())),
            )
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(invalid_credentials)?;

        if !user.is_active || !verify_password(&request.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(invalid_credentials());
        }

        let now = Utc::now();
        users::Entity::update_many()
            .col_expr(users::Column::LastLoginAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .exec(self.pool.as_ref())
            .await?;

        let full_name = self.profile_name(&user).await?;
        let user = users::Model {
            last_login_at: Some(now),
            ..user
        };
        self.auth_response(user, full_name)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        let full_name = self.profile_name(&user).await?;
        self.auth_response(user, full_name)
    }

    /// Issues a single-use reset token. The answer never reveals whether the
    /// email is registered.
    pub async fn forgot_password(&self, email: &str) -> AppResult<ForgotPasswordResponse> {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .filter(users::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?;

        let Some(user) = user else {
            log::info!("Password reset requested for unknown email");
            return Ok(ForgotPasswordResponse {
                message: FORGOT_PASSWORD_MESSAGE.to_string(),
                reset_token: None,
            });
        };

        let token = generate_reset_token();
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        reset_tokens::Entity::update_many()
            .col_expr(reset_tokens::Column::UsedAt, Expr::value(now))
            .filter(reset_tokens::Column::UserId.eq(user.id))
            .filter(reset_tokens::Column::UsedAt.is_null())
            .exec(&txn)
            .await?;
        reset_tokens::ActiveModel {
            user_id: Set(user.id),
            token_hash: Set(hash_token(&token)),
            expires_at: Set(now + Duration::minutes(self.config.reset_token_ttl_minutes)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Password reset token issued for user {}", user.id);
        if self.config.expose_reset_token {
            return Ok(ForgotPasswordResponse {
                message: FORGOT_PASSWORD_MESSAGE.to_string(),
                reset_token: Some(token),
            });
        }

        log::debug!("Password reset token for user {}: {}", user.id, token);
        Ok(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.to_string(),
            reset_token: None,
        })
    }

    /// Sets a new password and burns the token in the same transaction
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid_reset_token());
        }
        validate_password(new_password)?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let record = reset_tokens::Entity::find()
            .filter(reset_tokens::Column::TokenHash.eq(hash_token(token)))
            .lock_exclusive()
            .one(&txn)
            .await?
            .filter(|t| t.is_usable(now))
            .ok_or_else(invalid_reset_token)?;

        let password_hash = hash_password(new_password)?;
        users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(record.user_id))
            .exec(&txn)
            .await?;
        reset_tokens::Entity::update_many()
            .col_expr(reset_tokens::Column::UsedAt, Expr::value(now))
            .filter(reset_tokens::Column::Id.eq(record.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!("Password reset for user {}", record.user_id);
        Ok(())
    }

    pub async fn me(&self, user: &AuthUser) -> AppResult<UserResponse> {
        let model = users::Entity::find_by_id(user.user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let full_name = self.profile_name(&model).await?;
        Ok(UserResponse::new(model, full_name))
    }

    /// Display name from the role's profile table; admins have none
    async fn profile_name(&self, user: &users::Model) -> AppResult<Option<String>> {
        let name = match user.role {
            UserRole::Customer => customers::Entity::find()
                .filter(customers::Column::UserId.eq(user.id))
                .one(self.pool.as_ref())
                .await?
                .map(|c| c.full_name),
            UserRole::Staff => staff::Entity::find()
                .filter(staff::Column::UserId.eq(user.id))
                .one(self.pool.as_ref())
                .await?
                .map(|s| s.full_name),
            UserRole::Admin => None,
        };
        Ok(name)
    }

    fn auth_response(
        &self,
        user: users::Model,
        full_name: Option<String>,
    ) -> AppResult<AuthResponse> {
        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.username, user.role)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(user.id, &user.username, user.role)?;
        let redirect_to = user.role.dashboard_path().to_string();

        Ok(AuthResponse {
            user: UserResponse::new(user, full_name),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            redirect_to,
        })
    }
}
