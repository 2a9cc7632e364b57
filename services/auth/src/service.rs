//! Registration, login and admin bootstrap

use std::{net::IpAddr, sync::Arc};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    jwt::JwtService,
    models::{AuthResponse, LoginCredentials, NewUser, PublicUser, RegisterRequest, User},
    password::{hash_password, verify_password},
    rate_limiter::{RateLimiter, login_key},
    repositories::UserStore,
    validation::{normalize_email, validate_email, validate_password, validate_username},
};

/// The email that is granted admin rights at registration and bootstrapped at startup
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_USERNAME: &str = "admin";

/// Authentication service shared across handlers
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
    rate_limiter: RateLimiter,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_service: JwtService, rate_limiter: RateLimiter) -> Self {
        Self {
            users,
            jwt_service,
            rate_limiter,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Create an account and sign the caller in
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<AuthResponse> {
        let username = request.username.trim().to_string();
        let email = normalize_email(&request.email);

        validate_username(&username).map_err(AuthError::Validation)?;
        validate_email(&email).map_err(AuthError::Validation)?;
        validate_password(&request.password).map_err(AuthError::Validation)?;

        info!("Registration attempt for: {}", email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AuthError::Conflict("Username is already taken".to_string()));
        }

        let password_hash = hash_password(&request.password).map_err(AuthError::Internal)?;

        let new_user = NewUser {
            is_admin: email == ADMIN_EMAIL,
            username,
            email,
            password_hash,
        };

        let user = self.users.create(&new_user).await.map_err(|e| {
            if e.is_unique_violation() {
                AuthError::Conflict("User with this email already exists".to_string())
            } else {
                AuthError::Database(e)
            }
        })?;

        self.issue(&user)
    }

    /// Exchange credentials for a token, throttled as an unknown client
    pub async fn login(&self, credentials: LoginCredentials) -> AuthResult<AuthResponse> {
        self.login_from(None, credentials).await
    }

    /// Exchange credentials for a token; failures are throttled per client and email
    pub async fn login_from(
        &self,
        client: Option<IpAddr>,
        credentials: LoginCredentials,
    ) -> AuthResult<AuthResponse> {
        let email = normalize_email(&credentials.email);
        let key = login_key(client, &email);

        if !self.rate_limiter.is_allowed(&key).await {
            warn!("Login throttled for: {}", key);
            return Err(AuthError::TooManyRequests);
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.rate_limiter.record_failure(&key).await;
            return Err(AuthError::InvalidCredentials);
        };

        let matches = verify_password(&credentials.password, &user.password_hash).map_err(|e| {
            error!("Stored hash for {} is unreadable: {}", user.id, e);
            AuthError::InvalidCredentials
        })?;

        if !matches {
            self.rate_limiter.record_failure(&key).await;
            return Err(AuthError::InvalidCredentials);
        }

        self.rate_limiter.reset(&key).await;
        info!("User logged in: {}", user.id);
        self.issue(&user)
    }

    /// Current user's public projection
    pub async fn me(&self, user_id: Uuid) -> AuthResult<PublicUser> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.to_public())
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list_users(&self) -> AuthResult<Vec<PublicUser>> {
        let users = self.users.list().await?;
        Ok(users.iter().map(User::to_public).collect())
    }

    /// Create the bootstrap admin account if it does not exist yet.
    ///
    /// Returns true when an account was created.
    pub async fn ensure_admin(&self, password: &str) -> AuthResult<bool> {
        if self.users.find_by_email(ADMIN_EMAIL).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(password).map_err(AuthError::Internal)?;
        self.users
            .create(&NewUser {
                username: ADMIN_USERNAME.to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash,
                is_admin: true,
            })
            .await?;

        info!("Admin user created successfully");
        Ok(true)
    }

    fn issue(&self, user: &User) -> AuthResult<AuthResponse> {
        let token = self.jwt_service.generate_token(user).map_err(|e| {
            error!("Failed to generate token: {}", e);
            AuthError::Internal(e)
        })?;

        Ok(AuthResponse {
            token,
            user: user.to_public(),
        })
    }
}
