//! Middleware for JWT token validation and authorization

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::error;
use uuid::Uuid;

use crate::{error::AuthError, jwt::JwtService};

/// Authenticated principal decoded from the bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// Extract and validate the bearer token, attaching an [`AuthUser`] to the request
pub async fn auth_middleware(
    State(jwt_service): State<JwtService>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let claims = jwt_service.validate_token(bearer.token()).map_err(|e| {
        error!("Failed to validate token: {}", e);
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.id,
        email: claims.email,
        is_admin: claims.is_admin,
    });

    Ok(next.run(req).await)
}

/// Reject non-admin principals; must run inside [`auth_middleware`]
pub async fn require_admin(user: AuthUser, req: Request, next: Next) -> Result<Response, AuthError> {
    if !user.is_admin {
        return Err(AuthError::AdminRequired);
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}
