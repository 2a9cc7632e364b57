//! Authentication for the storefront
//!
//! Users register and log in with an email and password, receive a signed
//! bearer token and present it on later requests. The token carries the
//! user's id, email and admin flag; [`middleware::auth_middleware`] decodes
//! it into an [`middleware::AuthUser`] request extension and
//! [`middleware::require_admin`] gates administrative routes.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, JwtConfig, JwtService};
pub use middleware::{AuthUser, auth_middleware, require_admin};
pub use service::AuthService;
