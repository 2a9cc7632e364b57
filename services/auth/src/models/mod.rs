//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{AuthResponse, LoginCredentials, NewUser, PublicUser, RegisterRequest, User};
