//! User persistence behind a store trait
//!
//! [`PgUserRepository`] is the production backend; [`MemoryUserStore`] keeps
//! users in a map and backs router-level tests.

use async_trait::async_trait;
use common::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::PgUserRepository;

/// Storage operations the authentication service needs
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user whose password is already hashed
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// All users, newest first
    async fn list(&self) -> DatabaseResult<Vec<User>>;
}
