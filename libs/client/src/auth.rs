//! Session state: the signed-in user and their bearer token

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    api::AuthApi,
    error::ClientResult,
    models::{AuthResponse, User},
    storage::{KeyValueStore, TOKEN_KEY},
};

pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

impl AuthStore {
    /// Starts loading; call [`AuthStore::init`] to restore a saved session
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            storage,
            user: None,
            token: None,
            loading: true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Re-validate a persisted token; any failure signs the user out
    pub async fn init(&mut self) {
        self.loading = true;

        match self.storage.get(TOKEN_KEY) {
            Some(token) => match self.api.me(&token).await {
                Ok(user) => {
                    self.token = Some(token);
                    self.user = Some(user);
                }
                Err(e) => {
                    warn!("Saved session is no longer valid: {}", e);
                    self.clear();
                }
            },
            None => {
                self.token = None;
                self.user = None;
            }
        }

        self.loading = false;
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<&User> {
        let response = self.api.login(email, password).await?;
        self.establish(response)
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> ClientResult<&User> {
        let response = self.api.register(username, email, password).await?;
        self.establish(response)
    }

    pub fn logout(&mut self) {
        self.clear();
        info!("Signed out");
    }

    fn establish(&mut self, response: AuthResponse) -> ClientResult<&User> {
        self.storage.set(TOKEN_KEY, &response.token)?;
        self.token = Some(response.token);
        self.loading = false;
        Ok(self.user.insert(response.user))
    }

    fn clear(&mut self) {
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!("Failed to remove saved token: {}", e);
        }
        self.token = None;
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{error::ClientError, storage::MemoryStore};

    /// Accepts the password "secret123" and only the tokens it issued
    struct FakeAuth;

    fn user(email: &str) -> User {
        User {
            id: Uuid::nil(),
            username: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            is_admin: email.starts_with("admin"),
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
            if password != "secret123" {
                return Err(ClientError::Api {
                    status: 400,
                    message: "Invalid credentials".to_string(),
                });
            }
            Ok(AuthResponse {
                token: format!("token-for:{}", email),
                user: user(email),
            })
        }

        async fn register(&self, _username: &str, email: &str, password: &str) -> ClientResult<AuthResponse> {
            self.login(email, password).await
        }

        async fn me(&self, token: &str) -> ClientResult<User> {
            token
                .strip_prefix("token-for:")
                .map(user)
                .ok_or(ClientError::Api {
                    status: 403,
                    message: "Invalid token".to_string(),
                })
        }
    }

    fn store(storage: Arc<MemoryStore>) -> AuthStore {
        AuthStore::new(Arc::new(FakeAuth), storage)
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let storage = Arc::new(MemoryStore::new());
        let mut auth = store(storage.clone());

        let user = auth.login("kiran@example.com", "secret123").await.unwrap();
        assert_eq!(user.email, "kiran@example.com");
        assert!(auth.is_authenticated());
        assert!(!auth.is_admin());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("token-for:kiran@example.com"));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_state_and_surfaces_message() {
        let storage = Arc::new(MemoryStore::new());
        let mut auth = store(storage.clone());
        auth.init().await;

        let err = auth.login("kiran@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_init_restores_valid_session() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(TOKEN_KEY, "token-for:admin@example.com").unwrap();

        let mut auth = store(storage);
        assert!(auth.loading());
        auth.init().await;
        assert!(!auth.loading());
        assert!(auth.is_admin());
        assert_eq!(auth.token(), Some("token-for:admin@example.com"));
    }

    #[tokio::test]
    async fn test_init_discards_rejected_token() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(TOKEN_KEY, "expired").unwrap();

        let mut auth = store(storage.clone());
        auth.init().await;
        assert!(!auth.loading());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.token(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let storage = Arc::new(MemoryStore::new());
        let mut auth = store(storage.clone());
        auth.register("meera", "meera@example.com", "secret123").await.unwrap();

        auth.logout();
        assert!(auth.user().is_none());
        assert_eq!(auth.token(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }
}
