//! Page routes and the guards in front of them

use crate::auth::AuthStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Contact,
    Products,
    ProductDetail(String),
    Cart,
    Login,
    Register,
    Checkout,
    OrderSuccess,
    OrderHistory,
    AdminDashboard,
    AdminProducts,
    AdminAddProduct,
    AdminEditProduct(String),
    AdminOrders,
    AdminUsers,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Any signed-in user
    Private,
    Admin,
}

/// What to do when navigating to a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Render,
    Redirect(Route),
    /// The session is still being restored
    Wait,
}

impl Route {
    /// Match a path, ignoring the query string and trailing slashes
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["about"] => Route::About,
            ["contact"] => Route::Contact,
            ["products"] => Route::Products,
            ["products", id] => Route::ProductDetail(id.to_string()),
            ["cart"] => Route::Cart,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["checkout"] => Route::Checkout,
            ["order-success"] => Route::OrderSuccess,
            ["order-history"] => Route::OrderHistory,
            ["admin"] => Route::AdminDashboard,
            ["admin", "products"] => Route::AdminProducts,
            ["admin", "products", "add"] => Route::AdminAddProduct,
            ["admin", "products", "edit", id] => Route::AdminEditProduct(id.to_string()),
            ["admin", "orders"] => Route::AdminOrders,
            ["admin", "users"] => Route::AdminUsers,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::About => "/about".to_string(),
            Route::Contact => "/contact".to_string(),
            Route::Products => "/products".to_string(),
            Route::ProductDetail(id) => format!("/products/{}", id),
            Route::Cart => "/cart".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Checkout => "/checkout".to_string(),
            Route::OrderSuccess => "/order-success".to_string(),
            Route::OrderHistory => "/order-history".to_string(),
            Route::AdminDashboard => "/admin".to_string(),
            Route::AdminProducts => "/admin/products".to_string(),
            Route::AdminAddProduct => "/admin/products/add".to_string(),
            Route::AdminEditProduct(id) => format!("/admin/products/edit/{}", id),
            Route::AdminOrders => "/admin/orders".to_string(),
            Route::AdminUsers => "/admin/users".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Checkout | Route::OrderSuccess | Route::OrderHistory => Access::Private,
            Route::AdminDashboard
            | Route::AdminProducts
            | Route::AdminAddProduct
            | Route::AdminEditProduct(_)
            | Route::AdminOrders
            | Route::AdminUsers => Access::Admin,
            _ => Access::Public,
        }
    }

    pub fn guard(&self, auth: &AuthStore) -> Guard {
        let access = self.access();
        if access == Access::Public {
            return Guard::Render;
        }
        if auth.loading() {
            return Guard::Wait;
        }
        if !auth.is_authenticated() {
            return Guard::Redirect(Route::Login);
        }
        if access == Access::Admin && !auth.is_admin() {
            return Guard::Redirect(Route::Home);
        }
        Guard::Render
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{
        api::AuthApi,
        error::{ClientError, ClientResult},
        models::{AuthResponse, User},
        storage::MemoryStore,
    };

    struct FixedAuth;

    #[async_trait]
    impl AuthApi for FixedAuth {
        async fn login(&self, email: &str, _password: &str) -> ClientResult<AuthResponse> {
            Ok(AuthResponse {
                token: "token".to_string(),
                user: User {
                    id: Uuid::nil(),
                    username: "someone".to_string(),
                    email: email.to_string(),
                    is_admin: email.starts_with("admin"),
                },
            })
        }

        async fn register(&self, _username: &str, email: &str, password: &str) -> ClientResult<AuthResponse> {
            self.login(email, password).await
        }

        async fn me(&self, _token: &str) -> ClientResult<User> {
            Err(ClientError::NotAuthenticated)
        }
    }

    fn session() -> AuthStore {
        AuthStore::new(Arc::new(FixedAuth), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_paths_round_trip() {
        for path in [
            "/",
            "/products/42",
            "/order-history",
            "/admin",
            "/admin/products/add",
            "/admin/products/edit/7",
            "/admin/users",
        ] {
            assert_eq!(Route::parse(path).path(), path);
        }
        assert_eq!(Route::parse("/products/?brand=Dabur"), Route::Products);
        assert_eq!(Route::parse("/admin/unknown"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_guards() {
        let mut auth = session();
        assert_eq!(Route::Checkout.guard(&auth), Guard::Wait);
        assert_eq!(Route::Products.guard(&auth), Guard::Render);

        auth.init().await;
        assert_eq!(Route::Checkout.guard(&auth), Guard::Redirect(Route::Login));
        assert_eq!(Route::AdminOrders.guard(&auth), Guard::Redirect(Route::Login));

        auth.login("leela@example.com", "secret123").await.unwrap();
        assert_eq!(Route::Checkout.guard(&auth), Guard::Render);
        assert_eq!(Route::AdminUsers.guard(&auth), Guard::Redirect(Route::Home));

        auth.login("admin@example.com", "admin").await.unwrap();
        assert_eq!(Route::AdminUsers.guard(&auth), Guard::Render);
    }
}
