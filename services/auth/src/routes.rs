//! Authentication service routes

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::info;

use crate::{
    error::AuthError,
    middleware::{AuthUser, auth_middleware, require_admin},
    models::{LoginCredentials, RegisterRequest},
    service::AuthService,
};

/// Create the router for `/api/auth/*` and `/api/users`
pub fn create_router<S>(service: AuthService) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let jwt_service = service.jwt_service().clone();

    let authenticated = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            jwt_service.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/api/users", get(list_users))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(jwt_service, auth_middleware));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(authenticated)
        .merge(admin)
        .with_state(service)
}

/// User registration endpoint
pub async fn register(
    State(service): State<AuthService>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = service.register(payload).await?;
    info!("Registered user: {}", response.user.id);

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(service): State<AuthService>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    let client = peer.map(|ConnectInfo(addr)| addr.ip());
    let response = service.login_from(client, payload).await?;
    Ok(Json(response))
}

/// Current user endpoint
pub async fn me(
    State(service): State<AuthService>,
    user: AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let user = service.me(user.id).await?;
    Ok(Json(user))
}

/// Admin listing of all accounts
pub async fn list_users(State(service): State<AuthService>) -> Result<impl IntoResponse, AuthError> {
    let users = service.list_users().await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        jwt::{DEFAULT_TOKEN_EXPIRY, JwtConfig, JwtService},
        rate_limiter::RateLimiter,
        repositories::MemoryUserStore,
    };

    fn app() -> Router {
        let jwt = JwtService::new(JwtConfig {
            secret: "routes-secret".to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        });
        let service = AuthService::new(
            Arc::new(MemoryUserStore::new()),
            jwt,
            RateLimiter::default(),
        );
        create_router(service)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register(app: &Router, username: &str, email: &str) -> Value {
        let (status, body) = send(
            app,
            post_json(
                "/api/auth/register",
                json!({"username": username, "email": email, "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_register_then_me() {
        let app = app();
        let body = register(&app, "anita", "anita@example.com").await;
        assert_eq!(body["user"]["username"], "anita");
        assert_eq!(body["user"]["isAdmin"], false);
        assert!(body["user"].get("password").is_none());

        let token = body["token"].as_str().unwrap();
        let (status, me) = send(&app, get_with_token("/api/auth/me", Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "anita@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_conflict() {
        let app = app();
        register(&app, "ravi", "ravi@example.com").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"username": "ravi2", "email": "ravi@example.com", "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User with this email already exists");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = app();
        register(&app, "deepa", "deepa@example.com").await;

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"email": "deepa@example.com", "password": "incorrect"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_throttling_follows_peer_address() {
        use axum::extract::connect_info::MockConnectInfo;

        let shared = app();
        register(&shared, "deepa", "deepa@example.com").await;
        let attacker = shared
            .clone()
            .layer(MockConnectInfo(SocketAddr::from(([198, 51, 100, 23], 4000))));
        let owner = shared.layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 5], 4000))));

        for _ in 0..5 {
            send(
                &attacker,
                post_json(
                    "/api/auth/login",
                    json!({"email": "deepa@example.com", "password": "incorrect"}),
                ),
            )
            .await;
        }
        let login = || {
            post_json(
                "/api/auth/login",
                json!({"email": "deepa@example.com", "password": "secret123"}),
            )
        };

        let (status, _) = send(&attacker, login()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, body) = send(&owner, login()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "deepa@example.com");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = app();
        let (status, body) = send(&app, get_with_token("/api/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn test_garbage_token_is_forbidden() {
        let app = app();
        let (status, body) = send(&app, get_with_token("/api/auth/me", Some("not.a.jwt"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_users_listing_requires_admin() {
        let app = app();
        let regular = register(&app, "suresh", "suresh@example.com").await;
        let admin = register(&app, "admin", "admin@example.com").await;

        let (status, body) = send(
            &app,
            get_with_token("/api/users", regular["token"].as_str()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");

        let (status, body) =
            send(&app, get_with_token("/api/users", admin["token"].as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
