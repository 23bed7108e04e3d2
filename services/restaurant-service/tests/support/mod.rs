#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use restaurant_service::config::{load_from, ServiceConfig};
use restaurant_service::store::{MemoryStore, Stores};
use restaurant_service::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "chef@example.com";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_config() -> ServiceConfig {
    let pairs = [
        ("JWT_SECRET", "integration-secret"),
        ("JWT_ISSUER", "restaurant-tests"),
        ("JWT_AUDIENCE", "restaurant-tests-clients"),
        ("ADMIN_EMAILS", ADMIN_EMAIL),
        ("PASSWORD_HASH_MEMORY_KIB", "1024"),
        ("PASSWORD_HASH_ITERATIONS", "1"),
        ("PASSWORD_HASH_PARALLELISM", "1"),
    ];
    load_from(|key| {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    })
    .expect("test config")
}

pub fn test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(&config, Stores::from_backend(store.clone())).expect("state");
    let router = build_router(state.clone(), &config.cors_allowed_origins);
    TestApp {
        router,
        state,
        store,
    }
}

impl TestApp {
    pub async fn send(&self, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["user"].clone()
    }

    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "identifier": identifier, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn register_and_login(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        self.register(username, &email, "pa55word").await;
        self.login(username, "pa55word").await
    }

    pub async fn admin_token(&self) -> String {
        self.register("chef", ADMIN_EMAIL, "pa55word").await;
        self.login("chef", "pa55word").await
    }

    pub async fn add_menu_item(&self, admin_token: &str, name: &str, category: &str, price: &str, available: bool) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/menu",
                Some(admin_token),
                Some(json!({
                    "name": name,
                    "category": category,
                    "price": price,
                    "isAvailable": available,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "menu create failed: {body}");
        body["id"].as_str().expect("id").to_string()
    }

    /// Token for `user_id` minted at an arbitrary instant with the app's own key.
    pub fn token_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> String {
        self.state
            .tokens
            .issue_at(user_id, issued_at)
            .expect("issue token")
            .token
    }
}

pub fn user_id(user: &Value) -> Uuid {
    user["id"].as_str().and_then(|id| Uuid::parse_str(id).ok()).expect("user id")
}
