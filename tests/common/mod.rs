#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use portfolio_admin::{
    AppConfig, AppState, InMemoryRepository, JwtTokenIssuer, MockNotifier, MockStorageService,
    auth::{TokenIssuer, TokenState, password},
    create_router,
    models::User,
    notifier::NotifierState,
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "s3cret-pass";

/// TestApp
///
/// The full router over an in-memory store, with handles kept on the fakes so
/// tests can seed data and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub notifier: MockNotifier,
    pub tokens: Arc<JwtTokenIssuer>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_services(MockNotifier::new(), MockStorageService::new())
    }

    pub fn with_services(notifier: MockNotifier, storage: MockStorageService) -> Self {
        let config = AppConfig::default();
        let repo = Arc::new(InMemoryRepository::new());
        let tokens = Arc::new(JwtTokenIssuer::from_config(&config));

        let state = AppState {
            repo: repo.clone() as RepositoryState,
            tokens: tokens.clone() as TokenState,
            notifier: Arc::new(notifier.clone()) as NotifierState,
            storage: Arc::new(storage) as StorageState,
            config,
        };

        Self {
            router: create_router(state.clone()),
            state,
            repo,
            notifier,
            tokens,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Inserts a user directly and returns it with an access token.
    pub fn seed_user(&self, username: &str, is_admin: bool, is_superuser: bool) -> (User, String) {
        let user = user(username, is_admin, is_superuser);
        self.repo.insert_user(user.clone()).unwrap();
        let access = self.tokens.issue(&user).unwrap().access;
        (user, access)
    }

    /// A signed-in bootstrap admin.
    pub fn admin_token(&self) -> String {
        self.seed_user("owner", true, false).1
    }

    /// Waits for the detached notification task to deliver `count` emails.
    pub async fn wait_for_emails(&self, count: usize) -> bool {
        for _ in 0..100 {
            if self.notifier.sent().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

pub fn user(username: &str, is_admin: bool, is_superuser: bool) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: password::hash_password(PASSWORD).unwrap(),
        first_name: String::new(),
        last_name: String::new(),
        is_admin,
        is_staff: is_admin,
        is_superuser,
        is_active: true,
        date_joined: now,
        created_at: now,
        updated_at: now,
    }
}
