//! Shared harness for the session-auth integration tests.
//!
//! Everything runs in-process: a `MemoryStore` for sessions and an
//! `InMemoryDirectory` seeded with argon2-hashed users.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use secrecy::SecretString;
use session_auth::{
    build_router,
    config::{
        DirectoryConfig, Environment, JwtConfig, SecurityConfig, SessionConfig, StoreBackend,
        StoreConfig,
    },
    models::{Capability, Role},
    services::{InMemoryDirectory, JwtService, MemoryStore, SessionService},
    utils::{hash_password, Password},
    AppState,
};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

pub const ADMIN_ID: i64 = 1;
pub const KEEPER_ID: i64 = 7;
pub const VISITOR_ID: i64 = 9;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub directory: Arc<InMemoryDirectory>,
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        common: Default::default(),
        environment: Environment::Dev,
        service_name: "session-auth-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            redis_url: String::new(),
            timeout_ms: 2000,
        },
        jwt: JwtConfig {
            access_secret: SecretString::new("test-access-secret".to_string()),
            refresh_secret: SecretString::new("test-refresh-secret".to_string()),
            token_lifetime_minutes: 15,
        },
        directory: DirectoryConfig { seed_path: None },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub fn admin_role() -> Role {
    let mut role = Role::new(1, "admin");
    for cap in Capability::all() {
        role = role.with(*cap);
    }
    role
}

pub fn keeper_role() -> Role {
    Role::new(2, "keeper")
        .with(Capability::ManagePets)
        .with(Capability::ManageFood)
}

pub fn vet_role() -> Role {
    Role::new(3, "vet").with(Capability::ManageVaccines)
}

pub fn setup() -> TestApp {
    let config = test_config();

    let hash = hash_password(&Password::new(PASSWORD.to_string()))
        .expect("Failed to hash password")
        .into_string();

    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_user(ADMIN_ID, "admin", hash.clone(), vec![admin_role()]);
    directory.insert_user(KEEPER_ID, "keeper", hash.clone(), vec![keeper_role(), vet_role()]);
    directory.insert_user(VISITOR_ID, "visitor", hash, vec![]);

    let store = Arc::new(MemoryStore::new());
    let jwt = JwtService::new(&config.jwt);
    let sessions = SessionService::new(jwt, store.clone(), directory.clone());

    let state = AppState {
        config,
        sessions,
        store: store.clone(),
        credentials: directory.clone(),
        roles: directory.clone(),
    };

    TestApp {
        router: build_router(state.clone()),
        state,
        store,
        directory,
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Log in over HTTP and return the token response body.
pub async fn login(router: &Router, username: &str) -> serde_json::Value {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "username": username, "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

pub fn token(body: &serde_json::Value, field: &str) -> String {
    body[field].as_str().unwrap().to_string()
}
