//! Health endpoint behaviour when the credential store is down.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use auth_service_lib::config::AuthServiceConfig;
use auth_service_lib::repository::CredentialStore;
use auth_service_lib::AuthModule;
use common::{AppError, AppResult};
use domain::Credential;
use gateway_lib::config::GatewayConfig;
use gateway_lib::routes::create_router;
use gateway_lib::state::AppState;

struct UnreachableStore;

#[async_trait]
impl CredentialStore for UnreachableStore {
    async fn find_by_email(&self, _email: &str) -> AppResult<Option<Credential>> {
        Err(AppError::storage("connection refused"))
    }

    async fn create_and_save(&self, _email: String, _hash: String) -> AppResult<Credential> {
        Err(AppError::storage("connection refused"))
    }

    async fn ping(&self) -> AppResult<()> {
        Err(AppError::storage("connection refused"))
    }
}

fn app() -> axum::Router {
    let auth_config = AuthServiceConfig::new("health-test-secret-0123456789abcdef", 1).unwrap();
    let auth = AuthModule::new(&auth_config, Arc::new(UnreachableStore)).unwrap();
    create_router(AppState::new(auth, GatewayConfig::default()))
}

#[tokio::test]
async fn test_health_degraded_when_store_unreachable() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["credential_store"]["error"], "STORAGE_ERROR");
}

#[tokio::test]
async fn test_login_storage_failure_is_generic_500() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"email":"a@x.com","password":"pw1"}"#))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
    assert!(!body.to_string().contains("connection refused"));
}
