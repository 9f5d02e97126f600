#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bfhl_service::config::{
    BfhlConfig, CorsConfig, GeminiSettings, IdentityConfig, ObservabilityConfig,
};
use bfhl_service::services::providers::{MockTextProvider, TextProvider};
use bfhl_service::startup::{build_router, AppState, Application};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_EMAIL: &str = "tester@example.com";

pub fn test_config() -> BfhlConfig {
    BfhlConfig {
        common: CoreConfig { port: 0 },
        identity: IdentityConfig {
            official_email: TEST_EMAIL.to_string(),
        },
        gemini: GeminiSettings {
            api_key: Secret::new(String::new()),
            model: "gemini-test".to_string(),
            api_base: "http://127.0.0.1:9/v1beta".to_string(),
            timeout_secs: 1,
        },
        cors: CorsConfig {
            allowed_origins: vec![],
        },
        observability: ObservabilityConfig {
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
    }
}

/// In-process router backed by the given mock provider.
pub fn router_with(provider: MockTextProvider) -> (Router, Arc<MockTextProvider>) {
    let provider = Arc::new(provider);
    let state = AppState::new(test_config(), provider.clone());
    (build_router(state), provider)
}

/// Send one request through the router and decode the JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

pub async fn post_bfhl(router: Router, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/bfhl")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the full application on a random port.
    pub async fn spawn(provider: Arc<dyn TextProvider>) -> Self {
        let app = Application::build_with_provider(test_config(), provider)
            .await
            .expect("Failed to build test application");

        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
