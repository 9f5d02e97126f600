//! Gemini client tests against a local stub of the generateContent API.

mod common;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use bfhl_service::services::providers::{
    GeminiConfig, GeminiTextProvider, ProviderError, TextProvider,
};
use bfhl_service::startup::{build_router, AppState};
use common::{post_bfhl, test_config};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Captured {
    call: String,
    api_key: Option<String>,
    body: Value,
}

/// Serve `router` on a random port and return the API base URL.
async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}/v1beta", addr)
}

/// Stub that records the request and answers with `reply`.
async fn recording_stub(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Option<Captured>>>) {
    let captured = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let router = Router::new().route(
        "/v1beta/models/:call",
        post(
            move |Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    *sink.lock().unwrap() = Some(Captured {
                        call,
                        api_key: headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        body,
                    });
                    (status, Json(reply))
                }
            },
        ),
    );

    (spawn_stub(router).await, captured)
}

fn provider(api_base: String, timeout: Duration) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: Secret::new("test-key".to_string()),
        model: "gemini-test".to_string(),
        api_base,
        timeout,
    })
    .expect("Failed to build provider")
}

fn text_reply(text: &str, finish_reason: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": finish_reason
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 1}
    })
}

#[tokio::test]
async fn generate_sends_prompt_and_key() {
    let (base, captured) = recording_stub(StatusCode::OK, text_reply("Paris.", "STOP")).await;

    let response = provider(base, Duration::from_secs(5))
        .generate("Capital of France?")
        .await
        .expect("generate failed");

    assert_eq!(response.text, "Paris.");
    assert_eq!(response.input_tokens, 12);
    assert_eq!(response.output_tokens, 1);

    let captured = captured.lock().unwrap().clone().expect("stub was not called");
    assert_eq!(captured.call, "gemini-test:generateContent");
    assert_eq!(captured.api_key.as_deref(), Some("test-key"));
    assert_eq!(captured.body["contents"][0]["role"], "user");
    assert_eq!(
        captured.body["contents"][0]["parts"][0]["text"],
        "Capital of France?"
    );
}

#[tokio::test]
async fn rate_limit_is_reported() {
    let (base, _) = recording_stub(StatusCode::TOO_MANY_REQUESTS, json!({"error": {}})).await;

    let err = provider(base, Duration::from_secs(5))
        .generate("hi")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited));
}

#[tokio::test]
async fn server_error_is_api_error() {
    let (base, _) = recording_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"message": "boom"}}),
    )
    .await;

    let err = provider(base, Duration::from_secs(5))
        .generate("hi")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiError(_)));
}

#[tokio::test]
async fn safety_block_is_content_filtered() {
    let (base, _) = recording_stub(StatusCode::OK, json!({"candidates": [{"finishReason": "SAFETY"}]})).await;

    let err = provider(base, Duration::from_secs(5))
        .generate("hi")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ContentFiltered));
}

#[tokio::test]
async fn missing_candidates_is_empty_response() {
    let (base, _) = recording_stub(StatusCode::OK, json!({})).await;

    let err = provider(base, Duration::from_secs(5))
        .generate("hi")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::EmptyResponse(_)));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let router = Router::new().route(
        "/v1beta/models/:call",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(text_reply("late", "STOP"))
        }),
    );
    let base = spawn_stub(router).await;

    let err = provider(base, Duration::from_millis(200))
        .generate("hi")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NetworkError(_)));
}

#[tokio::test]
async fn bfhl_ai_through_gemini_stub() {
    let (base, captured) =
        recording_stub(StatusCode::OK, text_reply("  Paris. is the answer", "STOP")).await;
    let state = AppState::new(test_config(), Arc::new(provider(base, Duration::from_secs(5))));

    let (status, body) = post_bfhl(build_router(state), r#"{"AI": "What is the capital of France"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "Paris");
    let captured = captured.lock().unwrap().clone().expect("stub was not called");
    assert_eq!(
        captured.body["contents"][0]["parts"][0]["text"],
        "What is the capital of France (Answer in exactly one word)"
    );
}

#[tokio::test]
async fn bfhl_ai_with_unreachable_gemini_is_500() {
    // Nothing listens on the discard port.
    let state = AppState::new(
        test_config(),
        Arc::new(provider("http://127.0.0.1:9/v1beta".to_string(), Duration::from_secs(2))),
    );

    let (status, body) = post_bfhl(build_router(state), r#"{"AI": "Hello"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "AI provider integration error");
}
