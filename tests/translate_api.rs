use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::{Method::POST, MockServer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

use translator_backend::config::{Config, UpstreamConfig};
use translator_backend::store::{KeyValueStore, MemoryStore, NoopStore};
use translator_backend::translate::{GroqTranslator, LanguageDetector, LanguageResolver, Translator};
use translator_backend::{routes, AppState, TranslateError};

struct FrenchTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for FrenchTranslator {
    fn model(&self) -> &str {
        "fake-model"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, _source: &str, _target: &str, text: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match text {
            "Hello" => "Bonjour".to_string(),
            other => format!("{} (fr)", other),
        })
    }
}

struct EnglishDetector;

impl LanguageDetector for EnglishDetector {
    fn detect(&self, _text: &str) -> Option<String> {
        Some("en".to_string())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.server.static_dir = None;
    config.limits.rate_limit_interval_ms = 0;
    config.limits.token_budget = 10_000;
    config
}

fn app_with(config: Config, store: Arc<dyn KeyValueStore>, translator: Arc<dyn Translator>) -> Router {
    let resolver = LanguageResolver::new(Arc::new(EnglishDetector));
    routes::create_routes(AppState::with_parts(config, store, translator, resolver))
}

fn fake_app() -> (Router, Arc<FrenchTranslator>) {
    let translator = Arc::new(FrenchTranslator {
        calls: AtomicUsize::new(0),
    });
    let app = app_with(test_config(), Arc::new(MemoryStore::new()), translator.clone());
    (app, translator)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn generate_cache_and_regenerate() {
    let (app, translator) = fake_app();
    let body = json!({"text": "Hello", "target_lang": "French"});

    let (status, first) = send(&app, post_json("/api/translate", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "generated");
    assert_eq!(first["translated_text"], "Bonjour");
    assert_eq!(first["target_language"], "French");
    assert_eq!(first["source_language"], "EN");
    assert_eq!(first["tokens_used"], 2);

    let (status, second) = send(&app, post_json("/api/translate", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "cached");
    assert_eq!(second["translated_text"], "Bonjour");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

    let (status, third) = send(&app, post_json("/api/retranslate", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["status"], "regenerated");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn lenient_routes_accept_any_content_type() {
    let (app, _) = fake_app();
    let request = Request::builder()
        .method("POST")
        .uri("/translate")
        .header("content-type", "text/plain")
        .body(Body::from(json!({"text": "Hello", "target_lang": "French"}).to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["translated_text"], "Bonjour");

    let (status, body) = send(
        &app,
        post_json("/retranslate", json!({"text": "Hello", "target_lang": "French"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "regenerated");
}

#[tokio::test]
async fn strict_routes_require_json_content_type() {
    let (app, translator) = fake_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/translate")
        .header("content-type", "text/plain")
        .body(Body::from(json!({"text": "Hello", "target_lang": "French"}).to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["error"], "Request must be JSON format");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_input_is_rejected_with_envelope() {
    let (app, translator) = fake_app();

    let long_text = "a".repeat(2001);
    let (status, body) = send(
        &app,
        post_json("/api/translate", json!({"text": long_text, "target_lang": "French"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["status_code"], 400);
    assert!(body["timestamp"].is_number());

    let (status, body) = send(
        &app,
        post_json("/api/translate", json!({"text": "Hello", "target_lang": "Spanish3"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid target language format");

    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_request_inside_interval_is_throttled() {
    let translator = Arc::new(FrenchTranslator {
        calls: AtomicUsize::new(0),
    });
    let mut config = test_config();
    config.limits.rate_limit_interval_ms = 60_000;
    let app = app_with(config, Arc::new(MemoryStore::new()), translator.clone());

    let (status, _) = send(&app, post_json("/api/translate", json!({"text": "Hello", "target_lang": "French"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/api/translate", json!({"text": "Bye", "target_lang": "French"}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_type"], "rate_limit_error");
    assert_eq!(body["error"], "Rate limit exceeded for 198.51.100.4");
    assert!(body["details"].as_str().unwrap().starts_with("Wait "));
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn health_reports_collaborators() {
    let (app, _) = fake_app();
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cacheBackend"], "connected");
    assert!(body.get("cache_backend").is_none());
    assert_eq!(body["store"], "memory");
    assert_eq!(body["upstream"], "configured");
    assert_eq!(body["limits"]["max_text_length"], 2000);
    assert_eq!(body["limits"]["max_tokens_per_request"], 300);
}

#[tokio::test]
async fn unknown_routes_and_methods_use_envelope() {
    let (app, _) = fake_app();

    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found_error");

    let request = Request::builder().uri("/api/translate").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error_type"], "method_error");
}

#[tokio::test]
async fn missing_api_key_fails_fast() {
    let translator = Arc::new(GroqTranslator::new(&UpstreamConfig::default()).unwrap());
    let app = app_with(test_config(), Arc::new(NoopStore), translator);

    let (status, body) = send(
        &app,
        post_json("/api/translate", json!({"text": "Hello", "target_lang": "French"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "api_key_error");

    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (_, health) = send(&app, request).await;
    assert_eq!(health["upstream"], "not_configured");
    assert_eq!(health["cacheBackend"], "not_configured");
}

fn upstream_app(server: &MockServer) -> Router {
    let upstream = UpstreamConfig {
        api_url: server.url("/openai/v1/chat/completions"),
        api_key: Some("gsk-test".to_string()),
        max_retries: 5,
        base_delay_ms: 0,
        timeout_secs: 5,
        ..UpstreamConfig::default()
    };
    let translator = Arc::new(GroqTranslator::new(&upstream).unwrap());
    let mut config = test_config();
    config.upstream = upstream;
    app_with(config, Arc::new(MemoryStore::new()), translator)
}

#[tokio::test]
async fn upstream_500_surfaces_after_all_retries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(500)
                .json_body(json!({"error": {"message": "internal failure"}}));
        })
        .await;

    let app = upstream_app(&server);
    let (status, body) = send(
        &app,
        post_json("/api/translate", json!({"text": "Hello", "target_lang": "French"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "groq_api_error");
    assert_eq!(body["details"], "internal failure");
    mock.assert_calls_async(5).await;
}

#[tokio::test]
async fn upstream_401_is_an_api_key_error_without_retry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "Invalid API Key"}}));
        })
        .await;

    let app = upstream_app(&server);
    let (status, body) = send(
        &app,
        post_json("/api/translate", json!({"text": "Hello", "target_lang": "French"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "api_key_error");
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn upstream_success_is_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .body_includes("\"content\":\"Hello\"");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "Bonjour"}}]
            }));
        })
        .await;

    let app = upstream_app(&server);
    let body = json!({"text": "Hello", "target_lang": "French"});

    let (_, first) = send(&app, post_json("/api/translate", body.clone())).await;
    assert_eq!(first["status"], "generated");
    assert_eq!(first["translated_text"], "Bonjour");
    assert_eq!(first["cache_available"], true);

    let (_, second) = send(&app, post_json("/api/translate", body)).await;
    assert_eq!(second["status"], "cached");
    mock.assert_calls_async(1).await;
}
