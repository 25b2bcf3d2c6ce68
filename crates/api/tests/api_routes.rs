use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use retort_api::{
    create_router, ApiHandlers, RouterOptions, GENERATION_FAILED_MESSAGE, INVALID_INPUT_MESSAGE,
};
use retort_core::{RetortError, RetortResult};
use retort_llm_connector::{CompletionProvider, CompletionRequest, CompletionResponse, Usage};
use retort_observability::{metrics::MetricType, MetricsCollector};
use retort_rebuttal::{GenerationSettings, RebuttalGenerator, DEFAULT_FILLER_REPLY};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FakeProvider {
    content: Option<String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, _request: CompletionRequest) -> RetortResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.content {
            Some(content) => Ok(CompletionResponse {
                content: content.clone(),
                usage: Usage::default(),
            }),
            None => Err(RetortError::Upstream("connection reset".to_string())),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct Harness {
    router: Router,
    calls: Arc<AtomicUsize>,
    metrics: Arc<MetricsCollector>,
}

fn harness(content: Option<&str>) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = FakeProvider {
        content: content.map(str::to_string),
        calls: calls.clone(),
    };
    let generator = RebuttalGenerator::new(Arc::new(provider), GenerationSettings::default());
    harness_with(generator, calls)
}

fn harness_with(generator: RebuttalGenerator, calls: Arc<AtomicUsize>) -> Harness {
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let handlers = Arc::new(ApiHandlers::new(generator, metrics.clone(), 10));
    Harness {
        router: create_router(handlers, RouterOptions::default()),
        calls,
        metrics,
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn generate(router: &Router, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, "/api/generate", Some(body.to_string())).await
}

#[tokio::test]
async fn generate_returns_three_clean_replies() {
    let h = harness(Some("1.回复A\n2.回复B\n3.回复C"));

    let (status, body) = generate(&h.router, json!({"input": "你怎么这么笨", "intensity": 9})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"responses": ["回复A", "回复B", "回复C"]}));
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.metrics.get(MetricType::RepliesGenerated), 1);
}

#[tokio::test]
async fn blank_input_is_rejected_before_completion() {
    let h = harness(Some("unused"));

    for body in [
        json!({"input": "   ", "intensity": 5}),
        json!({"input": 42, "intensity": 5}),
        json!({"intensity": 5}),
    ] {
        let (status, payload) = generate(&h.router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload, json!({"error": INVALID_INPUT_MESSAGE}));
    }

    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.get(MetricType::InvalidRequests), 3);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = harness(Some("unused"));

    let (status, payload) = send(
        &h.router,
        Method::POST,
        "/api/generate",
        Some("{not json".to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["error"], INVALID_INPUT_MESSAGE);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.get(MetricType::TotalRequests), 1);
    assert_eq!(h.metrics.get(MetricType::InvalidRequests), 1);
}

#[tokio::test]
async fn missing_content_type_is_counted_as_invalid() {
    let h = harness(Some("unused"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .body(Body::from(json!({"input": "x", "intensity": 5}).to_string()))
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.get(MetricType::TotalRequests), 1);
    assert_eq!(h.metrics.get(MetricType::InvalidRequests), 1);
}

#[tokio::test]
async fn upstream_failure_is_generic_500() {
    let h = harness(None);

    let (status, payload) = generate(&h.router, json!({"input": "你说什么", "intensity": 3})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload, json!({"error": GENERATION_FAILED_MESSAGE}));
    assert_eq!(h.metrics.get(MetricType::UpstreamFailures), 1);
}

#[tokio::test]
async fn missing_credentials_are_reported_as_configuration_error() {
    let generator = RebuttalGenerator::unconfigured(
        "API key not found: DEEPSEEK_API_KEY",
        GenerationSettings::default(),
    );
    let h = harness_with(generator, Arc::new(AtomicUsize::new(0)));

    let (status, payload) = generate(&h.router, json!({"input": "你说什么", "intensity": 3})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = payload["error"].as_str().unwrap();
    assert!(message.contains("API Key"));
    assert!(message.contains("DEEPSEEK_API_KEY"));
    assert_eq!(h.metrics.get(MetricType::Misconfigured), 1);
}

#[tokio::test]
async fn degenerate_completion_is_padded() {
    let h = harness(Some(""));

    let (status, payload) = generate(&h.router, json!({"input": "你说什么", "intensity": 3})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload["responses"],
        json!([DEFAULT_FILLER_REPLY, DEFAULT_FILLER_REPLY, DEFAULT_FILLER_REPLY])
    );
    assert_eq!(h.metrics.get(MetricType::PaddingFallbacks), 1);
}

#[tokio::test]
async fn history_records_newest_first_and_clears() {
    let h = harness(Some("第一条\n第二条\n第三条"));

    for input in ["一", "二"] {
        let (status, _) = generate(&h.router, json!({"input": input, "intensity": 5})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&h.router, Method::GET, "/api/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["responses"], json!(["第一条", "第二条", "第三条"]));
    assert!(entries[1]["id"].is_string());

    let (status, _) = send(&h.router, Method::DELETE, "/api/history", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&h.router, Method::GET, "/api/history", None).await;
    assert!(body["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let h = harness(Some("a\nb\nc"));
    generate(&h.router, json!({"input": "x", "intensity": 1})).await;

    let (status, body) = send(&h.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["configured"], true);
    assert_eq!(body["details"]["metrics"]["total_requests"], 1);

    let (status, body) = send(&h.router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("retort_requests_total 1"));
}

#[tokio::test]
async fn metrics_route_can_be_disabled() {
    let h = harness(Some("a\nb\nc"));
    let handlers = Arc::new(ApiHandlers::new(
        RebuttalGenerator::unconfigured("off", GenerationSettings::default()),
        h.metrics.clone(),
        10,
    ));
    let router = create_router(
        handlers,
        RouterOptions {
            cors_enabled: false,
            metrics_enabled: false,
        },
    );

    let (status, _) = send(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
