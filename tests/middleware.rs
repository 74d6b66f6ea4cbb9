//! Trace id middleware scenarios, driven through an axum router.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use trace_logger::http::{trace_id_middleware, TraceMiddlewareState};
use trace_logger::trace::{ExtractorConfig, Generator};
use trace_logger::{Logger, TraceStore};

mod common;
use common::SharedBuffer;

#[derive(Clone)]
struct TestState {
    logger: Logger,
    store: Arc<TraceStore>,
}

async fn handle(State(state): State<TestState>) -> Json<Value> {
    state.logger.info("handled");
    Json(json!({ "traceId": state.store.current_trace_id() }))
}

async fn handle_order(State(state): State<TestState>, Path(order): Path<String>) -> Json<Value> {
    state.logger.info(format!("order {}", order));
    Json(json!({ "traceId": state.store.current_trace_id() }))
}

async fn handle_post(State(state): State<TestState>, Json(body): Json<Value>) -> Json<Value> {
    state.logger.info("posted");
    Json(json!({ "traceId": state.store.current_trace_id(), "body": body }))
}

fn app(store: Arc<TraceStore>, trace_state: TraceMiddlewareState) -> (Router, SharedBuffer) {
    let (logger, buffer) = common::capture_logger(store.clone());
    let router = Router::new()
        .route("/", get(handle))
        .route("/orders/{traceId}", get(handle_order))
        .route("/orders", post(handle_post))
        .route("/files/{*path}", get(handle))
        .with_state(TestState { logger, store })
        .layer(middleware::from_fn_with_state(trace_state, trace_id_middleware));
    (router, buffer)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_request_id_header_reaches_logs() {
    let store = Arc::new(TraceStore::new());
    let (router, buffer) = app(store.clone(), TraceMiddlewareState::new(store));

    let response = router
        .oneshot(Request::get("/").header("x-request-id", "abc-123").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "abc-123");
    assert_eq!(body_json(response).await["traceId"], "abc-123");

    let entries = buffer.with_message("handled");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["traceId"], "abc-123");
}

#[tokio::test]
async fn test_generator_used_when_nothing_found() {
    let store = Arc::new(TraceStore::new());
    let state = TraceMiddlewareState::new(store.clone()).with_generator(Generator::new(|| "FIXED".to_string()));
    let (router, buffer) = app(store, state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "FIXED");
    assert_eq!(buffer.with_message("handled")[0]["traceId"], "FIXED");
}

#[tokio::test]
async fn test_setup_failure_still_runs_handler() {
    let store = Arc::new(TraceStore::new());
    let state = TraceMiddlewareState::new(store.clone())
        .with_generator(Generator::new(|| panic!("generator unavailable")));
    let (router, buffer) = app(store, state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-trace-id").is_none());
    assert_eq!(body_json(response).await["traceId"], Value::Null);

    let entries = buffer.with_message("handled");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].get("traceId").is_none());
}

#[tokio::test]
async fn test_no_generation_leaves_request_unbound() {
    let store = Arc::new(TraceStore::new());
    let (router, buffer) = app(store.clone(), TraceMiddlewareState::new(store).without_generation());

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().get("x-trace-id").is_none());
    assert!(buffer.with_message("handled")[0].get("traceId").is_none());
}

#[tokio::test]
async fn test_disabled_store_passes_through() {
    let store = Arc::new(TraceStore::new());
    store.disable();
    let (router, buffer) = app(store.clone(), TraceMiddlewareState::new(store));

    let response = router
        .oneshot(Request::get("/").header("x-trace-id", "ignored").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().get("x-trace-id").is_none());
    assert!(buffer.with_message("handled")[0].get("traceId").is_none());
}

#[tokio::test]
async fn test_header_beats_query_body_and_params() {
    let store = Arc::new(TraceStore::new());
    let extractor = ExtractorConfig {
        header: vec!["x-trace-id".into()],
        query: vec!["traceId".into()],
        body: vec!["meta.traceId".into()],
        params: vec!["traceId".into()],
    };
    let (router, _) = app(store.clone(), TraceMiddlewareState::new(store).with_extractor(extractor));

    let response = router
        .oneshot(
            Request::get("/orders/from-params?traceId=from-query")
                .header("X-Trace-Id", "from-header")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["traceId"], "from-header");
}

#[tokio::test]
async fn test_query_then_params() {
    let store = Arc::new(TraceStore::new());
    let extractor = ExtractorConfig {
        header: vec!["x-trace-id".into()],
        query: vec!["traceId".into()],
        body: Vec::new(),
        params: vec!["traceId".into()],
    };
    let state = TraceMiddlewareState::new(store.clone())
        .with_extractor(extractor)
        .without_generation();
    let (router, _) = app(store, state);

    // Empty header falls through to the query string.
    let response = router
        .clone()
        .oneshot(
            Request::get("/orders/from-params?traceId=from-query")
                .header("x-trace-id", "")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["traceId"], "from-query");

    // Nothing earlier: the route param wins.
    let response = router
        .oneshot(Request::get("/orders/from-params").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["traceId"], "from-params");
}

#[tokio::test]
async fn test_body_field_and_body_preserved() {
    let store = Arc::new(TraceStore::new());
    let extractor = ExtractorConfig {
        header: vec!["x-trace-id".into()],
        query: Vec::new(),
        body: vec!["meta.traceId".into()],
        params: Vec::new(),
    };
    let state = TraceMiddlewareState::new(store.clone())
        .with_extractor(extractor)
        .without_generation();
    let (router, buffer) = app(store, state);

    let payload = json!({ "meta": { "traceId": "from-body" }, "qty": 2 }).to_string();
    let response = router
        .oneshot(
            Request::post("/orders")
                .header("content-type", "application/json")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["traceId"], "from-body");
    assert_eq!(body["body"]["qty"], 2);
    assert_eq!(buffer.with_message("posted")[0]["traceId"], "from-body");
}

#[tokio::test]
async fn test_numeric_body_value_is_ignored() {
    let store = Arc::new(TraceStore::new());
    let extractor = ExtractorConfig {
        header: Vec::new(),
        query: vec!["traceId".into()],
        body: vec!["traceId".into()],
        params: Vec::new(),
    };
    let state = TraceMiddlewareState::new(store.clone())
        .with_extractor(extractor)
        .without_generation();
    let (router, _) = app(store, state);

    let payload = json!({ "traceId": 12345 }).to_string();
    let response = router
        .oneshot(
            Request::post("/orders")
                .header("content-type", "application/json")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_json(response).await["traceId"], Value::Null);
}

#[tokio::test]
async fn test_non_utf8_header_is_skipped() {
    let store = Arc::new(TraceStore::new());
    let state = TraceMiddlewareState::new(store.clone()).with_generator(Generator::new(|| "FALLBACK".to_string()));
    let (router, _) = app(store, state);

    let response = router
        .oneshot(
            Request::get("/")
                .header("x-trace-id", axum::http::HeaderValue::from_bytes(&[0xC3, 0x28]).unwrap())
                .header("request-id", "from-fifth-default")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_json(response).await["traceId"], "from-fifth-default");
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_ids() {
    let store = Arc::new(TraceStore::new());
    let (router, buffer) = app(store.clone(), TraceMiddlewareState::new(store));

    let mut handles = Vec::new();
    for i in 0..20 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("req-{}", i);
            let response = router
                .oneshot(Request::get("/").header("x-request-id", id.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            (id, body_json(response).await)
        }));
    }

    for handle in handles {
        let (id, body) = handle.await.unwrap();
        assert_eq!(body["traceId"], id.as_str());
    }

    let mut ids: Vec<String> = buffer
        .with_message("handled")
        .iter()
        .map(|e| e["traceId"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_wildcard_segments_by_position() {
    let store = Arc::new(TraceStore::new());
    let extractor = ExtractorConfig {
        header: Vec::new(),
        query: Vec::new(),
        body: Vec::new(),
        params: vec!["1".into()],
    };
    let state = TraceMiddlewareState::new(store.clone())
        .with_extractor(extractor)
        .without_generation();
    let (router, _) = app(store, state);

    let response = router
        .oneshot(Request::get("/files/tenant-a/trace-77/report.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["traceId"], "trace-77");
}
