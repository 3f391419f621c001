//! Span capture through the full middleware stack.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use futures_util::future::join_all;
use http_body_util::BodyExt;
use opentelemetry::trace::{SpanId, SpanKind, Status, TraceId};
use tower::ServiceExt;

use common::{attribute, test_server, SpanCapture};
use rolldice_otel::http::middleware::capture::capture_request;
use rolldice_otel::observability::TelemetryHandle;
use rolldice_otel::ServiceConfig;

#[tokio::test]
async fn test_submit_span_carries_body_and_query() {
    let capture = SpanCapture::install();

    let response = test_server()
        .router()
        .oneshot(
            Request::post("/api/submit?source=test&n=2")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"hello":"world"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 1);
    let span = &spans[0];

    assert_eq!(span.name, "POST /api/submit");
    assert_eq!(span.span_kind, SpanKind::Server);
    assert_eq!(
        attribute(span, "http.request.body").as_deref(),
        Some(r#"{"hello":"world"}"#)
    );
    assert_eq!(
        attribute(span, "http.request.query_params").as_deref(),
        Some("source=test&n=2")
    );
    assert_eq!(attribute(span, "http.route").as_deref(), Some("/api/submit"));
    assert_eq!(
        attribute(span, "http.response.status_code").as_deref(),
        Some("200")
    );
}

#[tokio::test]
async fn test_handler_sees_the_exact_body() {
    let _capture = SpanCapture::install();

    let response = test_server()
        .router()
        .oneshot(
            Request::post("/api/submit")
                .body(Body::from("plain text payload"))
                .unwrap(),
        )
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "Data received successfully");
    assert_eq!(json["receivedData"], "plain text payload");
}

#[tokio::test]
async fn test_bodyless_get_records_empty_attributes() {
    let capture = SpanCapture::install();

    let response = test_server()
        .router()
        .oneshot(Request::get("/rolldice").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(attribute(&spans[0], "http.request.body").as_deref(), Some(""));
    assert_eq!(
        attribute(&spans[0], "http.request.query_params").as_deref(),
        Some("")
    );
    assert_eq!(spans[0].name, "GET /rolldice");
}

#[tokio::test]
async fn test_player_route_uses_template_not_value() {
    let capture = SpanCapture::install();

    test_server()
        .router()
        .oneshot(Request::get("/rolldice/alice").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let spans = capture.request_spans();
    assert_eq!(spans[0].name, "GET /rolldice/{player}");
    assert_eq!(attribute(&spans[0], "url.path").as_deref(), Some("/rolldice/alice"));
}

#[tokio::test]
async fn test_handler_logs_join_the_request_span() {
    let capture = SpanCapture::install();

    test_server()
        .router()
        .oneshot(Request::get("/rolldice/bob").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let spans = capture.request_spans();
    let event = spans[0]
        .events
        .iter()
        .find(|e| e.name.contains("bob is rolling the dice"));
    assert!(event.is_some());
}

#[tokio::test]
async fn test_anonymous_roll_is_logged_in_the_span() {
    let capture = SpanCapture::install();

    let response = test_server()
        .router()
        .oneshot(Request::get("/rolldice").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let face = String::from_utf8(
        response.into_body().collect().await.unwrap().to_bytes().to_vec(),
    )
    .unwrap();

    let spans = capture.request_spans();
    let event = spans[0]
        .events
        .iter()
        .find(|e| e.name.starts_with("Anonymous player is rolling the dice"))
        .expect("anonymous roll event");
    assert_eq!(event.name, format!("Anonymous player is rolling the dice: {face}"));
    assert!(event
        .attributes
        .iter()
        .any(|kv| kv.key.as_str() == "player" && kv.value.to_string() == "anonymous"));
}

#[tokio::test]
async fn test_submit_payload_is_logged_in_the_span() {
    let capture = SpanCapture::install();

    test_server()
        .router()
        .oneshot(
            Request::post("/api/submit")
                .body(Body::from("score=9"))
                .unwrap(),
        )
        .await
        .unwrap();

    let spans = capture.request_spans();
    assert!(spans[0]
        .events
        .iter()
        .any(|e| e.name == "Received POST request with payload: score=9"));
}

#[tokio::test]
async fn test_caller_traceparent_becomes_the_parent() {
    let capture = SpanCapture::install();

    test_server()
        .router()
        .oneshot(
            Request::get("/rolldice")
                .header(
                    "traceparent",
                    "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(
        spans[0].span_context.trace_id(),
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
    );
    assert_eq!(
        spans[0].parent_span_id,
        SpanId::from_hex("00f067aa0ba902b7").unwrap()
    );
}

#[tokio::test]
async fn test_request_without_traceparent_starts_a_root() {
    let capture = SpanCapture::install();

    test_server()
        .router()
        .oneshot(Request::get("/rolldice").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let spans = capture.request_spans();
    assert_eq!(spans[0].parent_span_id, SpanId::INVALID);
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_capture() {
    let capture = SpanCapture::install();
    let router = test_server().router();

    let requests = (0..16).map(|i| {
        let router = router.clone();
        async move {
            let request = Request::post(format!("/api/submit?i={i}"))
                .body(Body::from(format!("payload-{i}")))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }
    });
    let statuses = join_all(requests).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::OK));

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 16);
    for span in &spans {
        let body = attribute(span, "http.request.body").unwrap();
        let query = attribute(span, "http.request.query_params").unwrap();
        let i = body.strip_prefix("payload-").unwrap();
        assert_eq!(query, format!("i={i}"));
    }
}

#[tokio::test]
async fn test_server_error_marks_span_failed() {
    let capture = SpanCapture::install();
    let config = ServiceConfig::default();
    let router = Router::new()
        .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .layer(middleware::from_fn_with_state(
            TelemetryHandle::detached(&config),
            capture_request,
        ));

    let response = router
        .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let spans = capture.request_spans();
    assert!(matches!(spans[0].status, Status::Error { .. }));
    assert_eq!(
        attribute(&spans[0], "http.response.status_code").as_deref(),
        Some("500")
    );
}

#[tokio::test]
async fn test_oversized_body_marks_span_failed() {
    let capture = SpanCapture::install();
    let mut config = ServiceConfig::default();
    config.limits.max_body_size = 4;

    let response = common::test_server_with(config)
        .router()
        .oneshot(Request::post("/api/submit").body(Body::from("too long")).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 1);
    assert!(matches!(spans[0].status, Status::Error { .. }));
    assert_eq!(
        attribute(&spans[0], "http.response.status_code").as_deref(),
        Some("413")
    );
}

#[tokio::test]
async fn test_cancelled_request_still_ends_span() {
    let capture = SpanCapture::install();
    let config = ServiceConfig::default();
    let router = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        )
        .layer(middleware::from_fn_with_state(
            TelemetryHandle::detached(&config),
            capture_request,
        ));

    let request = Request::get("/slow?x=1").body(Body::empty()).unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(20), router.oneshot(request)).await;
    assert!(outcome.is_err());

    let spans = capture.request_spans();
    assert_eq!(spans.len(), 1);
    assert!(matches!(spans[0].status, Status::Error { .. }));
    assert_eq!(
        attribute(&spans[0], "http.request.query_params").as_deref(),
        Some("x=1")
    );
    assert_eq!(
        attribute(&spans[0], "exception.message").as_deref(),
        Some("request cancelled before completion")
    );
}
