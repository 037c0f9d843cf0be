// crates/quill-server/tests/common/mod.rs
// ============================================================================
// Module: Common Server Test Fixtures
// Description: In-process router harness and request builders.
// Purpose: Drive the HTTP surface without binding a socket.
// Dependencies: quill-server, quill-core, tower, http-body-util
// ============================================================================

//! ## Overview
//! Builds a [`BlogServer`] over in-memory backends with a fixed clock and
//! capturing audit and metrics sinks, and provides request builders for the
//! JSON, form, and multipart bodies the endpoints accept.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only fixtures panic on setup failure."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use http_body_util::BodyExt;
use quill_config::QuillConfig;
use quill_core::BlogService;
use quill_core::FixedClock;
use quill_core::InMemoryImageStore;
use quill_core::InMemoryPostStore;
use quill_core::NewPost;
use quill_core::PostId;
use quill_core::PostStore;
use quill_core::SharedClock;
use quill_core::SharedImageStore;
use quill_core::SharedPostStore;
use quill_core::Timestamp;
use quill_server::BlogServer;
use quill_server::QuillAuditEvent;
use quill_server::QuillAuditSink;
use quill_server::QuillDiagnosticEvent;
use quill_server::QuillMetricEvent;
use quill_server::QuillMetrics;
use serde_json::Value;
use tower::ServiceExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Multipart boundary used by [`multipart`].
pub const BOUNDARY: &str = "quill-test-boundary";

/// Smallest byte sequence sniffed as PNG.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Fixed clock start (2023-11-14 22:13:20 UTC).
pub const START: i64 = 1_700_000_000;

// ============================================================================
// SECTION: Capturing Sinks
// ============================================================================

/// Audit sink that keeps every event.
#[derive(Default)]
pub struct CaptureAudit {
    /// Request events.
    pub requests: Mutex<Vec<QuillAuditEvent>>,
    /// Diagnostic events.
    pub diagnostics: Mutex<Vec<QuillDiagnosticEvent>>,
}

impl QuillAuditSink for CaptureAudit {
    fn record(&self, event: &QuillAuditEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_diagnostic(&self, event: &QuillDiagnosticEvent) {
        self.diagnostics.lock().unwrap().push(event.clone());
    }
}

/// Metrics sink that keeps every event.
#[derive(Default)]
pub struct CaptureMetrics {
    /// Request counter events.
    pub requests: Mutex<Vec<QuillMetricEvent>>,
    /// Latency observations.
    pub latencies: Mutex<Vec<(QuillMetricEvent, Duration)>>,
}

impl QuillMetrics for CaptureMetrics {
    fn record_request(&self, event: QuillMetricEvent) {
        self.requests.lock().unwrap().push(event);
    }

    fn record_latency(&self, event: QuillMetricEvent, latency: Duration) {
        self.latencies.lock().unwrap().push((event, latency));
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Router plus handles on every backend behind it.
pub struct TestServer {
    /// Router under test.
    pub router: Router,
    /// Post rows.
    pub posts: InMemoryPostStore,
    /// Stored images.
    pub images: InMemoryImageStore,
    /// Service clock.
    pub clock: FixedClock,
    /// Captured audit events.
    pub audit: Arc<CaptureAudit>,
    /// Captured metric events.
    pub metrics: Arc<CaptureMetrics>,
}

/// Returns a timestamp at the given unix seconds.
pub fn at(seconds: i64) -> Timestamp {
    Timestamp::from_unix_seconds(seconds).unwrap()
}

/// Builds a test server with default configuration.
pub fn test_server() -> TestServer {
    test_server_with(QuillConfig::default())
}

/// Builds a test server with the given configuration.
pub fn test_server_with(config: QuillConfig) -> TestServer {
    let posts = InMemoryPostStore::new();
    let images = InMemoryImageStore::new(config.uploads.public_prefix.clone());
    test_server_over(config, SharedPostStore::from_store(posts.clone()), posts, images)
}

/// Builds a test server whose service uses `store`; `posts` is kept as the
/// harness handle for seeding.
pub fn test_server_over(
    config: QuillConfig,
    store: SharedPostStore,
    posts: InMemoryPostStore,
    images: InMemoryImageStore,
) -> TestServer {
    let clock = FixedClock::new(at(START));
    let service = BlogService::new(
        store,
        SharedImageStore::from_store(images.clone()),
        SharedClock::from_clock(clock.clone()),
        config.service_config(),
    );
    let audit = Arc::new(CaptureAudit::default());
    let metrics = Arc::new(CaptureMetrics::default());
    let server = BlogServer::with_service(config, service)
        .unwrap()
        .with_audit_sink(audit.clone())
        .with_metrics(metrics.clone());
    TestServer {
        router: server.router(),
        posts,
        images,
        clock,
        audit,
        metrics,
    }
}

impl TestServer {
    /// Inserts a post directly into the store.
    pub fn seed(&self, title: &str, created_at: i64, image_url: Option<&str>) -> PostId {
        self.posts
            .insert(&NewPost {
                title: title.to_string(),
                content: format!("{title} body text"),
                image_url: image_url.map(str::to_string),
                author: "Admin".to_string(),
                created_at: at(created_at),
            })
            .unwrap()
    }

    /// Sends a request and returns status, headers, and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    /// Sends a request and parses the body as JSON.
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = serde_json::from_slice(&body)
            .unwrap_or_else(|err| panic!("body is not json ({err}): {body:?}"));
        (status, value)
    }
}

// ============================================================================
// SECTION: Request Builders
// ============================================================================

/// Builds a bodiless request.
pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

/// Builds a GET request.
pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri)
}

/// Builds a request with a JSON body.
pub fn json(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a url-encoded form POST.
pub fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a multipart POST with text fields and an optional `image` file.
pub fn multipart(uri: &str, fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}
