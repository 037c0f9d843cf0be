// crates/quill-server/src/telemetry.rs
// ============================================================================
// Module: Quill Telemetry
// Description: Metric hooks for the legacy HTTP endpoints.
// Purpose: Provide request counters and latency buckets without hard deps.
// Dependencies: axum, serde
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for per-endpoint request
//! counters and latency histograms. Deployments plug in their own exporter by
//! implementing [`QuillMetrics`]; the server defaults to [`NoopMetrics`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use axum::http::Method;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for request histograms.
pub const QUILL_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Legacy endpoint classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuillEndpoint {
    /// `get_posts.php`.
    GetPosts,
    /// `get_post_by_id.php`.
    GetPostById,
    /// `read_post_by_id.php`.
    ReadPostById,
    /// `create_post.php`.
    CreatePost,
    /// `update_post.php`.
    UpdatePost,
    /// `delete_post.php`.
    DeletePost,
}

impl QuillEndpoint {
    /// Every endpoint, in mount order.
    pub const ALL: [Self; 6] = [
        Self::GetPosts,
        Self::GetPostById,
        Self::ReadPostById,
        Self::CreatePost,
        Self::UpdatePost,
        Self::DeletePost,
    ];

    /// Returns a stable label for the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetPosts => "get_posts",
            Self::GetPostById => "get_post_by_id",
            Self::ReadPostById => "read_post_by_id",
            Self::CreatePost => "create_post",
            Self::UpdatePost => "update_post",
            Self::DeletePost => "delete_post",
        }
    }

    /// Returns the file name the endpoint is mounted under.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::GetPosts => "get_posts.php",
            Self::GetPostById => "get_post_by_id.php",
            Self::ReadPostById => "read_post_by_id.php",
            Self::CreatePost => "create_post.php",
            Self::UpdatePost => "update_post.php",
            Self::DeletePost => "delete_post.php",
        }
    }

    /// Returns true when the endpoint serves `method` (besides `OPTIONS`).
    #[must_use]
    pub fn accepts(self, method: &Method) -> bool {
        match self {
            Self::GetPosts | Self::GetPostById | Self::ReadPostById => method == Method::GET,
            Self::CreatePost | Self::UpdatePost => method == Method::POST,
            Self::DeletePost => method == Method::DELETE || method == Method::POST,
        }
    }
}

/// HTTP method classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuillMethod {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `DELETE`.
    Delete,
    /// `OPTIONS`.
    Options,
    /// Any other method.
    Other,
}

impl QuillMethod {
    /// Classifies an HTTP method.
    #[must_use]
    pub fn from_http(method: &Method) -> Self {
        match *method {
            Method::GET => Self::Get,
            Method::POST => Self::Post,
            Method::DELETE => Self::Delete,
            Method::OPTIONS => Self::Options,
            _ => Self::Other,
        }
    }

    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Other => "other",
        }
    }
}

/// Request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuillOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl QuillOutcome {
    /// Classifies a response status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        if status < 400 { Self::Ok } else { Self::Error }
    }

    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Request metric event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuillMetricEvent {
    /// Endpoint that handled the request.
    pub endpoint: QuillEndpoint,
    /// Request method.
    pub method: QuillMethod,
    /// Request outcome.
    pub outcome: QuillOutcome,
    /// Response status code.
    pub status: u16,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for endpoint requests and latencies.
pub trait QuillMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: QuillMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: QuillMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are discarded.
pub struct NoopMetrics;

impl QuillMetrics for NoopMetrics {
    fn record_request(&self, _event: QuillMetricEvent) {}

    fn record_latency(&self, _event: QuillMetricEvent, _latency: Duration) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only label assertions."
    )]

    use axum::http::Method;
    use serde_json::Value;

    use super::QuillEndpoint;
    use super::QuillMethod;
    use super::QuillOutcome;

    fn serialized(value: impl serde::Serialize) -> String {
        match serde_json::to_value(value).unwrap() {
            Value::String(label) => label,
            other => panic!("expected string label, got {other}"),
        }
    }

    #[test]
    fn metric_labels_match_audit_field_values() {
        for endpoint in QuillEndpoint::ALL {
            assert_eq!(endpoint.as_str(), serialized(endpoint));
            assert_eq!(endpoint.file_name(), format!("{}.php", endpoint.as_str()));
        }
        for method in [
            QuillMethod::Get,
            QuillMethod::Post,
            QuillMethod::Delete,
            QuillMethod::Options,
            QuillMethod::Other,
        ] {
            assert_eq!(method.as_str(), serialized(method));
        }
        for outcome in [QuillOutcome::Ok, QuillOutcome::Error] {
            assert_eq!(outcome.as_str(), serialized(outcome));
        }
    }

    #[test]
    fn methods_and_statuses_are_classified() {
        assert_eq!(QuillMethod::from_http(&Method::PUT), QuillMethod::Other);
        assert_eq!(QuillMethod::from_http(&Method::DELETE).as_str(), "delete");
        assert_eq!(QuillOutcome::from_status(201).as_str(), "ok");
        assert_eq!(QuillOutcome::from_status(413).as_str(), "error");
    }

    #[test]
    fn delete_endpoint_accepts_post_and_delete_only() {
        assert!(QuillEndpoint::DeletePost.accepts(&Method::DELETE));
        assert!(QuillEndpoint::DeletePost.accepts(&Method::POST));
        assert!(!QuillEndpoint::DeletePost.accepts(&Method::GET));
        assert!(!QuillEndpoint::CreatePost.accepts(&Method::PUT));
    }
}
