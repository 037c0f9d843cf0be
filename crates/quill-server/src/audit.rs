// crates/quill-server/src/audit.rs
// ============================================================================
// Module: Quill Audit Logging
// Description: Structured request and diagnostic events for the HTTP surface.
// Purpose: Emit JSON-line logs without a global logger.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines the audit event payloads and sinks used by the server.
//! Request events carry labels and sizes only. Diagnostic events carry the
//! internal detail that responses hide, such as store failures behind
//! `Database error occurred` and image removals that did not succeed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::telemetry::QuillEndpoint;
use crate::telemetry::QuillMethod;
use crate::telemetry::QuillOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct QuillAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Endpoint that handled the request.
    pub endpoint: QuillEndpoint,
    /// Request method.
    pub method: QuillMethod,
    /// Response status code.
    pub status: u16,
    /// Request outcome.
    pub outcome: QuillOutcome,
    /// Post identifier when the request resolved one.
    pub post_id: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Declared request body size in bytes.
    pub request_bytes: u64,
    /// Handling time in milliseconds.
    pub latency_ms: u64,
}

/// Inputs required to construct a request audit event.
pub struct QuillAuditEventParams {
    /// Endpoint that handled the request.
    pub endpoint: QuillEndpoint,
    /// Request method.
    pub method: QuillMethod,
    /// Response status code.
    pub status: u16,
    /// Post identifier when the request resolved one.
    pub post_id: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Declared request body size in bytes.
    pub request_bytes: u64,
    /// Handling time in milliseconds.
    pub latency_ms: u64,
}

impl QuillAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: QuillAuditEventParams) -> Self {
        Self {
            event: "quill_request",
            timestamp_ms: now_millis(),
            endpoint: params.endpoint,
            method: params.method,
            status: params.status,
            outcome: QuillOutcome::from_status(params.status),
            post_id: params.post_id,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            latency_ms: params.latency_ms,
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Operation succeeded with a side effect left behind.
    Warn,
    /// Operation failed internally.
    Error,
}

/// Diagnostic event payload.
#[derive(Debug, Clone, Serialize)]
pub struct QuillDiagnosticEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: DiagnosticLevel,
    /// Endpoint that observed the failure.
    pub endpoint: QuillEndpoint,
    /// Failure detail.
    pub message: String,
}

impl QuillDiagnosticEvent {
    /// Creates a new diagnostic event with a consistent timestamp.
    #[must_use]
    pub fn new(level: DiagnosticLevel, endpoint: QuillEndpoint, message: impl Into<String>) -> Self {
        Self {
            event: "quill_diagnostic",
            timestamp_ms: now_millis(),
            level,
            endpoint,
            message: message.into(),
        }
    }
}

/// Returns the wall clock in milliseconds since the unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for request and diagnostic events.
pub trait QuillAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &QuillAuditEvent);

    /// Record a diagnostic event.
    fn record_diagnostic(&self, _event: &QuillDiagnosticEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl QuillAuditSink for StderrAuditSink {
    fn record(&self, event: &QuillAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_diagnostic(&self, event: &QuillDiagnosticEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl QuillAuditSink for FileAuditSink {
    fn record(&self, event: &QuillAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_diagnostic(&self, event: &QuillDiagnosticEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl QuillAuditSink for NoopAuditSink {
    fn record(&self, _event: &QuillAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
