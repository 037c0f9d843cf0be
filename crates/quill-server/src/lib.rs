// crates/quill-server/src/lib.rs
// ============================================================================
// Module: Quill Server
// Description: HTTP surface for the Quill blog backend.
// Purpose: Serve the legacy post endpoints, uploads, and static images.
// Dependencies: quill-config, quill-core, quill-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! Quill server mounts the legacy `.php` post endpoints over
//! [`quill_core::BlogService`], stores uploads on the local filesystem, and
//! emits JSON-line audit events. All post semantics live in `quill-core`; this
//! crate only decodes requests and shapes responses.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
mod endpoints;
pub mod server;
pub mod telemetry;
pub mod uploads;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DiagnosticLevel;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::QuillAuditEvent;
pub use audit::QuillAuditSink;
pub use audit::QuillDiagnosticEvent;
pub use audit::StderrAuditSink;
pub use server::BlogServer;
pub use server::ServerError;
pub use server::build_service;
pub use telemetry::NoopMetrics;
pub use telemetry::QUILL_LATENCY_BUCKETS_MS;
pub use telemetry::QuillEndpoint;
pub use telemetry::QuillMethod;
pub use telemetry::QuillMetricEvent;
pub use telemetry::QuillMetrics;
pub use telemetry::QuillOutcome;
pub use uploads::FsImageStore;
pub use uploads::SystemClock;
