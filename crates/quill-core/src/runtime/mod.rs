// crates/quill-core/src/runtime/mod.rs
// ============================================================================
// Module: Quill Runtime
// Description: Blog service orchestration and in-memory backends.
// Purpose: Execute post operations against the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the post lifecycle. Every host (HTTP server,
//! CLI) calls into the same [`BlogService`] so image ordering rules hold no
//! matter which surface triggered the change.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use service::BlogService;
pub use service::BlogServiceConfig;
pub use service::CleanupReport;
pub use service::CleanupWarning;
pub use service::Outcome;
pub use service::ServiceError;
pub use service::ServiceFailure;
pub use service::ServiceResult;
pub use store::FixedClock;
pub use store::InMemoryImageStore;
pub use store::InMemoryPostStore;
pub use store::SharedClock;
pub use store::SharedImageStore;
pub use store::SharedPostStore;
