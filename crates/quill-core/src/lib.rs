// crates/quill-core/src/lib.rs
// ============================================================================
// Module: Quill Core Library
// Description: Public API surface for the Quill blog core.
// Purpose: Expose post types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Quill core holds the blog post model, input validation, paging, image
//! acceptance rules, and the [`BlogService`] that sequences row and image
//! changes. It has no network or async dependencies; storage, image files,
//! and time are reached through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Clock;
pub use interfaces::ImageError;
pub use interfaces::ImageStore;
pub use interfaces::PostStore;
pub use interfaces::StoreError;
pub use runtime::BlogService;
pub use runtime::BlogServiceConfig;
pub use runtime::CleanupReport;
pub use runtime::CleanupWarning;
pub use runtime::FixedClock;
pub use runtime::InMemoryImageStore;
pub use runtime::InMemoryPostStore;
pub use runtime::Outcome;
pub use runtime::ServiceError;
pub use runtime::ServiceFailure;
pub use runtime::ServiceResult;
pub use runtime::SharedClock;
pub use runtime::SharedImageStore;
pub use runtime::SharedPostStore;
