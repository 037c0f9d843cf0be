// crates/quill-store-sqlite/src/lib.rs
// ============================================================================
// Module: Quill SQLite Post Store
// Description: Durable PostStore backend using SQLite.
// Purpose: Provide persistent post storage for the Quill server and CLI.
// Dependencies: quill-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`quill_core::PostStore`] holding the
//! `posts` table under a versioned schema. Rows read back from disk are
//! treated as untrusted and fail closed when they do not decode.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqlitePostStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
