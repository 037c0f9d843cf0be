// crates/quill-config/src/lib.rs
// ============================================================================
// Module: Quill Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for quill.toml semantics.
// Dependencies: quill-core, quill-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `quill-config` defines the canonical configuration model for the Quill
//! server and CLI. Loading is strict and fails closed on oversized files,
//! non UTF-8 input, or inconsistent values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
