// crates/quill-cli/src/lib.rs
// ============================================================================
// Module: Quill CLI Library
// Description: Shared helpers for the `quill` binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Library half of the `quill` command line tool. The binary lives in
//! `main.rs`; this crate only carries the [`t!`] message catalog.

pub mod i18n;
