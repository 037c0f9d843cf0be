// crates/quill-core/tests/post_validation.rs
// ============================================================================
// Module: Post Validation Tests
// Description: Tests for draft trimming, limits, and id parsing.
// ============================================================================
//! ## Overview
//! Validates the ordered draft rules and lenient request id parsing.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use proptest::prelude::*;
use quill_core::PostDraft;
use quill_core::PostId;
use quill_core::PostLimits;
use quill_core::ValidationError;
use quill_core::lenient_int;

// ============================================================================
// SECTION: Draft Validation
// ============================================================================

/// Tests surrounding whitespace is trimmed before storage.
#[test]
fn test_validate_trims_title_and_content() {
    let draft = PostDraft::new("  Hello  ", "\n  Some body text  \t");
    let valid = draft.validate(&PostLimits::default()).unwrap();
    assert_eq!(valid.title(), "Hello");
    assert_eq!(valid.content(), "Some body text");
}

/// Tests the minimum title rule uses the trimmed length.
#[test]
fn test_short_title_rejected_after_trim() {
    let draft = PostDraft::new("  ab  ", "long enough content");
    let err = draft.validate(&PostLimits::default()).unwrap_err();
    assert_eq!(err, ValidationError::TitleTooShort);
    assert_eq!(err.to_string(), "Title is required and must be at least 3 characters");
}

/// Tests the title rule wins when both fields are short.
#[test]
fn test_title_checked_before_content() {
    let err = PostDraft::new("", "").validate(&PostLimits::default()).unwrap_err();
    assert_eq!(err, ValidationError::TitleTooShort);
}

/// Tests short content is rejected with the legacy message.
#[test]
fn test_short_content_rejected() {
    let err = PostDraft::new("Title", "too short").validate(&PostLimits::default()).unwrap_err();
    assert_eq!(err.to_string(), "Content is required and must be at least 10 characters");
}

/// Tests minimum lengths count characters, not bytes.
#[test]
fn test_minimums_count_characters() {
    let err = PostDraft::new("éé", "ééééééééééé").validate(&PostLimits::default()).unwrap_err();
    assert_eq!(err, ValidationError::TitleTooShort);
    let err = PostDraft::new("ééé", "ééééééééé").validate(&PostLimits::default()).unwrap_err();
    assert_eq!(err, ValidationError::ContentTooShort);
    assert!(PostDraft::new("ééé", "éééééééééé").validate(&PostLimits::default()).is_ok());
}

/// Tests configured maximums are enforced and rendered.
#[test]
fn test_maximums_enforced() {
    let limits = PostLimits {
        max_title_chars: 5,
        max_content_bytes: 12,
    };
    let err = PostDraft::new("abcdef", "0123456789").validate(&limits).unwrap_err();
    assert_eq!(err.to_string(), "Title must not exceed 5 characters");
    let err = PostDraft::new("abc", "0123456789abc").validate(&limits).unwrap_err();
    assert_eq!(err.to_string(), "Content must not exceed 12 bytes");
    assert!(PostDraft::new("abcde", "0123456789ab").validate(&limits).is_ok());
}

// ============================================================================
// SECTION: Lenient Id Parsing
// ============================================================================

/// Tests integer-cast style id parsing.
#[test]
fn test_parse_lenient_ids() {
    assert_eq!(PostId::parse_lenient("42").map(PostId::get), Some(42));
    assert_eq!(PostId::parse_lenient(" 7 ").map(PostId::get), Some(7));
    assert_eq!(PostId::parse_lenient("12abc").map(PostId::get), Some(12));
    assert_eq!(PostId::parse_lenient("+3").map(PostId::get), Some(3));
    assert_eq!(PostId::parse_lenient(""), None);
    assert_eq!(PostId::parse_lenient("abc"), None);
    assert_eq!(PostId::parse_lenient("0"), None);
    assert_eq!(PostId::parse_lenient("-5"), None);
    assert_eq!(PostId::parse_lenient("99999999999999999999").map(PostId::get), Some(i64::MAX));
}

/// Tests request integers take leading digits and saturate.
#[test]
fn test_lenient_int_reads_leading_digits() {
    assert_eq!(lenient_int("3"), 3);
    assert_eq!(lenient_int(" 42abc"), 42);
    assert_eq!(lenient_int("-5"), -5);
    assert_eq!(lenient_int("+7"), 7);
    assert_eq!(lenient_int("abc"), 0);
    assert_eq!(lenient_int(""), 0);
    assert_eq!(lenient_int("99999999999999999999999"), i64::MAX);
    assert_eq!(lenient_int("-99999999999999999999999"), -i64::MAX);
}

/// Tests ids serialize as numbers and reject non-positive input.
#[test]
fn test_post_id_serde() {
    let id = PostId::from_raw(9).unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    assert!(serde_json::from_str::<PostId>("0").is_err());
    assert_eq!(serde_json::from_str::<PostId>("11").unwrap().get(), 11);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    /// Accepted drafts are always trimmed and within limits.
    #[test]
    fn prop_accepted_drafts_respect_limits(title in ".{0,40}", content in ".{0,80}") {
        let limits = PostLimits {
            max_title_chars: 20,
            max_content_bytes: 60,
        };
        if let Ok(valid) = PostDraft::new(title, content).validate(&limits) {
            prop_assert_eq!(valid.title(), valid.title().trim());
            prop_assert_eq!(valid.content(), valid.content().trim());
            prop_assert!(valid.title().chars().count() >= 3);
            prop_assert!(valid.title().chars().count() <= 20);
            prop_assert!(valid.content().chars().count() >= 10);
            prop_assert!(valid.content().len() <= 60);
        }
    }

    /// Any positive integer round-trips through lenient parsing.
    #[test]
    fn prop_positive_ids_parse(value in 1_i64 .. i64::MAX) {
        prop_assert_eq!(PostId::parse_lenient(&value.to_string()).map(PostId::get), Some(value));
    }
}
