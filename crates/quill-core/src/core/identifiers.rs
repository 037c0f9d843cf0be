// crates/quill-core/src/core/identifiers.rs
// ============================================================================
// Module: Quill Identifiers
// Description: Strongly typed post identifiers.
// Purpose: Keep row ids positive and parse request ids the way clients send them.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Post identifiers are positive 64-bit integers assigned by the store. Request
//! inputs arrive as loosely typed strings (query parameters, form fields, JSON
//! strings), so [`lenient_int`] applies integer-cast semantics: leading digits
//! are taken and trailing garbage is ignored. [`PostId::parse_lenient`] treats
//! anything that does not cast to a positive value as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Error as _;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Post identifier assigned by the post store.
///
/// # Invariants
/// - The wrapped value is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    /// Creates a post identifier from a raw integer.
    ///
    /// Returns `None` when the value is zero or negative.
    #[must_use]
    pub const fn from_raw(value: i64) -> Option<Self> {
        if value > 0 { Some(Self(value)) } else { None }
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parses a request-supplied identifier with integer-cast semantics.
    ///
    /// Follows [`lenient_int`]; inputs that cast to zero or a negative value
    /// yield `None`.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Option<Self> {
        Self::from_raw(lenient_int(input))
    }
}

/// Casts request text to an integer the way loosely typed clients expect.
///
/// Surrounding whitespace is ignored, one sign is accepted, and parsing stops
/// at the first non-digit. Input without leading digits reads as zero and
/// overflow saturates.
#[must_use]
pub fn lenient_int(input: &str) -> i64 {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1 ..]),
        Some(b'+') => (false, &trimmed[1 ..]),
        _ => (false, trimmed),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, digit| acc.saturating_mul(10).saturating_add(i64::from(digit - b'0')));
    if negative { -value } else { value }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Self::from_raw(value).ok_or_else(|| D::Error::custom("post id must be positive"))
    }
}

