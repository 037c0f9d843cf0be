// crates/quill-core/src/core/time.rs
// ============================================================================
// Module: Quill Time Model
// Description: Canonical second-precision UTC timestamps for posts.
// Purpose: Keep one text form for JSON payloads and database rows.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Post timestamps use the `YYYY-MM-DD HH:MM:SS` text form (UTC) both on the
//! wire and in storage. The form sorts lexicographically in chronological
//! order, which the stores rely on for listing.
//!
//! The core never reads the wall clock. Hosts supply time through the
//! [`crate::interfaces::Clock`] interface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical text format for post timestamps.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp with second precision.
///
/// # Invariants
/// - Sub-second components are always zero.
/// - The offset is always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// `1970-01-01 00:00:00` UTC.
    pub const UNIX_EPOCH: Self = Self(OffsetDateTime::UNIX_EPOCH);

    /// Builds a timestamp from unix epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when the value is outside the
    /// representable calendar range.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimeError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| TimeError::OutOfRange(seconds))
    }

    /// Parses the canonical `YYYY-MM-DD HH:MM:SS` text form.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Parse`] when the input is not in canonical form.
    pub fn parse(input: &str) -> Result<Self, TimeError> {
        PrimitiveDateTime::parse(input, TIMESTAMP_FORMAT)
            .map(|value| Self(value.assume_utc()))
            .map_err(|err| TimeError::Parse(format!("{input}: {err}")))
    }

    /// Returns the timestamp as unix epoch seconds.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the canonical text form.
    #[must_use]
    pub fn to_canonical_string(self) -> String {
        // Formatting cannot fail for in-range values with a fixed format.
        self.0.format(TIMESTAMP_FORMAT).unwrap_or_default()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// Unix seconds outside the supported calendar range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),
    /// Text did not match the canonical format.
    #[error("invalid timestamp: {0}")]
    Parse(String),
}
