// crates/quill-core/src/core/post.rs
// ============================================================================
// Module: Quill Post Model
// Description: Post records, store payloads, drafts, and response projections.
// Purpose: Define the single source of truth for post shape and input rules.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Post`] is one row of the `posts` table. User input arrives as a
//! [`PostDraft`] and must pass [`PostDraft::validate`] before it reaches a
//! store. Response projections ([`CreatedPost`], [`UpdatedPost`],
//! [`DeletedPost`], [`PostSummary`]) mirror the JSON bodies that clients of
//! the legacy endpoints already consume.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::PostId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum title length in characters after trimming.
pub const MIN_TITLE_CHARS: usize = 3;
/// Minimum content length in characters after trimming.
pub const MIN_CONTENT_CHARS: usize = 10;
/// Default maximum title length in characters.
pub const DEFAULT_MAX_TITLE_CHARS: usize = 255;
/// Default maximum content size in bytes.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 1024 * 1024;
/// Author recorded on posts when the host does not configure one.
pub const DEFAULT_AUTHOR: &str = "Admin";

// ============================================================================
// SECTION: Records
// ============================================================================

/// Persisted blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned identifier.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Public relative path of the attached image.
    pub image_url: Option<String>,
    /// Author label.
    pub author: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time, absent until the first edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Insert payload for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Validated title.
    pub title: String,
    /// Validated content.
    pub content: String,
    /// Public relative path of the stored image.
    pub image_url: Option<String>,
    /// Author label.
    pub author: String,
    /// Creation time.
    pub created_at: Timestamp,
}

impl NewPost {
    /// Materializes the stored record once the store assigns an id.
    #[must_use]
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            author: self.author,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Update payload for an existing post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    /// Validated title.
    pub title: String,
    /// Validated content.
    pub content: String,
    /// Image path to persist (new upload or the retained previous one).
    pub image_url: Option<String>,
    /// Update time.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Drafts and Validation
// ============================================================================

/// Size limits applied to post input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostLimits {
    /// Maximum title length in characters.
    pub max_title_chars: usize,
    /// Maximum content size in bytes.
    pub max_content_bytes: usize,
}

impl Default for PostLimits {
    fn default() -> Self {
        Self {
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }
}

/// Unvalidated title/content pair from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    /// Raw title.
    pub title: String,
    /// Raw content.
    pub content: String,
}

impl PostDraft {
    /// Creates a draft from raw client input.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trims and validates the draft.
    ///
    /// Checks run in order (title minimum, content minimum, title maximum,
    /// content maximum) and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first violated rule.
    pub fn validate(&self, limits: &PostLimits) -> Result<ValidDraft, ValidationError> {
        let title = self.title.trim();
        let content = self.content.trim();
        let title_chars = title.chars().count();
        if title_chars < MIN_TITLE_CHARS {
            return Err(ValidationError::TitleTooShort);
        }
        if content.chars().count() < MIN_CONTENT_CHARS {
            return Err(ValidationError::ContentTooShort);
        }
        if title_chars > limits.max_title_chars {
            return Err(ValidationError::TitleTooLong {
                max_chars: limits.max_title_chars,
            });
        }
        if content.len() > limits.max_content_bytes {
            return Err(ValidationError::ContentTooLong {
                max_bytes: limits.max_content_bytes,
            });
        }
        Ok(ValidDraft {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

/// Trimmed draft that passed validation.
///
/// # Invariants
/// - Only constructed by [`PostDraft::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    /// Trimmed title.
    title: String,
    /// Trimmed content.
    content: String,
}

impl ValidDraft {
    /// Returns the trimmed title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the trimmed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Splits the draft into owned title and content.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.title, self.content)
    }
}

/// Post input validation failures.
///
/// Display strings are returned to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title shorter than [`MIN_TITLE_CHARS`].
    #[error("Title is required and must be at least 3 characters")]
    TitleTooShort,
    /// Content shorter than [`MIN_CONTENT_CHARS`].
    #[error("Content is required and must be at least 10 characters")]
    ContentTooShort,
    /// Title longer than the configured limit.
    #[error("Title must not exceed {max_chars} characters")]
    TitleTooLong {
        /// Configured maximum.
        max_chars: usize,
    },
    /// Content larger than the configured limit.
    #[error("Content must not exceed {max_bytes} bytes")]
    ContentTooLong {
        /// Configured maximum.
        max_bytes: usize,
    },
}

// ============================================================================
// SECTION: Response Projections
// ============================================================================

/// Response body fragment for a created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    /// New post identifier.
    pub id: PostId,
    /// Stored title.
    pub title: String,
    /// Stored content.
    pub content: String,
    /// Stored image path.
    pub image_url: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Response body fragment for an updated post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedPost {
    /// Updated post identifier.
    pub id: PostId,
    /// Stored title.
    pub title: String,
    /// Stored content.
    pub content: String,
    /// Stored image path.
    pub image_url: Option<String>,
    /// Update time.
    pub updated_at: Timestamp,
}

/// Response body fragment for a deleted post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPost {
    /// Deleted post identifier.
    pub id: PostId,
}

/// Bare post body served by the read-only detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Post identifier.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Image path; serialized as `null` when absent.
    pub image_url: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at,
        }
    }
}
