// crates/quill-core/src/interfaces/mod.rs
// ============================================================================
// Module: Quill Interfaces
// Description: Backend-agnostic interfaces for post storage, images, and time.
// Purpose: Define the contract surfaces used by the blog service.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the blog service independent of any database, filesystem,
//! or wall clock. Implementations are synchronous; async hosts are expected
//! to shift calls onto a blocking-capable context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::PostId;
use crate::core::image::ImageKind;
use crate::core::image::ImageUpload;
use crate::core::post::NewPost;
use crate::core::post::Post;
use crate::core::post::PostChanges;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Post Store
// ============================================================================

/// Post store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("post store io error: {0}")]
    Io(String),
    /// Stored data fails integrity checks.
    #[error("post store corruption: {0}")]
    Corrupt(String),
    /// Stored data version is incompatible.
    #[error("post store version mismatch: {0}")]
    VersionMismatch(String),
    /// Request or data is invalid for the store.
    #[error("post store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("post store error: {0}")]
    Store(String),
}

/// Persistence for posts.
///
/// Listing order is `created_at` descending with ties broken by `id`
/// descending.
pub trait PostStore {
    /// Returns the total number of posts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Returns up to `limit` posts after skipping `offset` in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list(&self, offset: u64, limit: u32) -> Result<Vec<Post>, StoreError>;

    /// Loads a post by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// Inserts a post and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert(&self, post: &NewPost) -> Result<PostId, StoreError>;

    /// Applies changes to an existing post. Returns false when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update(&self, id: PostId, changes: &PostChanges) -> Result<bool, StoreError>;

    /// Deletes a post. Returns false when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete(&self, id: PostId) -> Result<bool, StoreError>;
}

// ============================================================================
// SECTION: Image Store
// ============================================================================

/// Image acceptance and storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Upload content or path was rejected.
    #[error("{0}")]
    Invalid(String),
    /// Upload exceeds the size ceiling.
    #[error("File size must not exceed {max_mib}MB")]
    TooLarge {
        /// Ceiling rendered in MiB.
        max_mib: u64,
    },
    /// Storage backend failed.
    #[error("image store io error: {0}")]
    Io(String),
}

/// Storage for accepted post images.
pub trait ImageStore {
    /// Persists an accepted upload and returns its public relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] when the image cannot be stored.
    fn save(
        &self,
        upload: &ImageUpload,
        kind: ImageKind,
        now: Timestamp,
    ) -> Result<String, ImageError>;

    /// Removes a stored image by the path previously returned from
    /// [`ImageStore::save`]. Missing images are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Invalid`] for paths outside the store and
    /// [`ImageError::Io`] when removal fails.
    fn delete(&self, public_path: &str) -> Result<(), ImageError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
