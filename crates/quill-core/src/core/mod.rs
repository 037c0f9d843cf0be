// crates/quill-core/src/core/mod.rs
// ============================================================================
// Module: Quill Core Types
// Description: Canonical post, paging, image, and time structures.
// Purpose: Provide stable, serializable types shared by every Quill surface.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types are the canonical source of truth for the post model. The HTTP
//! server, the CLI, and the storage backends all derive their payloads from
//! these definitions.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod image;
pub mod page;
pub mod post;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::PostId;
pub use identifiers::lenient_int;
pub use image::DEFAULT_MAX_IMAGE_BYTES;
pub use image::IMAGE_FILE_PREFIX;
pub use image::ImageKind;
pub use image::ImagePolicy;
pub use image::ImageUpload;
pub use image::image_file_name;
pub use image::stored_image_name;
pub use page::DEFAULT_MAX_PAGE_SIZE;
pub use page::DEFAULT_PAGE_SIZE;
pub use page::PageLimits;
pub use page::PageRequest;
pub use page::PostPage;
pub use post::CreatedPost;
pub use post::DEFAULT_AUTHOR;
pub use post::DEFAULT_MAX_CONTENT_BYTES;
pub use post::DEFAULT_MAX_TITLE_CHARS;
pub use post::DeletedPost;
pub use post::MIN_CONTENT_CHARS;
pub use post::MIN_TITLE_CHARS;
pub use post::NewPost;
pub use post::Post;
pub use post::PostChanges;
pub use post::PostDraft;
pub use post::PostLimits;
pub use post::PostSummary;
pub use post::UpdatedPost;
pub use post::ValidDraft;
pub use post::ValidationError;
pub use time::TimeError;
pub use time::Timestamp;
