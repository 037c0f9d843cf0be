// crates/quill-core/src/core/image.rs
// ============================================================================
// Module: Quill Image Policy
// Description: Upload inspection, content sniffing, and stored file naming.
// Purpose: Decide which uploads may be persisted and under which name.
// Dependencies: serde, crate::interfaces
// ============================================================================

//! ## Overview
//! Uploaded images are accepted by content, not by the client-declared MIME
//! type. [`ImageKind::sniff`] inspects magic bytes, [`ImagePolicy::inspect`]
//! applies the size ceiling, and [`image_file_name`] derives a collision
//! resistant file name that can never escape the upload directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::ImageError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum upload size in bytes (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Prefix applied to every generated image file name.
pub const IMAGE_FILE_PREFIX: &str = "post_";

/// Bytes per MiB for human-readable limit messages.
const BYTES_PER_MIB: u64 = 1024 * 1024;

/// JPEG start-of-image marker.
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
/// PNG file signature.
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// GIF 87a signature.
const GIF87_MAGIC: &[u8] = b"GIF87a";
/// GIF 89a signature.
const GIF89_MAGIC: &[u8] = b"GIF89a";
/// RIFF container tag used by WebP.
const RIFF_MAGIC: &[u8] = b"RIFF";
/// WebP form type at offset 8.
const WEBP_MAGIC: &[u8] = b"WEBP";

// ============================================================================
// SECTION: Image Kind
// ============================================================================

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// JPEG image.
    Jpeg,
    /// PNG image.
    Png,
    /// GIF image.
    Gif,
    /// WebP image.
    Webp,
}

impl ImageKind {
    /// Detects the image kind from leading content bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(JPEG_MAGIC) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(PNG_MAGIC) {
            return Some(Self::Png);
        }
        if bytes.starts_with(GIF87_MAGIC) || bytes.starts_with(GIF89_MAGIC) {
            return Some(Self::Gif);
        }
        if bytes.len() >= 12 && bytes.starts_with(RIFF_MAGIC) && &bytes[8 .. 12] == WEBP_MAGIC {
            return Some(Self::Webp);
        }
        None
    }

    /// Returns the MIME type served for this kind.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// Returns the extension used when the client name offers none.
    #[must_use]
    pub const fn canonical_extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Returns true when `ext` (case-insensitive) is a usual extension for this kind.
    #[must_use]
    pub fn accepts_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            Self::Jpeg => matches!(ext.as_str(), "jpg" | "jpeg"),
            Self::Png => ext == "png",
            Self::Gif => ext == "gif",
            Self::Webp => ext == "webp",
        }
    }
}

// ============================================================================
// SECTION: Upload
// ============================================================================

/// Image file received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Creates an upload from a client file name and content.
    #[must_use]
    pub const fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            bytes,
        }
    }

    /// Returns true when the form field carried no file selection.
    #[must_use]
    pub fn is_empty_selection(&self) -> bool {
        self.bytes.is_empty() && self.file_name.as_deref().is_none_or(str::is_empty)
    }

    /// Returns the upload size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }

    /// Returns true when the upload has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Acceptance rules for uploaded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    /// Largest accepted upload in bytes.
    pub max_bytes: u64,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ImagePolicy {
    /// Checks size and content of an upload.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::TooLarge`] when the upload exceeds the ceiling and
    /// [`ImageError::Invalid`] when the content is not an accepted image.
    pub fn inspect(&self, upload: &ImageUpload) -> Result<ImageKind, ImageError> {
        if upload.len() > self.max_bytes {
            return Err(ImageError::TooLarge {
                max_mib: self.max_bytes.saturating_add(BYTES_PER_MIB / 2) / BYTES_PER_MIB,
            });
        }
        ImageKind::sniff(&upload.bytes).ok_or_else(|| {
            ImageError::Invalid("Invalid image format. Allowed: JPEG, PNG, GIF, WebP".to_string())
        })
    }
}

// ============================================================================
// SECTION: File Naming
// ============================================================================

/// Builds the stored file name for an accepted upload.
///
/// The client extension is kept (lowercased) only when it matches the sniffed
/// kind. The result contains only ASCII alphanumerics, `_`, and one `.`.
#[must_use]
pub fn image_file_name(
    unix_seconds: i64,
    nonce: u64,
    kind: ImageKind,
    client_name: Option<&str>,
) -> String {
    let ext = client_name
        .and_then(client_extension)
        .filter(|ext| kind.accepts_extension(ext))
        .map_or_else(|| kind.canonical_extension().to_string(), |ext| ext.to_ascii_lowercase());
    format!("{IMAGE_FILE_PREFIX}{unix_seconds}_{nonce:013x}.{ext}")
}

/// Resolves a stored image path to its file name.
///
/// Accepts `{public_prefix}/{name}` with or without a leading `/`, or a bare
/// `name`. Returns `None` for anything that is not a single plain segment.
#[must_use]
pub fn stored_image_name<'a>(public_prefix: &str, public_path: &'a str) -> Option<&'a str> {
    let trimmed = public_path.trim_start_matches('/');
    let name = trimmed
        .strip_prefix(public_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(trimmed);
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name)
}

/// Extracts the extension from the last path segment of a client file name.
fn client_extension(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
