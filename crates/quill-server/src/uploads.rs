// crates/quill-server/src/uploads.rs
// ============================================================================
// Module: Quill Upload Storage
// Description: Filesystem image store and wall clock for the server.
// Purpose: Persist accepted uploads under a single flat directory.
// Dependencies: quill-core, rand, tempfile
// ============================================================================

//! ## Overview
//! [`FsImageStore`] writes each accepted upload to a temporary file inside the
//! uploads root and renames it into place, so a stored name never refers to a
//! partial file. Public paths take the form `{public_prefix}/{file}`. Deletes
//! only resolve single-segment names inside the root; anything else is
//! rejected without touching the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use quill_core::Clock;
use quill_core::ImageError;
use quill_core::ImageKind;
use quill_core::ImageStore;
use quill_core::ImageUpload;
use quill_core::Timestamp;
use quill_core::image_file_name;
use quill_core::stored_image_name;

// ============================================================================
// SECTION: Filesystem Image Store
// ============================================================================

/// Image store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    /// Directory holding stored files.
    root: PathBuf,
    /// Public path prefix (single segment).
    public_prefix: String,
}

impl FsImageStore {
    /// Creates a store rooted at `root` that issues `{public_prefix}/{file}`
    /// paths. The directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    /// Returns the uploads root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a public path to a file name inside the root.
    fn file_name<'a>(&self, public_path: &'a str) -> Option<&'a str> {
        stored_image_name(&self.public_prefix, public_path)
    }
}

impl ImageStore for FsImageStore {
    fn save(
        &self,
        upload: &ImageUpload,
        kind: ImageKind,
        now: Timestamp,
    ) -> Result<String, ImageError> {
        fs::create_dir_all(&self.root).map_err(|err| io_error(&self.root, &err))?;
        let name = image_file_name(
            now.unix_seconds(),
            rand::random::<u64>(),
            kind,
            upload.file_name.as_deref(),
        );
        let mut staged = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(&self.root)
            .map_err(|err| io_error(&self.root, &err))?;
        staged.write_all(&upload.bytes).map_err(|err| io_error(staged.path(), &err))?;
        staged.flush().map_err(|err| io_error(staged.path(), &err))?;
        let target = self.root.join(&name);
        staged.persist_noclobber(&target).map_err(|err| io_error(&target, &err.error))?;
        Ok(format!("{}/{name}", self.public_prefix))
    }

    fn delete(&self, public_path: &str) -> Result<(), ImageError> {
        let name = self
            .file_name(public_path)
            .ok_or_else(|| ImageError::Invalid(format!("image path outside store: {public_path}")))?;
        let target = self.root.join(name);
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&target, &err)),
        }
    }
}

/// Maps an I/O failure to an image error naming the path.
fn io_error(path: &Path, err: &io::Error) -> ImageError {
    ImageError::Io(format!("{}: {err}", path.display()))
}

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Clock backed by the host wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        Timestamp::from_unix_seconds(seconds).unwrap_or(Timestamp::UNIX_EPOCH)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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
        reason = "Test-only upload assertions."
    )]

    use quill_core::Clock;
    use quill_core::ImageError;
    use quill_core::ImageKind;
    use quill_core::ImageStore;
    use quill_core::ImageUpload;
    use quill_core::Timestamp;

    use super::FsImageStore;
    use super::SystemClock;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nrest-of-file";

    fn now() -> Timestamp {
        Timestamp::from_unix_seconds(1_700_000_000).unwrap()
    }

    #[test]
    fn save_creates_root_and_returns_prefixed_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("uploads");
        let store = FsImageStore::new(&root, "uploads");
        let upload = ImageUpload::new(Some("photo.PNG".to_string()), PNG.to_vec());
        assert_eq!(store.root(), root.as_path());
        assert!(!store.root().exists());

        let path = store.save(&upload, ImageKind::Png, now()).unwrap();

        let name = path.strip_prefix("uploads/").unwrap();
        assert!(name.starts_with("post_1700000000_"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(store.root().join(name)).unwrap(), PNG);
    }

    #[test]
    fn delete_resolves_bare_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "uploads");
        let upload = ImageUpload::new(None, PNG.to_vec());
        let path = store.save(&upload, ImageKind::Png, now()).unwrap();
        let name = path.strip_prefix("uploads/").unwrap();

        store.delete(name).unwrap();
        assert!(!store.root().join(name).exists());
    }

    #[test]
    fn save_leaves_no_staging_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "uploads");
        let upload = ImageUpload::new(None, PNG.to_vec());
        store.save(&upload, ImageKind::Png, now()).unwrap();
        store.save(&upload, ImageKind::Png, now()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.starts_with("post_")));
    }

    #[test]
    fn delete_accepts_leading_slash_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "uploads");
        let upload = ImageUpload::new(None, PNG.to_vec());
        let path = store.save(&upload, ImageKind::Png, now()).unwrap();

        store.delete(&format!("/{path}")).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        store.delete(&path).unwrap();
    }

    #[test]
    fn delete_rejects_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(&root).unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();
        let store = FsImageStore::new(&root, "uploads");

        let rejected =
            ["uploads/../keep.txt", "../keep.txt", "uploads/", "uploads/a\\b", "..", "uploads/."];
        for path in rejected {
            let err = store.delete(path).unwrap_err();
            assert!(matches!(err, ImageError::Invalid(_)), "{path}");
        }
        assert!(outside.exists());
    }

    #[test]
    fn system_clock_is_past_the_epoch() {
        assert!(SystemClock.now() > Timestamp::UNIX_EPOCH);
    }
}
