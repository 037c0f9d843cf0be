// crates/quill-core/src/runtime/store.rs
// ============================================================================
// Module: Quill In-Memory Backends
// Description: In-memory post store, image store, and fixed clock.
// Purpose: Provide deterministic backends for tests and local dev runs.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`PostStore`],
//! [`ImageStore`], and [`Clock`], plus the shared `Arc` wrappers the service
//! and hosts pass around. The in-memory backends honor the same ordering and
//! path rules as the durable ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::PostId;
use crate::core::image::ImageKind;
use crate::core::image::ImageUpload;
use crate::core::image::image_file_name;
use crate::core::image::stored_image_name;
use crate::core::post::NewPost;
use crate::core::post::Post;
use crate::core::post::PostChanges;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::ImageError;
use crate::interfaces::ImageStore;
use crate::interfaces::PostStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Post Store
// ============================================================================

/// Mutable state behind the in-memory post store.
#[derive(Debug, Default)]
struct PostTable {
    /// Posts keyed by raw identifier.
    rows: BTreeMap<i64, Post>,
    /// Last identifier handed out.
    last_id: i64,
}

/// In-memory post store for tests and `memory` store runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPostStore {
    /// Post table protected by a mutex.
    table: Arc<Mutex<PostTable>>,
}

impl InMemoryPostStore {
    /// Creates an empty in-memory post store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with the locked table.
    fn with_table<T>(&self, f: impl FnOnce(&mut PostTable) -> T) -> Result<T, StoreError> {
        let mut guard = self
            .table
            .lock()
            .map_err(|_| StoreError::Store("post store mutex poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl PostStore for InMemoryPostStore {
    fn count(&self) -> Result<u64, StoreError> {
        self.with_table(|table| u64::try_from(table.rows.len()).unwrap_or(u64::MAX))
    }

    fn list(&self, offset: u64, limit: u32) -> Result<Vec<Post>, StoreError> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        self.with_table(|table| {
            let mut posts: Vec<&Post> = table.rows.values().collect();
            posts.sort_by_key(|post| Reverse((post.created_at, post.id)));
            posts.into_iter().skip(skip).take(take).cloned().collect()
        })
    }

    fn get(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.with_table(|table| table.rows.get(&id.get()).cloned())
    }

    fn insert(&self, post: &NewPost) -> Result<PostId, StoreError> {
        self.with_table(|table| {
            let next = table.last_id.checked_add(1).and_then(PostId::from_raw);
            let Some(id) = next else {
                return Err(StoreError::Store("post id space exhausted".to_string()));
            };
            table.last_id = id.get();
            table.rows.insert(id.get(), post.clone().into_post(id));
            Ok(id)
        })?
    }

    fn update(&self, id: PostId, changes: &PostChanges) -> Result<bool, StoreError> {
        self.with_table(|table| {
            let Some(post) = table.rows.get_mut(&id.get()) else {
                return false;
            };
            post.title.clone_from(&changes.title);
            post.content.clone_from(&changes.content);
            post.image_url.clone_from(&changes.image_url);
            post.updated_at = Some(changes.updated_at);
            true
        })
    }

    fn delete(&self, id: PostId) -> Result<bool, StoreError> {
        self.with_table(|table| table.rows.remove(&id.get()).is_some())
    }
}

// ============================================================================
// SECTION: In-Memory Image Store
// ============================================================================

/// Default public prefix for in-memory image paths.
const DEFAULT_PUBLIC_PREFIX: &str = "uploads";

/// Mutable state behind the in-memory image store.
#[derive(Debug, Default)]
struct ImageTable {
    /// Stored bytes keyed by public path.
    images: BTreeMap<String, Vec<u8>>,
    /// Public paths removed so far, in removal order.
    deleted: Vec<String>,
    /// Counter used as the file name nonce.
    counter: u64,
}

/// In-memory image store for tests and `memory` store runs.
#[derive(Debug, Clone)]
pub struct InMemoryImageStore {
    /// Public path prefix (single segment).
    public_prefix: String,
    /// Image table protected by a mutex.
    table: Arc<Mutex<ImageTable>>,
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIX)
    }
}

impl InMemoryImageStore {
    /// Creates an empty store that issues paths under `public_prefix`.
    #[must_use]
    pub fn new(public_prefix: impl Into<String>) -> Self {
        Self {
            public_prefix: public_prefix.into(),
            table: Arc::new(Mutex::new(ImageTable::default())),
        }
    }

    /// Returns true when an image is stored at `public_path`.
    #[must_use]
    pub fn contains(&self, public_path: &str) -> bool {
        self.table.lock().is_ok_and(|table| table.images.contains_key(public_path))
    }

    /// Returns the number of stored images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().map_or(0, |table| table.images.len())
    }

    /// Returns true when no images are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the public paths removed so far.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.table.lock().map_or_else(|_| Vec::new(), |table| table.deleted.clone())
    }

    /// Resolves a public path to the key this store issued, if it belongs here.
    fn owned_key(&self, public_path: &str) -> Option<String> {
        stored_image_name(&self.public_prefix, public_path)
            .map(|name| format!("{}/{name}", self.public_prefix))
    }
}

impl ImageStore for InMemoryImageStore {
    fn save(
        &self,
        upload: &ImageUpload,
        kind: ImageKind,
        now: Timestamp,
    ) -> Result<String, ImageError> {
        let mut table =
            self.table.lock().map_err(|_| ImageError::Io("image store mutex poisoned".to_string()))?;
        table.counter += 1;
        let name =
            image_file_name(now.unix_seconds(), table.counter, kind, upload.file_name.as_deref());
        let path = format!("{}/{name}", self.public_prefix);
        table.images.insert(path.clone(), upload.bytes.clone());
        Ok(path)
    }

    fn delete(&self, public_path: &str) -> Result<(), ImageError> {
        let key = self
            .owned_key(public_path)
            .ok_or_else(|| ImageError::Invalid(format!("image path outside store: {public_path}")))?;
        let mut table =
            self.table.lock().map_err(|_| ImageError::Io("image store mutex poisoned".to_string()))?;
        if table.images.remove(&key).is_some() {
            table.deleted.push(key);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixed Clock
// ============================================================================

/// Clock that returns a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    /// Current instant.
    now: Arc<Mutex<Timestamp>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ============================================================================
// SECTION: Shared Wrappers
// ============================================================================

/// Shared post store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedPostStore {
    /// Inner store implementation.
    inner: Arc<dyn PostStore + Send + Sync>,
}

impl SharedPostStore {
    /// Wraps a post store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl PostStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl PostStore for SharedPostStore {
    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn list(&self, offset: u64, limit: u32) -> Result<Vec<Post>, StoreError> {
        self.inner.list(offset, limit)
    }

    fn get(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.inner.get(id)
    }

    fn insert(&self, post: &NewPost) -> Result<PostId, StoreError> {
        self.inner.insert(post)
    }

    fn update(&self, id: PostId, changes: &PostChanges) -> Result<bool, StoreError> {
        self.inner.update(id, changes)
    }

    fn delete(&self, id: PostId) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }
}

/// Shared image store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedImageStore {
    /// Inner store implementation.
    inner: Arc<dyn ImageStore + Send + Sync>,
}

impl SharedImageStore {
    /// Wraps an image store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ImageStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl ImageStore for SharedImageStore {
    fn save(
        &self,
        upload: &ImageUpload,
        kind: ImageKind,
        now: Timestamp,
    ) -> Result<String, ImageError> {
        self.inner.save(upload, kind, now)
    }

    fn delete(&self, public_path: &str) -> Result<(), ImageError> {
        self.inner.delete(public_path)
    }
}

/// Shared clock backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedClock {
    /// Inner clock implementation.
    inner: Arc<dyn Clock + Send + Sync>,
}

impl SharedClock {
    /// Wraps a clock in a shared, clonable wrapper.
    #[must_use]
    pub fn from_clock(clock: impl Clock + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(clock),
        }
    }
}

impl Clock for SharedClock {
    fn now(&self) -> Timestamp {
        self.inner.now()
    }
}
