// crates/quill-core/src/runtime/service.rs
// ============================================================================
// Module: Quill Blog Service
// Description: Post lifecycle orchestration across store, images, and clock.
// Purpose: Run every post operation through one validated, ordered path.
// Dependencies: crate::core, crate::interfaces, crate::runtime::store, thiserror
// ============================================================================

//! ## Overview
//! [`BlogService`] is the only place where post rows and image files change
//! together. Ordering rules:
//! - a new image is saved before the row that references it,
//! - a replaced or orphaned image is removed only after the row change lands,
//! - a row failure removes the image saved for it and keeps the previous one.
//!
//! Image removal failures never fail an operation. They are collected in a
//! [`CleanupReport`] so the host can log them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::PostId;
use crate::core::image::ImagePolicy;
use crate::core::image::ImageUpload;
use crate::core::page::PageLimits;
use crate::core::page::PageRequest;
use crate::core::page::PostPage;
use crate::core::post::CreatedPost;
use crate::core::post::DEFAULT_AUTHOR;
use crate::core::post::DeletedPost;
use crate::core::post::NewPost;
use crate::core::post::Post;
use crate::core::post::PostChanges;
use crate::core::post::PostDraft;
use crate::core::post::PostLimits;
use crate::core::post::UpdatedPost;
use crate::core::post::ValidationError;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::ImageError;
use crate::interfaces::ImageStore;
use crate::interfaces::PostStore;
use crate::interfaces::StoreError;
use crate::runtime::store::SharedClock;
use crate::runtime::store::SharedImageStore;
use crate::runtime::store::SharedPostStore;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables applied by the blog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogServiceConfig {
    /// Author recorded on new posts.
    pub default_author: String,
    /// Title and content limits.
    pub post_limits: PostLimits,
    /// Paging defaults and bounds.
    pub page_limits: PageLimits,
    /// Upload acceptance rules.
    pub image_policy: ImagePolicy,
}

impl Default for BlogServiceConfig {
    fn default() -> Self {
        Self {
            default_author: DEFAULT_AUTHOR.to_string(),
            post_limits: PostLimits::default(),
            page_limits: PageLimits::default(),
            image_policy: ImagePolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Blog service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Post input failed validation.
    #[error("{0}")]
    Validation(ValidationError),
    /// Request carried no usable post identifier.
    #[error("Post ID is required")]
    MissingId,
    /// Post does not exist.
    #[error("Post not found")]
    NotFound,
    /// Upload was rejected or could not be stored.
    #[error("Image upload failed: {0}")]
    Image(ImageError),
    /// Post store failed.
    #[error("{0}")]
    Store(StoreError),
}

/// Failed operation plus any cleanup that ran while unwinding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ServiceFailure {
    /// Operation error.
    pub error: ServiceError,
    /// Image removals attempted while unwinding.
    pub cleanup: CleanupReport,
}

impl From<ServiceError> for ServiceFailure {
    fn from(error: ServiceError) -> Self {
        Self {
            error,
            cleanup: CleanupReport::default(),
        }
    }
}

// ============================================================================
// SECTION: Cleanup Reporting
// ============================================================================

/// Image removal that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    /// Public path of the image left behind.
    pub image_path: String,
    /// Removal failure.
    pub error: ImageError,
}

/// Image removal failures collected during one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Failed removals in attempt order.
    warnings: Vec<CleanupWarning>,
}

impl CleanupReport {
    /// Returns true when every attempted removal succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns failed removals in attempt order.
    #[must_use]
    pub fn warnings(&self) -> &[CleanupWarning] {
        &self.warnings
    }

    /// Removes an image and records a warning when removal fails.
    fn remove(&mut self, images: &impl ImageStore, image_path: &str) {
        if let Err(error) = images.delete(image_path) {
            self.warnings.push(CleanupWarning {
                image_path: image_path.to_string(),
                error,
            });
        }
    }
}

/// Successful operation result plus its cleanup report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Operation result.
    pub value: T,
    /// Image removal failures observed after the row change.
    pub cleanup: CleanupReport,
}

impl<T> Outcome<T> {
    /// Wraps a result that needed no cleanup.
    fn clean(value: T) -> Self {
        Self {
            value,
            cleanup: CleanupReport::default(),
        }
    }
}

/// Result type for operations that may touch stored images.
pub type ServiceResult<T> = Result<Outcome<T>, ServiceFailure>;

// ============================================================================
// SECTION: Blog Service
// ============================================================================

/// Post lifecycle orchestrator.
#[derive(Clone)]
pub struct BlogService {
    /// Post persistence.
    posts: SharedPostStore,
    /// Image persistence.
    images: SharedImageStore,
    /// Time source.
    clock: SharedClock,
    /// Service tunables.
    config: BlogServiceConfig,
}

impl BlogService {
    /// Creates a service over the given backends.
    #[must_use]
    pub const fn new(
        posts: SharedPostStore,
        images: SharedImageStore,
        clock: SharedClock,
        config: BlogServiceConfig,
    ) -> Self {
        Self {
            posts,
            images,
            clock,
            config,
        }
    }

    /// Returns the service tunables.
    #[must_use]
    pub const fn config(&self) -> &BlogServiceConfig {
        &self.config
    }

    /// Resolves raw paging input against the configured limits.
    #[must_use]
    pub fn page_request(&self, page: Option<i64>, page_size: Option<i64>) -> PageRequest {
        PageRequest::resolve(page, page_size, &self.config.page_limits)
    }

    /// Lists one page of posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when counting or listing fails.
    pub fn list(&self, request: PageRequest) -> Result<PostPage, ServiceError> {
        let total = self.posts.count().map_err(ServiceError::Store)?;
        let posts =
            self.posts.list(request.offset(), request.page_size()).map_err(ServiceError::Store)?;
        Ok(PostPage::new(request, posts, total))
    }

    /// Loads one post.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when the post does not exist and
    /// [`ServiceError::Store`] when loading fails.
    pub fn get(&self, id: PostId) -> Result<Post, ServiceError> {
        self.posts.get(id).map_err(ServiceError::Store)?.ok_or(ServiceError::NotFound)
    }

    /// Creates a post, storing the optional image first.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFailure`] for validation, image, or store errors.
    /// When the insert fails the freshly stored image is removed.
    pub fn create(&self, draft: &PostDraft, image: Option<ImageUpload>) -> ServiceResult<CreatedPost> {
        let valid = draft.validate(&self.config.post_limits).map_err(ServiceError::Validation)?;
        let now = self.clock.now();
        let image_url = self.store_image(image, now)?;
        let (title, content) = valid.into_parts();
        let new_post = NewPost {
            title,
            content,
            image_url,
            author: self.config.default_author.clone(),
            created_at: now,
        };
        match self.posts.insert(&new_post) {
            Ok(id) => Ok(Outcome::clean(CreatedPost {
                id,
                title: new_post.title,
                content: new_post.content,
                image_url: new_post.image_url,
                created_at: now,
            })),
            Err(err) => Err(self.unwind(ServiceError::Store(err), new_post.image_url.as_deref())),
        }
    }

    /// Updates a post, replacing its image when a new one is supplied.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFailure`] for validation, lookup, image, or store
    /// errors. When the row update fails the new image is removed and the
    /// previous one is kept.
    pub fn update(
        &self,
        id: PostId,
        draft: &PostDraft,
        image: Option<ImageUpload>,
    ) -> ServiceResult<UpdatedPost> {
        let valid = draft.validate(&self.config.post_limits).map_err(ServiceError::Validation)?;
        let existing = self.get(id)?;
        let now = self.clock.now();
        let new_image = self.store_image(image, now)?;
        let (title, content) = valid.into_parts();
        let changes = PostChanges {
            title,
            content,
            image_url: new_image.clone().or_else(|| existing.image_url.clone()),
            updated_at: now,
        };
        match self.posts.update(id, &changes) {
            Ok(true) => {}
            Ok(false) => return Err(self.unwind(ServiceError::NotFound, new_image.as_deref())),
            Err(err) => {
                return Err(self.unwind(ServiceError::Store(err), new_image.as_deref()));
            }
        }
        let mut cleanup = CleanupReport::default();
        if new_image.is_some()
            && let Some(previous) = existing.image_url.as_deref()
            && changes.image_url.as_deref() != Some(previous)
        {
            cleanup.remove(&self.images, previous);
        }
        Ok(Outcome {
            value: UpdatedPost {
                id,
                title: changes.title,
                content: changes.content,
                image_url: changes.image_url,
                updated_at: now,
            },
            cleanup,
        })
    }

    /// Deletes a post and then its image.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceFailure`] for lookup or store errors. Image removal
    /// failures are reported in the outcome's cleanup report instead.
    pub fn delete(&self, id: PostId) -> ServiceResult<DeletedPost> {
        let existing = self.get(id)?;
        if !self.posts.delete(id).map_err(ServiceError::Store)? {
            return Err(ServiceError::NotFound.into());
        }
        let mut cleanup = CleanupReport::default();
        if let Some(path) = existing.image_url.as_deref() {
            cleanup.remove(&self.images, path);
        }
        Ok(Outcome {
            value: DeletedPost {
                id,
            },
            cleanup,
        })
    }

    /// Inspects and stores an upload, ignoring empty form selections.
    fn store_image(
        &self,
        image: Option<ImageUpload>,
        now: Timestamp,
    ) -> Result<Option<String>, ServiceError> {
        let Some(upload) = image.filter(|upload| !upload.is_empty_selection()) else {
            return Ok(None);
        };
        let kind = self.config.image_policy.inspect(&upload).map_err(ServiceError::Image)?;
        self.images.save(&upload, kind, now).map(Some).map_err(ServiceError::Image)
    }

    /// Builds a failure, removing an image saved for the failed row change.
    fn unwind(&self, error: ServiceError, saved_image: Option<&str>) -> ServiceFailure {
        let mut cleanup = CleanupReport::default();
        if let Some(path) = saved_image {
            cleanup.remove(&self.images, path);
        }
        ServiceFailure {
            error,
            cleanup,
        }
    }
}
