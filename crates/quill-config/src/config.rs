// crates/quill-config/src/config.rs
// ============================================================================
// Module: Quill Configuration
// Description: Configuration loading and validation for Quill.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: quill-core, quill-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file yields a runnable in-memory
//! server. Invalid values fail closed with [`ConfigError::Invalid`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use quill_core::BlogServiceConfig;
use quill_core::DEFAULT_AUTHOR;
use quill_core::DEFAULT_MAX_CONTENT_BYTES;
use quill_core::DEFAULT_MAX_IMAGE_BYTES;
use quill_core::DEFAULT_MAX_PAGE_SIZE;
use quill_core::DEFAULT_MAX_TITLE_CHARS;
use quill_core::DEFAULT_PAGE_SIZE;
use quill_core::ImagePolicy;
use quill_core::MIN_CONTENT_CHARS;
use quill_core::MIN_TITLE_CHARS;
use quill_core::PageLimits;
use quill_core::PostLimits;
use quill_store_sqlite::SqliteStoreConfig;
use quill_store_sqlite::SqliteStoreMode;
use quill_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "quill.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "QUILL_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of CORS origins.
pub(crate) const MAX_CORS_ORIGINS: usize = 64;
/// Maximum author label length in characters.
pub(crate) const MAX_AUTHOR_CHARS: usize = 255;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default route prefix for legacy endpoints.
const DEFAULT_ROUTE_PREFIX: &str = "/php";
/// Default upload directory and public prefix.
const DEFAULT_UPLOADS_DIR: &str = "uploads";
/// Default busy timeout for sqlite stores (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Quill server and CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuillConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Post store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Image upload configuration.
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// Post rules and paging configuration.
    #[serde(default)]
    pub posts: PostsConfig,
}

impl QuillConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then `QUILL_CONFIG`, then `quill.toml`
    /// in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid config TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.uploads.validate()?;
        self.posts.validate()?;
        let max_body = u64::try_from(self.server.max_body_bytes).unwrap_or(u64::MAX);
        if max_body < self.uploads.max_image_bytes {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be at least uploads.max_image_bytes".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the blog service tunables derived from this configuration.
    #[must_use]
    pub fn service_config(&self) -> BlogServiceConfig {
        BlogServiceConfig {
            default_author: self.posts.default_author.clone(),
            post_limits: PostLimits {
                max_title_chars: self.posts.max_title_chars,
                max_content_bytes: self.posts.max_content_bytes,
            },
            page_limits: PageLimits {
                default_page_size: self.posts.default_page_size,
                max_page_size: self.posts.max_page_size,
            },
            image_policy: ImagePolicy {
                max_bytes: self.uploads.max_image_bytes,
            },
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path prefix under which the legacy endpoints are mounted.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Allowed CORS origins (`*` for any).
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            route_prefix: default_route_prefix(),
            max_body_bytes: default_max_body_bytes(),
            cors_allowed_origins: default_cors_allowed_origins(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.bind))
        })
    }

    /// Returns the route prefix with no trailing slash (empty for `/`).
    #[must_use]
    pub fn route_base(&self) -> &str {
        self.route_prefix.trim_end_matches('/')
    }

    /// Returns true when any origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        validate_route_prefix(&self.route_prefix)?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.cors_allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "server.cors_allowed_origins must be non-empty".to_string(),
            ));
        }
        if self.cors_allowed_origins.len() > MAX_CORS_ORIGINS {
            return Err(ConfigError::Invalid(
                "server.cors_allowed_origins exceeds max entries".to_string(),
            ));
        }
        for origin in &self.cors_allowed_origins {
            validate_origin(origin)?;
        }
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Post store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite` store.
    Sqlite,
}

/// Post store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the sqlite store config when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())
            }
        }
    }
}

// ============================================================================
// SECTION: Uploads
// ============================================================================

/// Image upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Directory where accepted images are written.
    #[serde(default = "default_uploads_dir")]
    pub dir: PathBuf,
    /// Public path segment stored in `image_url` and served over HTTP.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Largest accepted image in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Serve stored images under `/{public_prefix}/`.
    #[serde(default = "default_serve_uploads")]
    pub serve: bool,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
            public_prefix: default_public_prefix(),
            max_image_bytes: default_max_image_bytes(),
            serve: default_serve_uploads(),
        }
    }
}

impl UploadsConfig {
    /// Validates upload configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("uploads.dir", &self.dir.to_string_lossy())?;
        let prefix = self.public_prefix.as_str();
        if prefix.is_empty()
            || prefix == "."
            || prefix == ".."
            || prefix.contains(['/', '\\'])
            || prefix.len() > MAX_PATH_COMPONENT_LENGTH
        {
            return Err(ConfigError::Invalid(
                "uploads.public_prefix must be a single relative path segment".to_string(),
            ));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Invalid(
                "uploads.max_image_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Posts
// ============================================================================

/// Post rules and paging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostsConfig {
    /// Author recorded on new posts.
    #[serde(default = "default_author")]
    pub default_author: String,
    /// Page size when the client omits one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Largest page size honored.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Maximum title length in characters.
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
    /// Maximum content size in bytes.
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: usize,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            default_author: default_author(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_title_chars: default_max_title_chars(),
            max_content_bytes: default_max_content_bytes(),
        }
    }
}

impl PostsConfig {
    /// Validates post configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let author = self.default_author.trim();
        if author.is_empty() {
            return Err(ConfigError::Invalid("posts.default_author must be non-empty".to_string()));
        }
        if author.chars().count() > MAX_AUTHOR_CHARS {
            return Err(ConfigError::Invalid("posts.default_author exceeds max length".to_string()));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::Invalid("posts page sizes must be at least 1".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "posts.default_page_size must not exceed posts.max_page_size".to_string(),
            ));
        }
        if self.max_title_chars < MIN_TITLE_CHARS {
            return Err(ConfigError::Invalid(format!(
                "posts.max_title_chars must be at least {MIN_TITLE_CHARS}"
            )));
        }
        if self.max_content_bytes < MIN_CONTENT_CHARS {
            return Err(ConfigError::Invalid(format!(
                "posts.max_content_bytes must be at least {MIN_CONTENT_CHARS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the legacy endpoint route prefix.
fn validate_route_prefix(prefix: &str) -> Result<(), ConfigError> {
    if !prefix.starts_with('/') {
        return Err(ConfigError::Invalid("server.route_prefix must start with '/'".to_string()));
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        return Err(ConfigError::Invalid(
            "server.route_prefix must not end with '/'".to_string(),
        ));
    }
    if prefix.contains("//") || prefix.contains(['?', '#', '{', '}', '*', ':']) {
        return Err(ConfigError::Invalid(
            "server.route_prefix contains reserved characters".to_string(),
        ));
    }
    Ok(())
}

/// Validates a single CORS origin entry.
fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    if origin == "*" || origin.starts_with("http://") || origin.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "server.cors_allowed_origins entry must be '*' or an http(s) origin: {origin}"
    )))
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default legacy route prefix.
fn default_route_prefix() -> String {
    DEFAULT_ROUTE_PREFIX.to_string()
}

/// Default maximum request body size (6 MiB).
const fn default_max_body_bytes() -> usize {
    6 * 1024 * 1024
}

/// Default CORS origins.
fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Default audit logging enabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default sqlite busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default upload directory.
fn default_uploads_dir() -> PathBuf {
    PathBuf::from(DEFAULT_UPLOADS_DIR)
}

/// Default public prefix for stored images.
fn default_public_prefix() -> String {
    DEFAULT_UPLOADS_DIR.to_string()
}

/// Default maximum image size.
const fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

/// Default static serving of uploads.
const fn default_serve_uploads() -> bool {
    true
}

/// Default author label.
fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// Default page size.
const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Default maximum page size.
const fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

/// Default maximum title length.
const fn default_max_title_chars() -> usize {
    DEFAULT_MAX_TITLE_CHARS
}

/// Default maximum content size.
const fn default_max_content_bytes() -> usize {
    DEFAULT_MAX_CONTENT_BYTES
}
