// crates/quill-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Post Store
// Description: Durable PostStore backed by SQLite.
// Purpose: Persist posts in a single versioned `posts` table.
// Dependencies: quill-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements [`PostStore`] on `SQLite`. Timestamps are stored in
//! their canonical text form so `ORDER BY created_at DESC, id DESC` yields
//! newest-first listing. Rows with non-positive ids or unparseable timestamps
//! surface as corruption rather than being skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use quill_core::NewPost;
use quill_core::Post;
use quill_core::PostChanges;
use quill_core::PostId;
use quill_core::PostStore;
use quill_core::StoreError;
use quill_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by every post query.
const POST_COLUMNS: &str = "id, title, content, image_url, author, created_at, updated_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` post store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default tuning.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row fails integrity checks.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid request or store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed post store.
#[derive(Clone)]
pub struct SqlitePostStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePostStore {
    /// Opens an `SQLite`-backed post store, creating the schema when absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or when it carries an unknown schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `f` with the locked connection.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        f(&guard)
    }

    /// Counts stored posts.
    fn count_posts(&self) -> Result<u64, SqliteStoreError> {
        let count: i64 = self.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM posts", params![], |row| row.get(0))
                .map_err(db_error)
        })?;
        u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt("negative post count".to_string()))
    }

    /// Lists posts in newest-first order.
    fn list_posts(&self, offset: u64, limit: u32) -> Result<Vec<Post>, SqliteStoreError> {
        let offset = i64::try_from(offset)
            .map_err(|_| SqliteStoreError::Invalid("offset exceeds sqlite range".to_string()))?;
        let rows = self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT ?1 \
                     OFFSET ?2"
                ))
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![i64::from(limit), offset], RawPost::from_row)
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            Ok(rows)
        })?;
        rows.into_iter().map(RawPost::into_post).collect()
    }

    /// Loads a single post.
    fn get_post(&self, id: PostId) -> Result<Option<Post>, SqliteStoreError> {
        let raw = self.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id.get()],
                RawPost::from_row,
            )
            .optional()
            .map_err(db_error)
        })?;
        raw.map(RawPost::into_post).transpose()
    }

    /// Inserts a post and returns the assigned id.
    fn insert_post(&self, post: &NewPost) -> Result<PostId, SqliteStoreError> {
        let rowid = self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, image_url, author, created_at) VALUES (?1, \
                 ?2, ?3, ?4, ?5)",
                params![
                    post.title,
                    post.content,
                    post.image_url,
                    post.author,
                    post.created_at.to_canonical_string()
                ],
            )
            .map_err(db_error)?;
            Ok(conn.last_insert_rowid())
        })?;
        PostId::from_raw(rowid)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("non-positive rowid {rowid}")))
    }

    /// Updates a post; returns whether a row matched.
    fn update_post(&self, id: PostId, changes: &PostChanges) -> Result<bool, SqliteStoreError> {
        let affected = self.with_connection(|conn| {
            conn.execute(
                "UPDATE posts SET title = ?1, content = ?2, image_url = ?3, updated_at = ?4 WHERE \
                 id = ?5",
                params![
                    changes.title,
                    changes.content,
                    changes.image_url,
                    changes.updated_at.to_canonical_string(),
                    id.get()
                ],
            )
            .map_err(db_error)
        })?;
        Ok(affected > 0)
    }

    /// Deletes a post; returns whether a row matched.
    fn delete_post(&self, id: PostId) -> Result<bool, SqliteStoreError> {
        let affected = self.with_connection(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", params![id.get()]).map_err(db_error)
        })?;
        Ok(affected > 0)
    }
}

impl PostStore for SqlitePostStore {
    fn count(&self) -> Result<u64, StoreError> {
        self.count_posts().map_err(StoreError::from)
    }

    fn list(&self, offset: u64, limit: u32) -> Result<Vec<Post>, StoreError> {
        self.list_posts(offset, limit).map_err(StoreError::from)
    }

    fn get(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.get_post(id).map_err(StoreError::from)
    }

    fn insert(&self, post: &NewPost) -> Result<PostId, StoreError> {
        self.insert_post(post).map_err(StoreError::from)
    }

    fn update(&self, id: PostId, changes: &PostChanges) -> Result<bool, StoreError> {
        self.update_post(id, changes).map_err(StoreError::from)
    }

    fn delete(&self, id: PostId) -> Result<bool, StoreError> {
        self.delete_post(id).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Post row exactly as stored, before integrity checks.
struct RawPost {
    /// Row id.
    id: i64,
    /// Title column.
    title: String,
    /// Content column.
    content: String,
    /// Image path column.
    image_url: Option<String>,
    /// Author column.
    author: String,
    /// Creation timestamp text.
    created_at: String,
    /// Update timestamp text.
    updated_at: Option<String>,
}

impl RawPost {
    /// Reads the shared column list from a row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            image_url: row.get(3)?,
            author: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Validates the row into a post.
    fn into_post(self) -> Result<Post, SqliteStoreError> {
        let id = PostId::from_raw(self.id)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("non-positive post id {}", self.id)))?;
        let created_at = Timestamp::parse(&self.created_at)
            .map_err(|err| SqliteStoreError::Corrupt(format!("post {id} created_at: {err}")))?;
        let updated_at = self
            .updated_at
            .as_deref()
            .map(Timestamp::parse)
            .transpose()
            .map_err(|err| SqliteStoreError::Corrupt(format!("post {id} updated_at: {err}")))?;
        Ok(Post {
            id,
            title: self.title,
            content: self.content,
            image_url: self.image_url,
            author: self.author,
            created_at,
            updated_at,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    connection
        .execute_batch(&format!(
            "PRAGMA journal_mode = {}; PRAGMA synchronous = {};",
            config.journal_mode.pragma_value(),
            config.sync_mode.pragma_value()
        ))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(connection)
}

/// Initializes the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    image_url TEXT NULL,
                    author TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_posts_created_at
                    ON posts (created_at DESC, id DESC);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)
}
