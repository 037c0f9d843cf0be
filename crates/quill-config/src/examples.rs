// crates/quill-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Quill configuration. The output is deterministic and
//! must always pass [`crate::QuillConfig::validate`].

/// Returns a canonical example `quill.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
route_prefix = "/php"
max_body_bytes = 6291456
cors_allowed_origins = ["http://localhost:3000"]

[server.audit]
enabled = true
# path = "quill-audit.jsonl"

[store]
type = "sqlite"
path = "quill.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[uploads]
dir = "uploads"
public_prefix = "uploads"
max_image_bytes = 5242880
serve = true

[posts]
default_author = "Admin"
default_page_size = 10
max_page_size = 100
max_title_chars = 255
max_content_bytes = 1048576
"#,
    )
}
