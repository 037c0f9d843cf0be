//! Default and loading tests for quill-config.
// crates/quill-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Default Tests
// Description: Validate defaults, the canonical example, and file loading.
// Purpose: Ensure an empty config is runnable and loading fails closed.
// =============================================================================

use std::fs;

use quill_config::ConfigError;
use quill_config::QuillConfig;
use quill_config::StoreType;
use quill_config::config_toml_example;
use quill_store_sqlite::SqliteStoreMode;
use tempfile::TempDir;

mod common;

use common::TestResult;

#[test]
fn empty_config_uses_documented_defaults() -> TestResult {
    let config = common::minimal_config()?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" || config.server.route_prefix != "/php" {
        return Err("unexpected server defaults".to_string());
    }
    if config.server.max_body_bytes != 6 * 1024 * 1024 {
        return Err("unexpected max_body_bytes default".to_string());
    }
    if config.store.store_type != StoreType::Memory || config.store.path.is_some() {
        return Err("default store must be memory".to_string());
    }
    if config.uploads.public_prefix != "uploads" || !config.uploads.serve {
        return Err("unexpected uploads defaults".to_string());
    }
    let service = config.service_config();
    if service.default_author != "Admin"
        || service.page_limits.default_page_size != 10
        || service.page_limits.max_page_size != 100
        || service.image_policy.max_bytes != 5 * 1024 * 1024
    {
        return Err("unexpected service defaults".to_string());
    }
    Ok(())
}

#[test]
fn example_config_is_valid() -> TestResult {
    let config =
        common::config_from_toml(&config_toml_example()).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite_config().ok_or("example should select sqlite")?;
    if sqlite.journal_mode != SqliteStoreMode::Wal {
        return Err("example journal mode should be wal".to_string());
    }
    Ok(())
}

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("quill.toml");
    fs::write(&path, "[posts]\ndefault_author = \"Editor\"\n").map_err(|err| err.to_string())?;
    let config = QuillConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.posts.default_author != "Editor" {
        return Err("explicit config was not applied".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    match QuillConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("expected io error, got {other}")),
        Ok(_) => Err("expected io error".to_string()),
    }
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    common::assert_invalid(QuillConfig::load(Some(&path)).map(|_| ()), "exceeds size limit")
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, [0xFF, 0xFE, 0x00]).map_err(|err| err.to_string())?;
    common::assert_invalid(QuillConfig::load(Some(&path)).map(|_| ()), "must be utf-8")
}

#[test]
fn load_validates_after_parse() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("quill.toml");
    fs::write(&path, "[store]\ntype = \"sqlite\"\n").map_err(|err| err.to_string())?;
    common::assert_invalid(QuillConfig::load(Some(&path)).map(|_| ()), "sqlite store requires path")
}

#[test]
fn unknown_store_type_fails_to_parse() -> TestResult {
    match common::config_from_toml("[store]\ntype = \"mysql\"\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(other) => Err(format!("expected parse error, got {other}")),
        Ok(_) => Err("expected parse error".to_string()),
    }
}
