// crates/quill-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and post command guards.
// Purpose: Pin the command surface and the checks run before opening a store.
// Dependencies: quill-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap parsing of the `quill` command tree, post id conversion, and
//! the persistent store requirement for `posts` commands.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::Parser;
use quill_config::QuillConfig;
use quill_config::StoreType;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::PostsCommand;
use super::ensure_persistent_store;
use super::parse_post_id;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn version_flag_parses_without_subcommand() {
    let cli = Cli::try_parse_from(["quill", "--version"]).unwrap();
    assert!(cli.show_version);
    assert!(cli.command.is_none());
}

#[test]
fn serve_accepts_config_path() {
    let cli = Cli::try_parse_from(["quill", "serve", "--config", "blog.toml"]).unwrap();
    let Some(Commands::Serve(args)) = cli.command else {
        panic!("expected serve command");
    };
    assert_eq!(args.config, Some(PathBuf::from("blog.toml")));
}

#[test]
fn config_example_takes_no_arguments() {
    let cli = Cli::try_parse_from(["quill", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Example
        })
    ));
    assert!(Cli::try_parse_from(["quill", "config", "example", "--config", "x.toml"]).is_err());
}

#[test]
fn posts_list_reads_paging_flags() {
    let cli =
        Cli::try_parse_from(["quill", "posts", "list", "--page", "3", "--page-size", "-1"]).unwrap();
    let Some(Commands::Posts {
        command: PostsCommand::List(list),
    }) = cli.command
    else {
        panic!("expected posts list");
    };
    assert_eq!(list.page, Some(3));
    assert_eq!(list.page_size, Some(-1));
    assert!(list.location.config.is_none());
}

#[test]
fn posts_show_requires_numeric_id() {
    let cli = Cli::try_parse_from(["quill", "posts", "show", "7", "--config", "q.toml"]).unwrap();
    let Some(Commands::Posts {
        command: PostsCommand::Show(show),
    }) = cli.command
    else {
        panic!("expected posts show");
    };
    assert_eq!(show.id, 7);
    assert_eq!(show.location.config, Some(PathBuf::from("q.toml")));
    assert!(Cli::try_parse_from(["quill", "posts", "show", "seven"]).is_err());
    assert!(Cli::try_parse_from(["quill", "posts", "delete"]).is_err());
}

#[test]
fn post_ids_must_be_positive() {
    assert_eq!(parse_post_id(12).unwrap().get(), 12);
    let err = parse_post_id(0).unwrap_err();
    assert_eq!(err.to_string(), "Invalid post id: 0");
    assert!(parse_post_id(-4).is_err());
}

#[test]
fn posts_commands_refuse_the_memory_store() {
    let mut config = QuillConfig::default();
    let err = ensure_persistent_store(&config).unwrap_err();
    assert!(err.to_string().contains("persistent store"));

    config.store.store_type = StoreType::Sqlite;
    assert!(ensure_persistent_store(&config).is_ok());
}
