// crates/quill-cli/src/main.rs
// ============================================================================
// Module: Quill CLI Entry Point
// Description: Command dispatcher for the Quill server and post administration.
// Purpose: Run the blog server and inspect the configured post store.
// Dependencies: clap, quill-config, quill-core, quill-server, serde, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `quill` binary starts the blog server, validates or prints
//! configuration, and lists, shows, or deletes stored posts. All user-facing
//! strings are routed through the message catalog. Post commands print JSON
//! on stdout; errors go to stderr with a non-zero exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use quill_cli::t;
use quill_config::QuillConfig;
use quill_config::StoreType;
use quill_config::config_toml_example;
use quill_core::BlogService;
use quill_core::CleanupReport;
use quill_core::PostId;
use quill_server::BlogServer;
use quill_server::ServerError;
use quill_server::build_service;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "quill", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Quill blog server.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Post store administration.
    Posts {
        /// Selected posts subcommand.
        #[command(subcommand)]
        command: PostsCommand,
    },
}

/// Config file selection shared by every command that reads config.
#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Optional config file path (defaults to quill.toml or `QUILL_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigArgs),
    /// Print an example config file.
    Example,
}

/// Posts subcommands.
#[derive(Subcommand, Debug)]
enum PostsCommand {
    /// Print one page of posts, newest first.
    List(PostsListCommand),
    /// Print one post.
    Show(PostIdCommand),
    /// Delete one post and its image.
    Delete(PostIdCommand),
}

/// Arguments for `posts list`.
#[derive(Args, Debug)]
struct PostsListCommand {
    /// Config file selection.
    #[command(flatten)]
    location: ConfigArgs,
    /// Page number (1-based).
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    page: Option<i64>,
    /// Posts per page.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    page_size: Option<i64>,
}

/// Arguments for commands addressing one post.
#[derive(Args, Debug)]
struct PostIdCommand {
    /// Post identifier.
    #[arg(value_name = "ID", allow_negative_numbers = true)]
    id: i64,
    /// Config file selection.
    #[command(flatten)]
    location: ConfigArgs,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Posts {
            command,
        } => command_posts(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ConfigArgs) -> CliResult<ExitCode> {
    let config = QuillConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("serve.config.load_failed", error = err)))?;
    if config.store.store_type == StoreType::Memory {
        write_stderr_line(&t!("serve.warn.memory_store"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let server = tokio::task::spawn_blocking(move || BlogServer::from_config(config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    let server_config = server.config();
    write_stderr_line(&t!(
        "serve.listening",
        route_base = server_config.server.route_base(),
        bind = server_config.server.bind
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server
        .serve()
        .await
        .map_err(|err: ServerError| CliError::new(t!("serve.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = QuillConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the example config.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_raw(&config_toml_example())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Posts Commands
// ============================================================================

/// Dispatches posts subcommands.
fn command_posts(command: PostsCommand) -> CliResult<ExitCode> {
    match command {
        PostsCommand::List(command) => command_posts_list(&command),
        PostsCommand::Show(command) => command_posts_show(&command),
        PostsCommand::Delete(command) => command_posts_delete(&command),
    }
}

/// Executes `posts list`.
fn command_posts_list(command: &PostsListCommand) -> CliResult<ExitCode> {
    let service = open_service(command.location.config.as_deref())?;
    let request = service.page_request(command.page, command.page_size);
    let page = service
        .list(request)
        .map_err(|err| CliError::new(t!("posts.list.failed", error = err)))?;
    write_json(&page)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `posts show`.
fn command_posts_show(command: &PostIdCommand) -> CliResult<ExitCode> {
    let id = parse_post_id(command.id)?;
    let service = open_service(command.location.config.as_deref())?;
    let post = service
        .get(id)
        .map_err(|err| CliError::new(t!("posts.show.failed", id = id, error = err)))?;
    write_json(&post)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `posts delete`.
fn command_posts_delete(command: &PostIdCommand) -> CliResult<ExitCode> {
    let id = parse_post_id(command.id)?;
    let service = open_service(command.location.config.as_deref())?;
    let outcome = service
        .delete(id)
        .map_err(|err| CliError::new(t!("posts.delete.failed", id = id, error = err)))?;
    report_cleanup(&outcome.cleanup)?;
    write_json(&outcome.value)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Posts Helpers
// ============================================================================

/// Loads config and opens the configured post store.
///
/// The memory store is refused because it would always be empty here.
fn open_service(path: Option<&Path>) -> CliResult<BlogService> {
    let config = QuillConfig::load(path)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    ensure_persistent_store(&config)?;
    build_service(&config).map_err(|err| CliError::new(t!("posts.init_failed", error = err)))
}

/// Rejects configurations whose posts would not outlive the process.
fn ensure_persistent_store(config: &QuillConfig) -> CliResult<()> {
    if config.store.store_type == StoreType::Memory {
        return Err(CliError::new(t!("posts.store.memory")));
    }
    Ok(())
}

/// Converts a raw CLI id into a post id.
fn parse_post_id(raw: i64) -> CliResult<PostId> {
    PostId::from_raw(raw).ok_or_else(|| CliError::new(t!("posts.id.invalid", id = raw)))
}

/// Writes one stderr warning per image that could not be removed.
fn report_cleanup(cleanup: &CleanupReport) -> CliResult<()> {
    for warning in cleanup.warnings() {
        write_stderr_line(&t!(
            "posts.delete.cleanup_warning",
            path = warning.image_path,
            error = warning.error
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes text to stdout as-is.
fn write_stdout_raw(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
