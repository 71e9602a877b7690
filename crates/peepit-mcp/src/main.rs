//! PeepIt MCP server
//!
//! A Model Context Protocol server that gives AI agents screen capture,
//! window listing and image analysis through the native `peepit` helper.
//!
//! # Usage
//!
//! ```bash
//! peepit-mcp [--log-file <path>] [--log-level <level>] [--cli-path <path>]
//! ```
//!
//! # Environment Variables
//!
//! - `PEEPIT_AI_PROVIDERS`: Vision providers, e.g. `ollama/llava:latest,openai/gpt-4o`
//! - `PEEPIT_LOG_LEVEL`: `trace|debug|info|warn|error|fatal|silent` (default: `info`)
//! - `PEEPIT_LOG_FILE`: Log file location (default: platform log directory)
//! - `PEEPIT_CONSOLE_LOGGING`: `true` mirrors logs to stderr
//! - `PEEPIT_CLI_PATH`: Native helper executable (default: `peepit`)
//!
//! # Protocol
//!
//! The server communicates via JSON-RPC 2.0 over stdio:
//! - Requests/responses go through stdout
//! - Logs go to a file, optionally mirrored to stderr

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use peepit_mcp::logging::{self, LogLevel};
use peepit_mcp::{Lifecycle, PeepItMcpServer, ProcessEnv, ServerConfig, transport};

/// How long pending blocking work (the stdin reader) may delay exit
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// MCP server for PeepIt
#[derive(Parser)]
#[command(name = "peepit-mcp")]
#[command(about = "MCP server for PeepIt screen capture and image analysis")]
#[command(version)]
struct Args {
    /// Log file path (overrides PEEPIT_LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Minimum log level (overrides PEEPIT_LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    /// Native helper executable (overrides PEEPIT_CLI_PATH)
    #[arg(long)]
    cli_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = ServerConfig::from_env(&ProcessEnv);
    if let Some(path) = args.log_file {
        config.log.primary_path = path;
    }
    if let Some(level) = args.log_level.as_deref() {
        config.log.min_level = LogLevel::parse(Some(level));
    }
    if let Some(path) = args.cli_path {
        config.cli_path = path;
    }

    let logging = logging::init(&config.log);
    if let (Some(error), false) = (logging.file_error(), config.log.console_enabled) {
        // Nothing else would report it with the file sink gone
        eprintln!(
            "peepit-mcp: cannot open log file {}: {}",
            logging.destination().path.display(),
            error
        );
    }
    tracing::info!(
        version = %config.version,
        log_file = ?logging.path(),
        cli_path = %config.cli_path.display(),
        "Starting peepit-mcp server"
    );

    let mut lifecycle = Lifecycle::new();
    lifecycle.on_shutdown(move || logging.flush());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let outcome = lifecycle.fail_startup(format!("Failed to start async runtime: {}", e));
            return ExitCode::from(outcome.exit_code());
        }
    };

    let outcome = runtime.block_on(async move {
        if let Err(e) = lifecycle.install_signal_handlers() {
            return lifecycle.fail_startup(format!("Failed to install signal handlers: {}", e));
        }

        let server = match PeepItMcpServer::from_config(config, Arc::new(ProcessEnv)) {
            Ok(server) => server,
            Err(e) => return lifecycle.fail_startup(format!("Failed to build server: {}", e)),
        };

        let mut transport = transport::stdio();
        lifecycle.run(&server, &mut transport).await
    });

    // The stdin reader blocks in a background thread that never returns on its own
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    ExitCode::from(outcome.exit_code())
}
