//! crawl4ai-mcp: MCP server for the Crawl4AI web-crawling backend
//!
//! Exposes Crawl4AI crawling operations as MCP tools over stdio, SSE or
//! streamable HTTP. All crawling happens in the remote backend; this process
//! translates between the two protocols.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crawl4ai_mcp::backend::Crawl4aiClient;
use crawl4ai_mcp::config::{self, Settings};
use crawl4ai_mcp::mcp::http;
use crawl4ai_mcp::mcp::server::McpServer;
use crawl4ai_mcp::tools::default_registry;

/// MCP server for the Crawl4AI web-crawling backend.
///
/// Universal web crawling and data extraction through MCP: markdown and HTML
/// extraction, screenshots, PDF generation, JavaScript execution and bulk
/// crawling, proxied to a remote Crawl4AI instance.
#[derive(Parser, Debug)]
#[command(name = "crawl4ai-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in STDIO mode for command-line MCP clients
    #[arg(long, group = "mode")]
    stdio: bool,

    /// Run in SSE mode for web interfaces (default)
    #[arg(long, group = "mode")]
    sse: bool,

    /// Run in streamable HTTP mode
    #[arg(long, group = "mode")]
    http: bool,

    /// Crawl4AI API endpoint URL (overrides CRAWL4AI_ENDPOINT env var)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Bearer authentication token (overrides CRAWL4AI_BEARER_TOKEN env var)
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Listen port for the selected HTTP-based mode (overrides HTTP_PORT/SSE_PORT)
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// The selected run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Stdio,
    Sse,
    StreamableHttp,
}

impl Mode {
    /// Resolves the mode from the mutually exclusive CLI flags.
    ///
    /// SSE is the default when no flag is given.
    const fn from_args(args: &Args) -> Self {
        if args.stdio {
            Self::Stdio
        } else if args.http {
            Self::StreamableHttp
        } else {
            Self::Sse
        }
    }
}

/// Determines the log level from CLI arguments and settings.
fn get_log_level(verbose: u8, quiet: bool, settings: &Settings) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => {
            if settings.debug {
                return Level::DEBUG;
            }
            match settings.log_level.to_lowercase().as_str() {
                "trace" => Level::TRACE,
                "debug" => Level::DEBUG,
                "warn" => Level::WARN,
                "error" => Level::ERROR,
                // "info" and anything unrecognised
                _ => Level::INFO,
            }
        }
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr: stdout belongs to the MCP stdio framing.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the crawl4ai-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let overrides = config::Overrides {
        endpoint: args.endpoint.clone(),
        bearer_token: args.token.clone(),
    };
    let settings = match config::load_settings(overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!();
            eprintln!("Set the backend via environment variable or command line:");
            eprintln!("  export CRAWL4AI_ENDPOINT='https://your-crawl4ai-server.com'");
            eprintln!("  OR");
            eprintln!("  crawl4ai-mcp --endpoint https://your-crawl4ai-server.com");
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &settings);
    init_tracing(log_level);

    let mode = Mode::from_args(&args);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting crawl4ai-mcp server"
    );
    info!(endpoint = %settings.endpoint, "Crawl4AI backend configured");
    info!("Authentication: {}", settings.auth_description());
    info!("Available tools: md, html, screenshot, pdf, execute_js, crawl");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(mode, args.port, &settings));

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

/// Wires up the registry and runs the selected transport until shutdown.
async fn run(mode: Mode, port_override: Option<u16>, settings: &Settings) -> std::io::Result<()> {
    let client = Crawl4aiClient::new(settings).map_err(std::io::Error::other)?;
    let registry = Arc::new(default_registry(&Arc::new(client)));

    match mode {
        Mode::Stdio => {
            info!("Running in STDIO mode");
            McpServer::new(registry).run().await
        }
        Mode::Sse => {
            let port = port_override.unwrap_or(settings.sse_port);
            info!(port, "Running in SSE mode");
            http::run_sse(registry, settings, port).await
        }
        Mode::StreamableHttp => {
            let port = port_override.unwrap_or(settings.http_port);
            info!(port, "Running in StreamableHTTP mode");
            http::run_streamable_http(registry, settings, port).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(log_level: &str, debug: bool) -> Settings {
        let mut settings = Settings::from_lookup(|_| None).unwrap();
        settings.log_level = log_level.to_string();
        settings.debug = debug;
        settings
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn mode_defaults_to_sse() {
        let args = Args::parse_from(["crawl4ai-mcp"]);
        assert_eq!(Mode::from_args(&args), Mode::Sse);
    }

    #[test]
    fn mode_flags_are_mutually_exclusive() {
        assert!(Args::try_parse_from(["crawl4ai-mcp", "--stdio", "--http"]).is_err());
    }

    #[test]
    fn mode_flags_select_transport() {
        let args = Args::parse_from(["crawl4ai-mcp", "--stdio"]);
        assert_eq!(Mode::from_args(&args), Mode::Stdio);

        let args = Args::parse_from(["crawl4ai-mcp", "--http"]);
        assert_eq!(Mode::from_args(&args), Mode::StreamableHttp);
    }

    #[test]
    fn quiet_beats_everything() {
        assert_eq!(
            get_log_level(3, true, &settings_with("trace", true)),
            Level::ERROR
        );
    }

    #[test]
    fn verbosity_counts_raise_the_level() {
        let settings = settings_with("warn", false);
        assert_eq!(get_log_level(0, false, &settings), Level::WARN);
        assert_eq!(get_log_level(1, false, &settings), Level::INFO);
        assert_eq!(get_log_level(2, false, &settings), Level::DEBUG);
        assert_eq!(get_log_level(3, false, &settings), Level::TRACE);
    }

    #[test]
    fn debug_flag_widens_default_level() {
        assert_eq!(
            get_log_level(0, false, &settings_with("info", true)),
            Level::DEBUG
        );
    }
}
