//! toolwire MCP server and client — entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::net::TcpListener;

use toolwire::{CapabilityKind, ClientConfig, Server, ServerCapabilities};
use toolwire_mcp::config::{resolve_addr, resolve_timeout, resolve_url};
use toolwire_mcp::{build_registry, demo, repl, server_config};

#[derive(Parser)]
#[command(
    name = "toolwire-mcp",
    about = "MCP server and client built on the toolwire protocol engine",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over WebSocket (default).
    Serve {
        /// Listen address (host:port). Also reads TOOLWIRE_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Serve a single session over stdin/stdout instead.
        #[arg(long)]
        stdio: bool,

        /// Expose every regular file in this directory as a resource.
        #[arg(long)]
        resource_dir: Option<PathBuf>,
    },

    /// Run the scripted client walk-through against a server.
    Demo {
        /// Server URL. Also reads TOOLWIRE_URL.
        #[arg(long)]
        url: Option<String>,

        /// Per-request timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Launch the interactive client REPL.
    Repl {
        /// Server URL. Also reads TOOLWIRE_URL.
        #[arg(long)]
        url: Option<String>,

        /// Per-request timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print server info and capabilities as JSON.
    Info {
        /// Include resources from this directory.
        #[arg(long)]
        resource_dir: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   toolwire-mcp completions bash > ~/.local/share/bash-completion/completions/toolwire-mcp
    ///   toolwire-mcp completions zsh > ~/.zfunc/_toolwire-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        stdio: false,
        resource_dir: None,
    }) {
        Commands::Serve {
            addr,
            stdio,
            resource_dir,
        } => {
            let registry = build_registry(resource_dir.as_deref())?;
            let server = Server::new(registry, server_config());

            if stdio {
                server.serve_stdio().await?;
            } else {
                let addr = resolve_addr(addr.as_deref());
                let listener = TcpListener::bind(&addr).await?;
                server.serve_websocket(listener).await?;
            }
        }

        Commands::Demo { url, timeout_ms } => {
            let url = resolve_url(url.as_deref());
            let config = ClientConfig::default().with_timeout(resolve_timeout(timeout_ms));
            demo::run(&url, config).await?;
        }

        Commands::Repl { url, timeout_ms } => {
            let url = resolve_url(url.as_deref());
            let config = ClientConfig::default().with_timeout(resolve_timeout(timeout_ms));
            let runtime = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || repl::run(runtime, &url, config)).await??;
        }

        Commands::Info { resource_dir } => {
            let registry = build_registry(resource_dir.as_deref())?;
            let config = server_config();
            let names = |kind: CapabilityKind| -> Vec<String> {
                registry
                    .list(kind)
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect()
            };
            let info = serde_json::json!({
                "server": config.server_info,
                "protocol_versions": config.supported_versions,
                "capabilities": ServerCapabilities::for_kinds(&config.offered),
                "tools": names(CapabilityKind::Tool),
                "resources": names(CapabilityKind::Resource),
                "prompts": names(CapabilityKind::Prompt),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "toolwire-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
