//! ucode MCP server entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use ucode_mcp::config::{resolve_base_url, DEFAULT_DRAIN_TIMEOUT_SECS};
use ucode_mcp::protocol::Dispatcher;
use ucode_mcp::session::SessionManager;
use ucode_mcp::tools::ToolRegistry;
use ucode_mcp::transport::StdioTransport;
use ucode_mcp::ExecutionPolicy;
use ucode_tools::{UcodeClient, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(
    name = "ucode-mcp",
    about = "MCP server for the ucode public API",
    version
)]
struct Cli {
    /// How tools/call runs tools: `sync` awaits the result, `detached` answers at once.
    #[arg(long, global = true, value_enum, env = "UCODE_EXECUTION_POLICY", default_value_t = ExecutionPolicy::Detached)]
    execution: ExecutionPolicy,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// ucode API base URL. Also reads from BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Seconds to wait for detached tool executions on shutdown.
    #[arg(long, global = true, default_value_t = DEFAULT_DRAIN_TIMEOUT_SECS)]
    drain_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP (streamable HTTP on /mcp, legacy SSE on /sse).
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port). Defaults to 0.0.0.0:$PORT, or port 3001.
        #[arg(long)]
        addr: Option<String>,
    },

    /// Print server capabilities and tools as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   ucode-mcp completions bash > ~/.local/share/bash-completion/completions/ucode-mcp
    ///   ucode-mcp completions zsh > ~/.zfunc/_ucode-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let base_url = resolve_base_url(cli.base_url.as_deref());
    let client = UcodeClient::new(&base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
    let registry = Arc::new(ToolRegistry::builtin(&client));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let (dispatcher, manager) = build(registry, cli.execution, &base_url);
            let transport = StdioTransport::new(manager.clone());
            let served = transport.run().await;
            shutdown(&manager, &dispatcher, cli.drain_timeout_secs).await;
            served?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp { addr } => {
            use ucode_mcp::config::resolve_http_addr;
            use ucode_mcp::transport::HttpTransport;

            let (dispatcher, manager) = build(registry, cli.execution, &base_url);
            let addr = resolve_http_addr(addr.as_deref());
            let transport = HttpTransport::new(manager.clone());
            let served = transport.run(&addr).await;
            shutdown(&manager, &dispatcher, cli.drain_timeout_secs).await;
            served?;
        }

        Commands::Info => {
            let capabilities = ucode_mcp::types::InitializeResult::default_result();
            let tools = registry.list();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "execution": cli.execution.to_string(),
                "base_url": base_url,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "ucode-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn build(
    registry: Arc<ToolRegistry>,
    policy: ExecutionPolicy,
    base_url: &str,
) -> (Arc<Dispatcher>, Arc<SessionManager>) {
    tracing::info!("ucode MCP server");
    tracing::info!("API: {base_url}");
    tracing::info!("Tools: {}, execution: {policy}", registry.len());

    let dispatcher = Arc::new(Dispatcher::new(registry, policy));
    let manager = Arc::new(SessionManager::new(dispatcher.clone()));
    (dispatcher, manager)
}

async fn shutdown(manager: &SessionManager, dispatcher: &Dispatcher, drain_timeout_secs: u64) {
    manager.close_all();
    let aborted = dispatcher
        .detached()
        .drain(Duration::from_secs(drain_timeout_secs))
        .await;
    if aborted > 0 {
        tracing::warn!("{aborted} detached tool executions did not finish");
    }
}
