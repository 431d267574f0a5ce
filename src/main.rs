use anyhow::Result;
use clap::Parser;
use improvado_mcp::auth::{AuthorizationEngine, InMemoryAuthorizationEngine};
use improvado_mcp::mcp::GatewayServer;
use improvado_mcp::{Config, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Subscriber};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (text, json); overrides the config file
    #[arg(long)]
    log_format: Option<String>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config loading logs through a bootstrap subscriber until the configured one is installed
    let bootstrap = bootstrap_subscriber(cli.log_level.as_deref().unwrap_or("info"))?;
    let config = tracing::subscriber::with_default(bootstrap, || {
        Config::load(&cli.config, cli.host, cli.port).map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })
    })?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    init_logging(level, format)?;

    info!("Improvado MCP v{}", improvado_mcp::VERSION);
    info!("Verification service: {}", config.verification.base_url);
    info!("Notion API: {} (version {})", config.notion.base_url, config.notion.version);

    // Grants live in process memory; a restart requires clients to authorize again
    let engine: Arc<dyn AuthorizationEngine> = Arc::new(InMemoryAuthorizationEngine::new());
    let server = GatewayServer::from_config(&config, engine).map_err(|e| {
        error!("Failed to initialize gateway: {}", e);
        e
    })?;

    server.start(&config.server.host, config.server.port).await?;
    Ok(())
}

fn log_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?)
}

/// Text subscriber used only while the configuration is being loaded
fn bootstrap_subscriber(level: &str) -> Result<impl Subscriber + Send + Sync> {
    Ok(tracing_subscriber::fmt()
        .with_env_filter(log_filter(level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish())
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = log_filter(level)?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}
