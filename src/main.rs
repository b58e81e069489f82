//! dev-proxy: static dev server with selective backend proxying.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                  DEV SERVER                   │
//!                      │                                               │
//!   Client Request     │  ┌─────────┐    ┌──────────┐                  │
//!   ───────────────────┼─▶│  http   │───▶│ routing  │── Local ──▶ public/
//!                      │  │ server  │    │ RuleSet  │                  │
//!                      │  └─────────┘    └────┬─────┘                  │
//!                      │                      │ Proxy                  │
//!                      │                      ▼                        │
//!                      │               ┌──────────────┐                │
//!                      │               │   upstream   │── direct ──────┼──▶ Backend
//!                      │               │   clients    │── agent ───────┼──▶ Forward proxy
//!                      │               └──────────────┘                │
//!                      │                                               │
//!                      │  config · observability · lifecycle · net     │
//!                      └───────────────────────────────────────────────┘
//! ```
//!
//! The routing table is built once at startup. A malformed `proxy` setting
//! prints a message and exits non-zero before anything is bound.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;

use dev_proxy::config::validation::validate_config;
use dev_proxy::config::{self, ConfigError, DevServerConfig};
use dev_proxy::net::TcpProbe;
use dev_proxy::observability::logging;
use dev_proxy::routing::{ProxySpec, RuleSetBuilder};
use dev_proxy::{DevServer, Shutdown};

const DEFAULT_CONFIG_FILE: &str = "dev-proxy.toml";

#[derive(Parser, Debug)]
#[command(name = "dev-proxy")]
#[command(about = "Development server that proxies unknown requests to a backend", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./dev-proxy.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the `proxy` setting from this package.json instead
    #[arg(long)]
    package_json: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,

    /// Static file directory, overrides `public_dir`
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Single proxy target, overrides `proxy`
    #[arg(long)]
    proxy: Option<String>,

    /// Forward proxy (`host:port`), overrides `agent.address`
    #[arg(long)]
    agent: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dev-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("dev-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&cli, config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("dev-proxy: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Config file (explicit or default path) with CLI overrides applied.
fn resolve_config(cli: &Cli) -> Result<DevServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => DevServerConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(dir) = &cli.public_dir {
        config.public_dir = dir.clone();
    }
    if let Some(target) = &cli.proxy {
        config.proxy = Some(toml::Value::String(target.clone()));
    }
    if let Some(agent) = &cli.agent {
        config.agent.address = Some(agent.clone());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// The `proxy` setting: package.json wins over the config file.
fn resolve_proxy(cli: &Cli, config: &DevServerConfig) -> Result<Option<ProxySpec>, ConfigError> {
    match &cli.package_json {
        Some(path) => config::load_package_proxy(path),
        None => Ok(config::proxy_spec(config)?),
    }
}

async fn run(cli: &Cli, config: DevServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_dir = %config.public_dir.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            dev_proxy::observability::metrics::init_metrics(addr);
        }
    }

    let spec = resolve_proxy(cli, &config)?;
    let probe = TcpProbe::new(Duration::from_millis(config.agent.probe_timeout_ms));
    let rules = RuleSetBuilder::from_config(&config)
        .build(spec.as_ref(), &probe)
        .await?;

    match &rules {
        Some(rules) => tracing::info!(
            rules = rules.rules().len(),
            agent = rules.agent().map(|a| a.as_str()).unwrap_or("none"),
            "Proxy enabled"
        ),
        None => tracing::info!("No proxy configured, serving static files only"),
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    DevServer::new(config, rules)?.run(listener, receiver).await?;
    Ok(())
}
