//! Mock API server.
//!
//! ```text
//!   mappings/*.json ──▶ mapping loader ──▶ RouteTable ──▶ ReloadableRouter
//!                            ▲                                  │
//!        POST /__admin/reload│ SIGHUP │ file watcher            ▼
//!                            └──────── Reloader        Client ◀─ dispatch
//! ```

use std::path::PathBuf;

use clap::Parser;

use mock_api::config::{load_config, validate_config, ConfigError, MockConfig};
use mock_api::lifecycle::{self, signals, Shutdown};
use mock_api::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "mock-api")]
#[command(about = "Serve canned HTTP responses from JSON mapping files", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Mapping directory, overriding the config file.
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Path prefix for every route, overriding the config file.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Reload automatically when mapping files change.
    #[arg(short, long)]
    watch: bool,
}

impl Args {
    fn apply(self, config: &mut MockConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(dir) = self.mappings {
            config.mappings.dir = dir;
        }
        if let Some(prefix) = self.prefix {
            config.mappings.prefix = prefix;
        }
        if self.watch {
            config.mappings.watch = true;
        }
    }
}

/// Config file (or defaults), then CLI overrides, then validation.
fn resolve_config(args: Args) -> Result<MockConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MockConfig::default(),
    };
    args.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Args::parse())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mock-api starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run(config: MockConfig) -> Result<(), Box<dyn std::error::Error>> {
    let listener_config = config.listener.clone();
    let server = lifecycle::bootstrap(config)?;
    let listener = lifecycle::bind(&listener_config).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, receiver).await?;
    Ok(())
}
