//! WebFinger server binary.
//!
//! ```text
//!  GET /.well-known/webfinger?resource=acct:alice@example.com
//!      │
//!      ▼
//!  ┌──────────┐    ┌────────────────┐    ┌──────────────────┐
//!  │   http   │───▶│    resolver    │───▶│   ConfigStore    │
//!  │  server  │◀───│     engine     │◀───│ (ArcSwap<Snap>)  │
//!  └──────────┘    └────────────────┘    └────────▲─────────┘
//!                                                 │ reload
//!                                        ┌────────┴─────────┐
//!                                        │ reloader (tick,  │
//!                                        │ SIGHUP, watcher) │
//!                                        └──────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use webfinger_server::config::loader::{finalize_settings, load_settings};
use webfinger_server::config::{ConfigStore, FileSource, ServerConfig, SettingsError};
use webfinger_server::lifecycle::startup;
use webfinger_server::observability::logging;

#[derive(Parser)]
#[command(name = "webfinger-server", version)]
#[command(about = "WebFinger (RFC 7033) discovery server", long_about = None)]
struct Cli {
    /// TOML settings file.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Resource file (YAML, TOML or JSON).
    #[arg(short, long, value_name = "FILE", env = "WEBFINGER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Seconds between resource reloads.
    #[arg(long, value_name = "SECS")]
    reload_interval: Option<u64>,

    /// Also reload when the resource file changes.
    #[arg(long)]
    watch: bool,

    /// Answer 400 instead of using the default subject when `resource` is missing.
    #[arg(long)]
    require_resource: bool,

    #[arg(long)]
    log_level: Option<String>,

    /// Enable the Prometheus endpoint on this address.
    #[arg(long, value_name = "ADDR")]
    metrics_address: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default)
    Serve,
    /// Load the resource file once and report what it contains
    Check,
}

impl Cli {
    /// Settings file (or defaults) with command-line overrides applied.
    fn server_config(&self) -> Result<ServerConfig, SettingsError> {
        let mut config = match &self.settings {
            Some(path) => load_settings(path)?,
            None => ServerConfig::default(),
        };

        if let Some(path) = &self.config {
            config.resources.path = path.clone();
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(secs) = self.reload_interval {
            config.resources.reload_interval_secs = secs;
        }
        if self.watch {
            config.resources.watch = true;
        }
        if self.require_resource {
            config.http.require_resource = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr.clone();
        }

        finalize_settings(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.server_config()?;

    logging::init(&config.observability.log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("webfinger-server v{} starting", env!("CARGO_PKG_VERSION"));
            tracing::info!(
                bind_address = %config.listener.bind_address(),
                resources = %config.resources.path.display(),
                reload_interval_secs = config.resources.reload_interval_secs,
                watch = config.resources.watch,
                "Configuration loaded"
            );
            startup::run(config).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Check => {
            let source = FileSource::new(&config.resources.path);
            let snapshot = ConfigStore::load(&source)?;
            println!("{}: {} resources", config.resources.path.display(), snapshot.len());
            for id in snapshot.resource_ids() {
                println!("  {id}");
            }
            match snapshot.default_subject() {
                Some(subject) => println!("default subject: {subject}"),
                None => println!("default subject: (none)"),
            }
        }
    }

    Ok(())
}
