//! API mock sniffer - development server.
//!
//! ```text
//!   Client ──▶ request-id / trace ──▶ sniff ──┬─ not admitted ──▶ static files / 404
//!                                             ├─ mock exists  ──▶ {root}{path}.js
//!                                             └─ otherwise    ──▶ remote origin
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use api_mock_sniffer::config::{load_config, validate_config, ConfigError, RouteSetting, SnifferConfig};
use api_mock_sniffer::lifecycle::{signals, Shutdown};
use api_mock_sniffer::observability::{logging, metrics};
use api_mock_sniffer::HttpServer;

#[derive(Parser, Debug)]
#[command(
    name = "api-mock-sniffer",
    about = "Serve API mocks from disk and forward everything else to a real origin",
    version
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Remote origin base URL
    #[arg(short, long)]
    remote: Option<String>,

    /// Mock resource root directory
    #[arg(long)]
    root: Option<String>,

    /// Intercept paths starting with this prefix
    #[arg(long, conflicts_with = "route_pattern")]
    route: Option<String>,

    /// Intercept paths matching this regular expression
    #[arg(long)]
    route_pattern: Option<String>,

    /// Strip the route prefix before resolving paths
    #[arg(long)]
    use_virtual_route: bool,

    /// Explicit string stripped by virtual routing
    #[arg(long)]
    virtual_prefix: Option<String>,

    /// Silence dispatcher diagnostics
    #[arg(short, long)]
    silence: bool,

    /// Serve passthrough requests from this directory
    #[arg(long)]
    static_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn apply(self, mut config: SnifferConfig) -> SnifferConfig {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(remote) = self.remote {
            config.remote = remote;
        }
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(prefix) = self.route {
            config.route = RouteSetting::Prefix(prefix);
        }
        if let Some(pattern) = self.route_pattern {
            config.route = RouteSetting::Pattern { pattern };
        }
        if self.use_virtual_route {
            config.use_virtual_route = true;
        }
        if let Some(prefix) = self.virtual_prefix {
            config.virtual_prefix = Some(prefix);
        }
        if self.silence {
            config.silence = true;
        }
        if let Some(dir) = self.static_dir {
            config.server.static_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let print_config = args.print_config;
    let validate = args.validate;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SnifferConfig::default(),
    };
    let config = args.apply(config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    if print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }
    if validate {
        println!("Configuration is valid");
        return Ok(());
    }

    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        remote = %config.remote,
        root = %config.root,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.server.bind_address.clone();
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_ctrl_c(Arc::clone(&shutdown)));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
