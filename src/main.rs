//! piagen - WireGuard config generator for Private Internet Access
//!
//! Serves a small web form that exchanges PIA credentials for a ready-to-use
//! WireGuard configuration file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use piagen_api::{ApiServer, ApiServerConfig};
use piagen_core::Provisioner;
use piagen_provider::{PiaClient, PiaClientConfig, ProviderClient, DEFAULT_SERVERLIST_URL};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// piagen - Generate WireGuard configs for Private Internet Access
#[derive(Parser, Debug)]
#[command(name = "piagen")]
#[command(about = "piagen - Generate WireGuard configs for Private Internet Access")]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Server list URL
    #[arg(long, global = true, env = "PIAGEN_SERVERLIST_URL", default_value = DEFAULT_SERVERLIST_URL)]
    serverlist_url: String,

    /// PEM file with the CA that signs PIA's servers (ca.rsa.4096.crt)
    #[arg(long, global = true, env = "PIAGEN_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Timeout for each request to PIA, in seconds
    #[arg(long, global = true, env = "PIAGEN_PROVIDER_TIMEOUT", default_value = "30")]
    provider_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web service
    #[command(long_about = r#"
Run the web service. The landing page at / lets users pick a region and
download a WireGuard config; /regions and /generate back it.

EXAMPLES:
  # Listen on the default port with the PIA CA
  piagen serve --ca-cert ./ca.rsa.4096.crt

  # Bind locally and keep temporary configs in a dedicated directory
  piagen serve --bind 127.0.0.1:8080 --artifact-dir /run/piagen

ENVIRONMENT VARIABLES:
  PIAGEN_BIND               Address to listen on
  PIAGEN_ARTIFACT_DIR       Directory for temporary config files
  PIAGEN_CORS               Enable permissive CORS
  PIAGEN_SERVERLIST_URL     Server list URL
  PIAGEN_CA_CERT            PIA CA certificate (PEM)
  PIAGEN_PROVIDER_TIMEOUT   Per-request timeout towards PIA, in seconds
    "#)]
    Serve {
        /// Address to listen on
        #[arg(long, env = "PIAGEN_BIND", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,

        /// Directory for temporary config files (defaults to the system temp dir)
        #[arg(long, env = "PIAGEN_ARTIFACT_DIR")]
        artifact_dir: Option<PathBuf>,

        /// Enable permissive CORS
        #[arg(long, env = "PIAGEN_CORS")]
        cors: bool,
    },

    /// Print the available regions and exit
    Regions,
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Build the live PIA client from CLI options
fn build_provider(cli: &Cli) -> Result<PiaClient> {
    let ca_cert_pem = match &cli.ca_cert {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("Failed to read CA certificate: {}", path.display()))?,
        ),
        None => None,
    };

    let config = PiaClientConfig {
        serverlist_url: cli.serverlist_url.clone(),
        ca_cert_pem,
        timeout: Duration::from_secs(cli.provider_timeout),
    };

    PiaClient::new(config).context("Failed to create PIA client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let provider: Arc<dyn ProviderClient> = Arc::new(build_provider(&cli)?);

    match cli.command {
        Commands::Serve {
            bind,
            artifact_dir,
            cors,
        } => {
            info!("piagen {} starting...", env!("CARGO_PKG_VERSION"));

            if cli.ca_cert.is_none() {
                info!("No CA certificate configured; PIA servers must chain to a system root");
            }

            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: cors,
                artifact_dir: artifact_dir.unwrap_or_else(std::env::temp_dir),
            };

            let server = ApiServer::new(config, provider);

            // Setup Ctrl+C handler
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, shutting down...");
                }
                result = server.start() => {
                    if let Err(e) = result {
                        error!("Server error: {:#}", e);
                        return Err(e);
                    }
                }
            }

            info!("piagen stopped");
            Ok(())
        }
        Commands::Regions => {
            let regions = Provisioner::new(provider)
                .list_regions()
                .await
                .context("Failed to list regions")?;

            for region in regions {
                println!("{}", region);
            }
            Ok(())
        }
    }
}
