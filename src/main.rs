use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use landmap::{config, server};

/// Landmap - Land Registry price-paid data for map clients
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load configuration from a YAML file instead of the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load configuration from LANDMAP_* environment variables instead of the flags below
    #[arg(long, conflicts_with = "config")]
    from_env: bool,

    /// HTTP server host address
    #[arg(long, default_value = "0.0.0.0")]
    http_host: String,

    /// HTTP server port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Land Registry SPARQL endpoint
    #[arg(long, default_value = server::sparql_client::DEFAULT_SPARQL_ENDPOINT)]
    sparql_endpoint: String,

    /// Geocoding endpoint
    #[arg(long, default_value = server::geocoder::DEFAULT_GEOCODE_URL)]
    geocode_url: String,

    /// Geocoding API key
    #[arg(long)]
    geocode_api_key: Option<String>,

    /// Largest postcode count served as individual addresses
    #[arg(long, default_value_t = 15)]
    address_tier_max: usize,

    /// Postcode count from which a heatmap is served
    #[arg(long, default_value_t = 500)]
    point_tier_max: usize,

    /// Target number of postcode buckets per viewport
    #[arg(long, default_value_t = 1000)]
    bucket_result_count: usize,

    /// Maximum addresses geocoded per request
    #[arg(long, default_value_t = 100)]
    max_geocode_addresses: usize,

    /// Years of sales history used at address level
    #[arg(long, default_value_t = 5)]
    transaction_window_years: u32,

    /// Timeout for each remote call, in seconds
    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// File replacing the built-in SPARQL prefix block
    #[arg(long)]
    query_prologue: Option<PathBuf>,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            http_host: cli.http_host,
            http_port: cli.http_port,
            sparql_endpoint: cli.sparql_endpoint,
            geocode_url: cli.geocode_url,
            geocode_api_key: cli.geocode_api_key,
            address_tier_max: cli.address_tier_max,
            point_tier_max: cli.point_tier_max,
            bucket_result_count: cli.bucket_result_count,
            max_geocode_addresses: cli.max_geocode_addresses,
            transaction_window_years: cli.transaction_window_years,
            request_timeout_secs: cli.request_timeout_secs,
            query_prologue_path: cli.query_prologue,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    log::info!("Landmap v{}", env!("CARGO_PKG_VERSION"));

    let config = match cli.config.clone() {
        Some(path) => config::ServerConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None if cli.from_env => {
            dotenvy::dotenv().ok();
            config::ServerConfig::from_env().context("Invalid environment configuration")?
        }
        None => config::ServerConfig::from_cli(cli.into()).context("Invalid configuration")?,
    };

    server::run_with_config(config).await;
    Ok(())
}
