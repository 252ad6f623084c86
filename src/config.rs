use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::aggregation::bucketing::DEFAULT_RESULT_COUNT;
use crate::aggregation::tier::{DEFAULT_ADDRESS_TIER_MAX, DEFAULT_POINT_TIER_MAX};
use crate::aggregation::TierThresholds;
use crate::land_registry::service::{
    DEFAULT_MAX_GEOCODE_ADDRESSES, DEFAULT_TRANSACTION_WINDOW_YEARS,
};
use crate::land_registry::ServiceSettings;
use crate::server::geocoder::DEFAULT_GEOCODE_URL;
use crate::server::sparql_client::DEFAULT_SPARQL_ENDPOINT;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Server configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
#[validate(schema(function = "validate_tier_order"))]
pub struct ServerConfig {
    /// HTTP server host address
    #[validate(length(min = 1, message = "HTTP host cannot be empty"))]
    pub http_host: String,

    /// HTTP server port (1-65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "HTTP port must be between 1 and 65535"
    ))]
    pub http_port: u16,

    /// Land Registry SPARQL endpoint
    #[validate(url(message = "SPARQL endpoint must be a URL"))]
    pub sparql_endpoint: String,

    /// Geocoding endpoint (Google geocode JSON API)
    #[validate(url(message = "Geocode URL must be a URL"))]
    pub geocode_url: String,

    pub geocode_api_key: Option<String>,

    /// Largest postcode count served as individual addresses
    #[validate(range(min = 1, message = "Address tier maximum must be positive"))]
    pub address_tier_max: usize,

    /// Postcode count from which a heatmap is served
    pub point_tier_max: usize,

    /// Target number of postcode buckets per viewport
    #[validate(range(
        min = 1,
        max = 100000,
        message = "Bucket result count must be between 1 and 100000"
    ))]
    pub bucket_result_count: usize,

    /// Maximum addresses geocoded for one request
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Max geocode addresses must be between 1 and 1000"
    ))]
    pub max_geocode_addresses: usize,

    /// How far back address-level sales are looked up
    #[validate(range(
        min = 1,
        max = 50,
        message = "Transaction window must be between 1 and 50 years"
    ))]
    pub transaction_window_years: u32,

    /// Timeout for each remote call, in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Request timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_secs: u64,

    /// File replacing the built-in SPARQL prefix block
    pub query_prologue_path: Option<PathBuf>,
}

fn validate_tier_order(config: &ServerConfig) -> Result<(), ValidationError> {
    if config.address_tier_max >= config.point_tier_max {
        let mut error = ValidationError::new("tier_order");
        error.message = Some("Address tier maximum must be below point tier maximum".into());
        return Err(error);
    }
    Ok(())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            sparql_endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            geocode_api_key: None,
            address_tier_max: DEFAULT_ADDRESS_TIER_MAX,
            point_tier_max: DEFAULT_POINT_TIER_MAX,
            bucket_result_count: DEFAULT_RESULT_COUNT,
            max_geocode_addresses: DEFAULT_MAX_GEOCODE_ADDRESSES,
            transaction_window_years: DEFAULT_TRANSACTION_WINDOW_YEARS,
            request_timeout_secs: 10,
            query_prologue_path: None,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            http_host: env::var("LANDMAP_HOST").unwrap_or(defaults.http_host),
            http_port: parse_env_var("LANDMAP_PORT", "8080")?,
            sparql_endpoint: env::var("LANDMAP_SPARQL_ENDPOINT")
                .unwrap_or(defaults.sparql_endpoint),
            geocode_url: env::var("LANDMAP_GEOCODE_URL").unwrap_or(defaults.geocode_url),
            geocode_api_key: env::var("LANDMAP_GEOCODE_API_KEY").ok(),
            address_tier_max: parse_env_var(
                "LANDMAP_ADDRESS_TIER_MAX",
                &defaults.address_tier_max.to_string(),
            )?,
            point_tier_max: parse_env_var(
                "LANDMAP_POINT_TIER_MAX",
                &defaults.point_tier_max.to_string(),
            )?,
            bucket_result_count: parse_env_var(
                "LANDMAP_BUCKET_RESULT_COUNT",
                &defaults.bucket_result_count.to_string(),
            )?,
            max_geocode_addresses: parse_env_var(
                "LANDMAP_MAX_GEOCODE_ADDRESSES",
                &defaults.max_geocode_addresses.to_string(),
            )?,
            transaction_window_years: parse_env_var(
                "LANDMAP_TRANSACTION_WINDOW_YEARS",
                &defaults.transaction_window_years.to_string(),
            )?,
            request_timeout_secs: parse_env_var(
                "LANDMAP_REQUEST_TIMEOUT_SECS",
                &defaults.request_timeout_secs.to_string(),
            )?,
            query_prologue_path: env::var("LANDMAP_QUERY_PROLOGUE_PATH")
                .ok()
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
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
            query_prologue_path: cli.query_prologue_path,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tier_thresholds(&self) -> TierThresholds {
        TierThresholds {
            address_max: self.address_tier_max,
            point_max: self.point_tier_max,
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            thresholds: self.tier_thresholds(),
            max_geocode_addresses: self.max_geocode_addresses,
            transaction_window_years: self.transaction_window_years,
            request_timeout: self.request_timeout(),
            ..Default::default()
        }
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub http_host: String,
    pub http_port: u16,
    pub sparql_endpoint: String,
    pub geocode_url: String,
    pub geocode_api_key: Option<String>,
    pub address_tier_max: usize,
    pub point_tier_max: usize,
    pub bucket_result_count: usize,
    pub max_geocode_addresses: usize,
    pub transaction_window_years: u32,
    pub request_timeout_secs: u64,
    pub query_prologue_path: Option<PathBuf>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
