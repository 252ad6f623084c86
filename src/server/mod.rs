use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use dotenvy::dotenv;
use handlers::{
    average_price_handler, display_data_handler, health_check, refresh_postcodes_handler,
    transactions_by_postcode, transactions_by_town,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
};

use crate::config::ServerConfig;
use crate::land_registry::LandRegistryService;
use crate::query_builder::QueryTemplate;

mod clickhouse_client;
pub mod coordinate_store;
pub mod geocoder;
pub mod handlers;
pub mod models;
pub mod sparql_client;

/// Viewport bodies are tiny; anything larger is a mistake.
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LandRegistryService>,
    pub config: ServerConfig,
}

/// HTTP routes over `app_state`.
pub fn build_router(app_state: AppState) -> Router {
    // Long enough for a full address batch of sequential geocodes
    let request_timeout = app_state
        .config
        .request_timeout()
        .saturating_mul(app_state.config.max_geocode_addresses as u32 + 2);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/land-registry/transactions/{postcode}",
            get(transactions_by_postcode),
        )
        .route(
            "/land-registry/transactions/town/{town}",
            get(transactions_by_town),
        )
        .route(
            "/land-registry/average-prices/{postcode}",
            get(average_price_handler),
        )
        .route("/land-registry/display-data", post(display_data_handler))
        .route(
            "/land-registry/postcodes/{prefix}/refresh",
            post(refresh_postcodes_handler),
        )
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .with_state(Arc::new(app_state))
}

/// Load the SPARQL prologue once; every query shares it afterwards.
fn load_template(config: &ServerConfig) -> Result<QueryTemplate, std::io::Error> {
    match &config.query_prologue_path {
        Some(path) => {
            log::info!("Loading query prologue from {}", path.display());
            QueryTemplate::from_file(path)
        }
        None => Ok(QueryTemplate::default()),
    }
}

pub async fn run_with_config(config: ServerConfig) {
    dotenv().ok();

    log::info!(
        "Server configuration: http={}:{}, sparql={}, tiers={}/{}",
        config.http_host,
        config.http_port,
        config.sparql_endpoint,
        config.address_tier_max,
        config.point_tier_max
    );

    let Some(clickhouse) = clickhouse_client::try_get_client() else {
        log::error!("✗ ClickHouse client could not be created (missing env vars?)");
        log::error!("  Set CLICKHOUSE_URL, CLICKHOUSE_USER and CLICKHOUSE_DATABASE.");
        std::process::exit(1);
    };

    let http = match reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
    {
        Ok(http) => http,
        Err(e) => {
            log::error!("✗ Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let template = match load_template(&config) {
        Ok(template) => Arc::new(template),
        Err(e) => {
            log::error!("✗ Failed to load query prologue: {}", e);
            std::process::exit(1);
        }
    };

    let service = LandRegistryService::new(
        Arc::new(sparql_client::SparqlClient::new(
            http.clone(),
            config.sparql_endpoint.clone(),
        )),
        Arc::new(geocoder::GoogleGeocoder::new(
            http,
            config.geocode_url.clone(),
            config.geocode_api_key.clone(),
        )),
        Arc::new(coordinate_store::ClickHouseCoordinateStore::new(
            clickhouse,
            config.bucket_result_count,
        )),
        template,
        config.service_settings(),
    );

    let app_state = AppState {
        service: Arc::new(service),
        config: config.clone(),
    };
    let app = build_router(app_state);

    let http_bind_address = format!("{}:{}", config.http_host, config.http_port);
    log::info!("Starting HTTP server on {}", http_bind_address);

    let http_listener = match TcpListener::bind(&http_bind_address).await {
        Ok(listener) => {
            log::info!("Successfully bound HTTP listener to {}", http_bind_address);
            listener
        }
        Err(e) => {
            log::error!(
                "✗ FATAL: Failed to bind HTTP listener to {}: {}",
                http_bind_address,
                e
            );
            log::error!("  Is another process using port {}?", config.http_port);
            std::process::exit(1);
        }
    };

    let http_server = axum::serve(http_listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = http_server.await {
        log::error!("HTTP server fatal error: {:?}", e);
        std::process::exit(1);
    }
    log::info!("Server stopped");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down..."),
                    _ = tokio::signal::ctrl_c() => log::info!("Received SIGINT, shutting down..."),
                }
            }
            Err(e) => {
                log::error!("Failed to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Received shutdown signal, shutting down...");
    }
}
