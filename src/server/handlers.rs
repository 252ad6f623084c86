use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    aggregation::{DisplayData, Viewport, tier::window_start},
    land_registry::{LandRegistryError, format_postcode},
    query_builder::{Attribute, ConstraintSet},
};

use super::{
    AppState,
    models::{AveragePriceResponse, ErrorResponse, RefreshResponse, TransactionsResponse},
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Constraints limited to the configured sales window.
fn recent_sales(app_state: &AppState) -> ConstraintSet {
    let mut constraints = ConstraintSet::new();
    constraints.set_min_date(window_start(
        Utc::now().date_naive(),
        app_state.service.settings().transaction_window_years,
    ));
    constraints
}

fn reject(error: impl Into<LandRegistryError>) -> HandlerError {
    let error = error.into();
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    if status.is_server_error() {
        log::error!("Request failed: {}", error);
    } else {
        log::debug!("Rejected request: {}", error);
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            error_type: error.error_type().to_string(),
        }),
    )
}

/// Simple health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "landmap",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Latest sale of every address in a postcode, within the sales window.
pub async fn transactions_by_postcode(
    State(app_state): State<Arc<AppState>>,
    Path(postcode): Path<String>,
) -> Result<Json<TransactionsResponse>, HandlerError> {
    let start_time = Instant::now();
    let postcode = format_postcode(&postcode).map_err(reject)?;

    let mut constraints = recent_sales(&app_state);
    constraints
        .set_equality(Attribute::Postcode, &postcode)
        .map_err(reject)?;
    let transactions = app_state
        .service
        .get_latest_transactions(constraints, &Attribute::ALL)
        .await
        .map_err(reject)?;

    log::info!(
        "Transactions for {}: {} records in {:.3}ms",
        postcode,
        transactions.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    }))
}

/// Latest sale of every address in a town, within the sales window.
pub async fn transactions_by_town(
    State(app_state): State<Arc<AppState>>,
    Path(town): Path<String>,
) -> Result<Json<TransactionsResponse>, HandlerError> {
    let start_time = Instant::now();
    let mut constraints = recent_sales(&app_state);
    constraints
        .set_equality(Attribute::Town, &town)
        .map_err(reject)?;
    let transactions = app_state
        .service
        .get_latest_transactions(constraints, &Attribute::ALL)
        .await
        .map_err(reject)?;

    log::info!(
        "Transactions for town {}: {} records in {:.3}ms",
        town,
        transactions.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    }))
}

pub async fn average_price_handler(
    State(app_state): State<Arc<AppState>>,
    Path(postcode): Path<String>,
) -> Result<Json<AveragePriceResponse>, HandlerError> {
    let postcode = format_postcode(&postcode).map_err(reject)?;
    let prices = app_state
        .service
        .get_all_postcode_prices(std::slice::from_ref(&postcode))
        .await
        .map_err(reject)?;

    let average_price = prices.get(&postcode).copied().flatten();
    Ok(Json(AveragePriceResponse {
        postcode,
        average_price,
    }))
}

/// Tiered map data for the posted viewport.
pub async fn display_data_handler(
    State(app_state): State<Arc<AppState>>,
    Json(viewport): Json<Viewport>,
) -> Result<Json<DisplayData>, HandlerError> {
    let start_time = Instant::now();
    let data = app_state
        .service
        .get_display_data(&viewport)
        .await
        .map_err(reject)?;

    log::info!(
        "Display data: {:?} tier, {} items in {:.3}ms",
        data.tier(),
        data.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(Json(data))
}

pub async fn refresh_postcodes_handler(
    State(app_state): State<Arc<AppState>>,
    Path(prefix): Path<String>,
) -> Result<Json<RefreshResponse>, HandlerError> {
    let updated = app_state
        .service
        .update_postcode_database(&prefix)
        .await
        .map_err(reject)?;

    Ok(Json(RefreshResponse {
        prefix: prefix.trim().to_uppercase(),
        updated,
    }))
}
