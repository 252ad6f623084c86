use clickhouse::Row;
use serde::{Deserialize, Serialize};

use crate::land_registry::LandRegistryData;

/// Error body returned by every handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error type: "InvalidConstraint", "TooManyAddresses", "TransportError", ...
    pub error_type: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub count: usize,
    pub transactions: Vec<LandRegistryData>,
}

#[derive(Debug, Serialize)]
pub struct AveragePriceResponse {
    pub postcode: String,
    /// Rounded average of the latest sale price per address, `null` when the
    /// postcode has no recorded sales.
    pub average_price: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub prefix: String,
    pub updated: usize,
}

// ClickHouse rows for the postcode coordinate table

#[derive(Debug, Row, Deserialize)]
pub struct BucketRow {
    pub postcode_aggregate: String,
    pub avg_lat: f64,
    pub avg_lon: f64,
    pub avg_price: f64,
    pub radius: f64,
}

#[derive(Debug, Row, Deserialize)]
pub struct CountRow {
    pub rows: u64,
}

#[derive(Debug, Row, Deserialize)]
pub struct PostcodeRow {
    pub postcode: String,
}

#[derive(Debug, Row, Deserialize)]
pub struct PostcodePriceRow {
    pub postcode: String,
    pub averageprice: i64,
}
