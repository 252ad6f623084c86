//! Remote collaborators the service depends on.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::TransportError;
use crate::aggregation::{PostcodeAggregate, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// SPARQL endpoint returning the standard JSON results shape.
#[async_trait]
pub trait QueryEndpoint: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Value, TransportError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<GeoPoint, TransportError>;
}

/// Postcode coordinates with cached average prices.
#[async_trait]
pub trait CoordinateStore: Send + Sync {
    /// Bucketed postcodes inside `viewport`.
    async fn query_in_boundaries(
        &self,
        viewport: &Viewport,
        sorted: bool,
    ) -> Result<Vec<PostcodeAggregate>, TransportError>;

    /// Store new average prices; returns how many rows actually changed.
    async fn update_average_price(
        &self,
        prices: &HashMap<String, i64>,
    ) -> Result<usize, TransportError>;

    /// Postcodes starting with `prefix`, keyed by the postcode minus its last
    /// `truncate` characters.
    async fn matching_postcodes(
        &self,
        prefix: &str,
        restrict_to_unset: bool,
        truncate: usize,
    ) -> Result<HashMap<String, Vec<String>>, TransportError>;
}
