//! Google Maps geocoding transport.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::land_registry::{GeoPoint, Geocoder, TransportError};

pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

pub struct GoogleGeocoder {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(http: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }
}

/// Location of the best match.
fn first_location(response: GeocodeResponse) -> Result<GeoPoint, TransportError> {
    response
        .results
        .into_iter()
        .next()
        .map(|result| result.geometry.location)
        .ok_or_else(|| {
            TransportError::Unexpected(format!("No geocoding results (status {})", response.status))
        })
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeoPoint, TransportError> {
        let mut params = vec![("address", address)];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        let response = self.http.get(&self.url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        first_location(response.json().await?)
    }
}
