//! HTTP transport for the Land Registry SPARQL endpoint.
//!
//! The public endpoint sits behind a Qonsole front end, which may wrap the
//! standard JSON results in `{"result": "<json text>"}`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::land_registry::{QueryEndpoint, TransportError};

pub const DEFAULT_SPARQL_ENDPOINT: &str = "http://landregistry.data.gov.uk/app/root/qonsole/query";

/// Dataset path the Qonsole front end forwards queries to.
const QONSOLE_DATASET: &str = "/landregistry/query";

pub struct SparqlClient {
    http: Client,
    endpoint: String,
}

impl SparqlClient {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

/// Return the results document, unwrapping a Qonsole envelope if present.
pub(crate) fn unwrap_envelope(body: Value) -> Result<Value, TransportError> {
    match body {
        Value::Object(mut map) if map.contains_key("result") => match map.remove("result") {
            Some(Value::String(inner)) => serde_json::from_str(&inner).map_err(|e| {
                TransportError::Unexpected(format!("Failed to parse SPARQL result payload: {}", e))
            }),
            Some(inner) => Ok(inner),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

#[async_trait]
impl QueryEndpoint for SparqlClient {
    async fn execute(&self, query: &str) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("output", "json"),
                ("q", query),
                ("url", QONSOLE_DATASET),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        unwrap_envelope(body)
    }
}
