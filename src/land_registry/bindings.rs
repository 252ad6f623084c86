//! Decoding of SPARQL JSON result bindings
//!
//! ```json
//! {"results": {"bindings": [{"postcode": {"type": "literal", "value": "BN23 7LQ"}}]}}
//! ```
//!
//! Every bound variable must name a catalog attribute, otherwise the row is
//! reported as a malformed response. Aggregate outputs such
//! as `TransactionDate` decode to the attribute they were computed from.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::errors::LandRegistryError;
use super::record::LandRegistryData;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, BoundValue>>,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    value: String,
}

pub fn decode_bindings(response: &Value) -> Result<Vec<LandRegistryData>, LandRegistryError> {
    let parsed = SparqlResponse::deserialize(response)
        .map_err(|e| LandRegistryError::MalformedResponse(e.to_string()))?;

    parsed
        .results
        .bindings
        .into_iter()
        .map(|row| {
            let mut record = LandRegistryData::new();
            for (name, bound) in row {
                record.set_named(&name, &bound.value).map_err(|e| {
                    LandRegistryError::MalformedResponse(format!("field `{}`: {}", name, e))
                })?;
            }
            Ok(record)
        })
        .collect()
}
