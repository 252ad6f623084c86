use std::time::Duration;

use thiserror::Error;

use crate::heatmap::NormalizeError;
use crate::query_builder::QueryBuildError;

/// Failures talking to a remote collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ClickHouse query failed: {0}")]
    Database(#[from] clickhouse::error::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Unexpected(String),
}

#[derive(Debug, Error)]
pub enum LandRegistryError {
    #[error(transparent)]
    Query(#[from] QueryBuildError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Too many addresses to geocode: {count} (limit {limit})")]
    TooManyAddresses { count: usize, limit: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),
}

impl LandRegistryError {
    /// Whether the caller can fix the request; everything else is upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LandRegistryError::Query(_)
                | LandRegistryError::Normalize(_)
                | LandRegistryError::TooManyAddresses { .. }
                | LandRegistryError::InvalidViewport(_)
        )
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            LandRegistryError::Query(QueryBuildError::UnknownAttribute(_)) => "UnknownAttribute",
            LandRegistryError::Query(QueryBuildError::InvalidConstraint { .. }) => {
                "InvalidConstraint"
            }
            LandRegistryError::Normalize(NormalizeError::EmptyInput) => "EmptyInput",
            LandRegistryError::Normalize(NormalizeError::InvalidMagnitude(_)) => {
                "InvalidMagnitude"
            }
            LandRegistryError::TooManyAddresses { .. } => "TooManyAddresses",
            LandRegistryError::Transport(_) => "TransportError",
            LandRegistryError::MalformedResponse(_) => "MalformedResponse",
            LandRegistryError::InvalidViewport(_) => "InvalidViewport",
        }
    }
}
