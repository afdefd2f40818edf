use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure at the network layer, before any parsing happens.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
}

/// Errors surfaced by the extraction pipeline. Every variant identifies the
/// source and the stage that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Network/timeout/non-2xx failure. Never retried by the engine.
    #[error("source {source_id}: {operation} request failed: {source}")]
    Transport {
        source_id: i64,
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// Expected structure absent or malformed in a response.
    #[error("source {source_id}: failed to parse {operation}: {reason}")]
    Parse {
        source_id: i64,
        operation: &'static str,
        reason: String,
    },

    /// A sub-fetch failed during the chapter-page fan-out. The whole
    /// aggregation fails; no partial chapter list is returned.
    #[error("source {source_id}: chapter list aggregation failed: {source}")]
    Aggregation {
        source_id: i64,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn parse(source_id: i64, operation: &'static str, reason: impl Into<String>) -> Self {
        Error::Parse {
            source_id,
            operation,
            reason: reason.into(),
        }
    }

    /// The id of the source the error originated from.
    pub fn source_id(&self) -> i64 {
        match self {
            Error::Transport { source_id, .. }
            | Error::Parse { source_id, .. }
            | Error::Aggregation { source_id, .. } => *source_id,
        }
    }
}
