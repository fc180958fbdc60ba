use std::time::Duration;

use masp_api::error::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("No RPC endpoints configured")]
    NoEndpoints,
    #[error("Invalid endpoint URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {0} timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("Failed to decode value from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: DecodeError,
    },
    #[error("JSON-RPC error {code} from {url}: {message}")]
    JsonRpc { url: String, code: i64, message: String },
    #[error("ABCI query {path} failed with code {code}: {info}")]
    Abci { path: String, code: u32, info: String },

    #[error("Height {height} is beyond the node's look-back window of {limit} blocks")]
    LookBackExceeded { height: u64, limit: u64 },
    #[error("Height {height} has been pruned, lowest available height is {lowest}")]
    Pruned { height: u64, lowest: u64 },
}

impl RpcError {
    /// Whether retrying the same request against the same node may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http { .. } | RpcError::Timeout(..) => true,
            RpcError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the node refused the request because the height is too old.
    pub fn is_look_back(&self) -> bool {
        matches!(self, RpcError::LookBackExceeded { .. } | RpcError::Pruned { .. })
    }
}
