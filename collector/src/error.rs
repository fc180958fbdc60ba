use masp_api::types::{BlockHeight, MaspEpoch};
use masp_client::RpcError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("RPC query for {query} failed: {source}")]
    Rpc {
        query: String,
        #[source]
        source: RpcError,
    },

    #[error("Cannot resolve MASP epoch {epoch}: height {height} is older than the look-back window (oldest reachable height {oldest})")]
    InsufficientLookBack {
        epoch: MaspEpoch,
        height: BlockHeight,
        oldest: BlockHeight,
    },
    #[error("No block before MASP epoch {epoch} exists, cannot resolve earlier epochs")]
    NoEarlierBoundary { epoch: MaspEpoch },
    #[error("Expected MASP epoch {expected} at height {height}, node reported {found}")]
    EpochGap {
        expected: MaspEpoch,
        found: MaspEpoch,
        height: BlockHeight,
    },

    #[error("No tokens to query for {epochs} pending MASP epochs")]
    NoTokens { epochs: usize },

    #[error("Failed to write records for MASP epoch {epoch}: {source}")]
    Write {
        epoch: MaspEpoch,
        #[source]
        source: StoreError,
    },
}

impl CollectError {
    pub fn rpc(query: impl Into<String>, source: RpcError) -> Self {
        CollectError::Rpc { query: query.into(), source }
    }

    /// Whether the run failed because history older than the node keeps was needed.
    pub fn is_look_back(&self) -> bool {
        match self {
            CollectError::InsufficientLookBack { .. } => true,
            CollectError::Rpc { source, .. } => source.is_look_back(),
            _ => false,
        }
    }
}
