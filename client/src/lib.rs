pub mod abci;
pub mod error;
pub mod indexer;
pub mod probe;
pub mod rpc;
pub mod utils;

pub use abci::AbciValue;
pub use error::RpcError;
pub use indexer::IndexerClient;
pub use probe::*;
pub use rpc::RpcClient;
pub use utils::RetryPolicy;
