pub mod collect;
pub mod error;
pub mod nodes;
pub mod plan;
pub mod resolver;
pub mod source;
pub mod store;
pub mod tokens;

pub use error::CollectError;
