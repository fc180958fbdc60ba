mod http;
mod retry;

pub use http::*;
pub use retry::*;
