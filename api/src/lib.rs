pub mod consts;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::consts::*;

pub mod prelude {
    pub use crate::consts::*;
    pub use crate::error::*;
    pub use crate::types::*;
    pub use crate::utils::*;
}
