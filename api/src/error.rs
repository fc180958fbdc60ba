use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Value is empty")]
    Empty,
    #[error("Value truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Invalid option tag: {0}")]
    InvalidTag(u8),
    #[error("Amount of {0} bytes does not fit in 128 bits")]
    AmountOverflow(usize),
}
