//! Error types for order normalization.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid order format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("missing order_uid")]
    MissingIdentifier,
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
