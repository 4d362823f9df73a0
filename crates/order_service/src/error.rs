//! Error types for the order service.

use crate::store::StoreError;
use normalizer::NormalizeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid order format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    #[error("Missing order_uid")]
    MissingIdentifier,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl Error {
    /// True for input that can never be processed: retrying or redelivering
    /// the same payload fails the same way.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidFormat(_) | Error::MissingIdentifier)
    }
}

impl From<NormalizeError> for Error {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::InvalidFormat(e) => Error::InvalidFormat(e),
            NormalizeError::MissingIdentifier => Error::MissingIdentifier,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(Error::MissingIdentifier.is_rejection());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::InvalidFormat(json_err).is_rejection());

        let storage = Error::Storage(StoreError::Unexpected(anyhow::anyhow!("down")));
        assert!(!storage.is_rejection());
    }

    #[test]
    fn test_from_normalize_error() {
        let err: Error = NormalizeError::MissingIdentifier.into();
        assert!(matches!(err, Error::MissingIdentifier));
    }
}
