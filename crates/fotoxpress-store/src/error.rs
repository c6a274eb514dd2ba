use std::io::ErrorKind;

use fotoxpress_core::{DecodeError, EncodeError, GatewayError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Io(io) if io.kind() == ErrorKind::PermissionDenied => {
                GatewayError::AuthorizationRequired
            }
            StoreError::Io(io) if io.kind() == ErrorKind::NotFound => {
                GatewayError::ResourceUnavailable(io.to_string())
            }
            StoreError::Io(io) => GatewayError::Io(io),
            StoreError::NotFound(what) | StoreError::Path(what) => {
                GatewayError::ResourceUnavailable(what)
            }
            StoreError::Encode(e) => GatewayError::Codec(e.to_string()),
            StoreError::Decode(e) => GatewayError::Codec(e.to_string()),
            other => GatewayError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_needs_authorization() {
        let io = std::io::Error::new(ErrorKind::PermissionDenied, "read-only");
        let err: GatewayError = StoreError::Io(io).into();
        assert!(matches!(err, GatewayError::AuthorizationRequired));
    }

    #[test]
    fn test_missing_resource() {
        let err: GatewayError = StoreError::NotFound("photo 3".to_string()).into();
        assert!(matches!(err, GatewayError::ResourceUnavailable(ref m) if m == "photo 3"));

        let io = std::io::Error::new(ErrorKind::NotFound, "gone");
        let err: GatewayError = StoreError::Io(io).into();
        assert!(matches!(err, GatewayError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_database_errors_are_storage() {
        let err: GatewayError = StoreError::Database(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(matches!(err, GatewayError::Storage(_)));
    }

    #[test]
    fn test_codec_errors() {
        let err: GatewayError = StoreError::Decode(DecodeError::InvalidFormat).into();
        assert!(matches!(err, GatewayError::Codec(_)));
    }
}
