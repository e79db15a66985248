//! Errors produced by metadata extraction and image operations

use crate::engine::EngineError;
use imgserve_core::AppError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Source bytes are empty, truncated or not a supported image format
    #[error("decode error: {0}")]
    Decode(String),

    /// A required parameter is missing or a supplied value violates its constraint
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested region lies outside the source image
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("engine failure: {0}")]
    EngineFailure(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<EngineError> for OperationError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Decode(msg) => OperationError::Decode(msg),
            EngineError::Encode(msg) => OperationError::Encode(msg),
            EngineError::Failure(msg) => OperationError::EngineFailure(msg),
        }
    }
}

impl From<OperationError> for AppError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Decode(msg) => AppError::Decode(msg),
            OperationError::InvalidParameter(msg) => AppError::InvalidParameter(msg),
            OperationError::OutOfBounds(msg) => AppError::OutOfBounds(msg),
            OperationError::Encode(msg) => AppError::Encode(msg),
            OperationError::EngineFailure(msg) => AppError::EngineFailure(msg),
            OperationError::Cancelled => {
                AppError::Timeout("Operation cancelled before completion".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgserve_core::ErrorMetadata;

    #[test]
    fn test_engine_errors_map_to_operation_errors() {
        assert_eq!(
            OperationError::from(EngineError::Decode("bad header".into())),
            OperationError::Decode("bad header".into())
        );
        assert_eq!(
            OperationError::from(EngineError::Encode("no encoder".into())),
            OperationError::Encode("no encoder".into())
        );
        assert_eq!(
            OperationError::from(EngineError::Failure("limits".into())),
            OperationError::EngineFailure("limits".into())
        );
    }

    #[test]
    fn test_operation_errors_map_to_status_codes() {
        let cases = [
            (OperationError::Decode(String::new()), 400),
            (OperationError::InvalidParameter(String::new()), 400),
            (OperationError::OutOfBounds(String::new()), 400),
            (OperationError::Encode(String::new()), 500),
            (OperationError::EngineFailure(String::new()), 500),
            (OperationError::Cancelled, 503),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).http_status_code(), status);
        }
    }
}
