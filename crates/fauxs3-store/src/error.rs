//! Store-specific error types.
//!
//! Defines [`StoreError`], the domain error enum for the object and
//! multipart stores. Each variant carries the S3 error code and HTTP status
//! the routing layer puts on the wire; the mapping lives here so handlers
//! never hard-code status codes.
//!
//! Only [`StoreError::Internal`] wraps a full cause chain; every other
//! variant is returned with a brief reason.

use http::StatusCode;

/// Errors produced by the object store and the multipart upload engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The specified multipart upload does not exist or was terminated.
    #[error("The specified upload does not exist: {upload_id}")]
    NoSuchUpload {
        /// The upload ID that was not found.
        upload_id: String,
    },

    /// The specified key does not exist.
    #[error("The specified key does not exist: {key}")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    /// One or more of the parts referenced at completion could not be found.
    #[error("One or more of the specified parts could not be found")]
    InvalidPart,

    /// The list of parts was not in ascending order.
    #[error("The list of parts was not in ascending order")]
    InvalidPartOrder,

    /// The part number is not a decimal integer in `[1, 10000]`.
    #[error("Part number must be an integer between 1 and 10000, got {value}")]
    InvalidPartNumber {
        /// The rejected input.
        value: String,
    },

    /// The requested byte range is not satisfiable against the source.
    #[error("The requested range is not satisfiable")]
    InvalidRange,

    /// Internal error with a full cause.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    /// The S3 error code string for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSuchUpload { .. } => "NoSuchUpload",
            Self::NoSuchKey { .. } => "NoSuchKey",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidPartNumber { .. } => "InvalidArgument",
            Self::InvalidRange => "InvalidRange",
            Self::Internal(_) => "InternalError",
        }
    }

    /// The HTTP status code S3 pairs with this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoSuchUpload { .. } | Self::NoSuchKey { .. } => StatusCode::NOT_FOUND,
            Self::InvalidPart | Self::InvalidPartOrder | Self::InvalidPartNumber { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
