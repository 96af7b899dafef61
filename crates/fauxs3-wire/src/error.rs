//! Decoding error types.
//!
//! [`ChunkedDecodeError`] covers every way an aws-chunked body can fail to
//! decode. Because the decoder surfaces as a [`tokio::io::AsyncRead`], the
//! errors travel wrapped in [`std::io::Error`]; [`ChunkedDecodeError::from_io`]
//! recovers the typed error on the other side.

use http::StatusCode;

/// Errors produced while decoding an aws-chunked request body.
#[derive(Debug, thiserror::Error)]
pub enum ChunkedDecodeError {
    /// The chunk framing is invalid.
    #[error("malformed chunked encoding: {reason}")]
    MalformedChunkedEncoding {
        /// What was wrong with the framing.
        reason: String,
    },

    /// The body ended before the framing did.
    #[error("unexpected end of chunked body")]
    UnexpectedEof,

    /// The decoded payload does not have the declared length.
    #[error("decoded {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// The declared decoded length.
        expected: u64,
        /// The number of payload bytes actually decoded.
        actual: u64,
    },

    /// The trailer checksum does not match the decoded payload.
    #[error("checksum mismatch: trailer {expected}, computed {computed}")]
    ChecksumMismatch {
        /// The base64 checksum from the trailer.
        expected: String,
        /// The base64 checksum computed over the decoded payload.
        computed: String,
    },
}

impl ChunkedDecodeError {
    /// Shorthand for a framing violation.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedChunkedEncoding {
            reason: reason.into(),
        }
    }

    /// The S3 error code string for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedChunkedEncoding { .. } => "InvalidRequest",
            Self::UnexpectedEof | Self::LengthMismatch { .. } => "IncompleteBody",
            Self::ChecksumMismatch { .. } => "BadDigest",
        }
    }

    /// The HTTP status code S3 pairs with this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Recover a typed decode error from an [`std::io::Error`] produced by
    /// the decoder's `AsyncRead` implementation.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Option<&Self> {
        err.get_ref()?.downcast_ref()
    }
}

impl From<ChunkedDecodeError> for std::io::Error {
    fn from(err: ChunkedDecodeError) -> Self {
        let kind = match &err {
            ChunkedDecodeError::UnexpectedEof | ChunkedDecodeError::LengthMismatch { .. } => {
                std::io::ErrorKind::UnexpectedEof
            }
            ChunkedDecodeError::MalformedChunkedEncoding { .. }
            | ChunkedDecodeError::ChecksumMismatch { .. } => std::io::ErrorKind::InvalidData,
        };
        Self::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_malformed_encoding_to_invalid_request() {
        let err = ChunkedDecodeError::malformed("missing chunk size line");
        assert_eq!(err.error_code(), "InvalidRequest");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("missing chunk size line"));
    }

    #[test]
    fn test_should_map_truncation_to_incomplete_body() {
        assert_eq!(ChunkedDecodeError::UnexpectedEof.error_code(), "IncompleteBody");
        assert_eq!(
            ChunkedDecodeError::LengthMismatch {
                expected: 10,
                actual: 7,
            }
            .error_code(),
            "IncompleteBody",
        );
    }

    #[test]
    fn test_should_map_checksum_mismatch_to_bad_digest() {
        let err = ChunkedDecodeError::ChecksumMismatch {
            expected: "aaaa".to_owned(),
            computed: "bbbb".to_owned(),
        };
        assert_eq!(err.error_code(), "BadDigest");
    }

    #[test]
    fn test_should_round_trip_through_io_error() {
        let io: std::io::Error = ChunkedDecodeError::UnexpectedEof.into();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);

        let recovered = ChunkedDecodeError::from_io(&io).expect("test downcast");
        assert!(matches!(recovered, ChunkedDecodeError::UnexpectedEof));
    }

    #[test]
    fn test_should_use_invalid_data_kind_for_framing_errors() {
        let io: std::io::Error = ChunkedDecodeError::malformed("bad hex").into();
        assert_eq!(io.kind(), std::io::ErrorKind::InvalidData);
        assert!(ChunkedDecodeError::from_io(&io).is_some());
    }

    #[test]
    fn test_should_not_recover_from_foreign_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "plain io");
        assert!(ChunkedDecodeError::from_io(&io).is_none());
    }
}
