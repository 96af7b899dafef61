//! Wire-format handling for the fauxs3 S3 mock.
//!
//! S3 SDK clients that sign payloads frame PUT bodies as `aws-chunked`:
//! interleaved chunk-size lines, chunk signatures, and an optional trailing
//! checksum. This crate detects that framing on a request
//! ([`detect::is_aws_chunked`]) and unwraps it transparently
//! ([`chunked::AwsChunkedDecoder`]) so the store only ever sees payload
//! bytes.

pub mod chunked;
pub mod detect;
pub mod error;

pub use chunked::AwsChunkedDecoder;
pub use error::ChunkedDecodeError;
