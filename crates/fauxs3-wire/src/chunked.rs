//! AWS chunked transfer decoding.
//!
//! S3 clients signing payloads with Signature Version 4 frame the request
//! body as `aws-chunked`:
//!
//! ```text
//! <hex-size>;chunk-signature=<sig>\r\n
//! <data>\r\n
//! ...
//! 0;chunk-signature=<sig>\r\n
//! [x-amz-checksum-<algo>:<base64>\r\n]
//! \r\n
//! ```
//!
//! [`AwsChunkedDecoder`] wraps the body stream and yields only the payload
//! bytes; chunk sizes, chunk signatures, and trailers are consumed
//! internally. Parsing operates on a small rolling buffer, so the body is
//! never held in memory as a whole. Chunk signatures are accepted and
//! discarded; signature verification happens in the auth layer, if at all.
//!
//! After EOF the decoder exposes the declared and actual payload lengths
//! and, when a checksum trailer was configured and present, the checksum
//! value and its algorithm.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::trace;

use fauxs3_store::digest::{ChecksumAlgorithm, ChecksumHasher};

use crate::error::ChunkedDecodeError;

/// Read size for refilling the internal buffer from the inner stream.
const FILL_BUF_SIZE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// DecoderState
// ---------------------------------------------------------------------------

/// Position of the decoder within the chunked framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Expecting a `<hex-size>[;extensions]\r\n` line.
    ChunkHeader,
    /// Emitting chunk payload; `remaining` bytes left in this chunk.
    ChunkData {
        /// Payload bytes left in the current chunk.
        remaining: u64,
    },
    /// Expecting the `\r\n` that closes a chunk's payload.
    ChunkDelimiter,
    /// Past the zero-size chunk, consuming trailer lines.
    Trailers,
    /// The terminating empty line was consumed; the stream is exhausted.
    Done,
}

// ---------------------------------------------------------------------------
// AwsChunkedDecoder
// ---------------------------------------------------------------------------

/// A byte stream that unwraps aws-chunked framing from an inner reader.
///
/// # Examples
///
/// ```
/// use fauxs3_wire::chunked::AwsChunkedDecoder;
/// use tokio::io::AsyncReadExt;
///
/// # tokio_test::block_on(async {
/// let body = b"5;chunk-signature=abc\r\nhello\r\n0;chunk-signature=def\r\n\r\n";
/// let mut decoder = AwsChunkedDecoder::new(&body[..], 5);
///
/// let mut payload = Vec::new();
/// decoder.read_to_end(&mut payload).await.unwrap();
/// assert_eq!(payload, b"hello");
/// assert_eq!(decoder.read_decoded_length(), 5);
/// # });
/// ```
#[derive(Debug)]
pub struct AwsChunkedDecoder<R> {
    inner: R,
    buf: BytesMut,
    state: DecoderState,
    decoded_length: u64,
    read_decoded_length: u64,
    /// Trailer header name to retain, lowercased.
    trailer_header: Option<String>,
    algorithm: Option<ChecksumAlgorithm>,
    checksum: Option<String>,
    verifier: Option<ChecksumHasher>,
}

impl<R> AwsChunkedDecoder<R> {
    /// Wrap `inner`, expecting `decoded_length` payload bytes.
    #[must_use]
    pub fn new(inner: R, decoded_length: u64) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FILL_BUF_SIZE),
            state: DecoderState::ChunkHeader,
            decoded_length,
            read_decoded_length: 0,
            trailer_header: None,
            algorithm: None,
            checksum: None,
            verifier: None,
        }
    }

    /// Retain the trailer with the given header name (for example
    /// `x-amz-checksum-sha256`). Other trailers are discarded.
    #[must_use]
    pub fn with_trailer_header(mut self, header: impl Into<String>) -> Self {
        self.trailer_header = Some(header.into().to_ascii_lowercase());
        self
    }

    /// Additionally verify the trailer checksum against the decoded payload.
    ///
    /// The decoder hashes every emitted byte with `algorithm`; when the
    /// matching trailer arrives, a mismatch fails the final read with
    /// [`ChunkedDecodeError::ChecksumMismatch`].
    #[must_use]
    pub fn verify_checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        if self.trailer_header.is_none() {
            self.trailer_header = Some(algorithm.trailer_header().to_owned());
        }
        self.verifier = Some(ChecksumHasher::new(algorithm));
        self
    }

    /// The declared decoded length.
    #[must_use]
    pub fn decoded_length(&self) -> u64 {
        self.decoded_length
    }

    /// Payload bytes emitted so far; equals
    /// [`decoded_length`](Self::decoded_length) once decoding succeeds.
    #[must_use]
    pub fn read_decoded_length(&self) -> u64 {
        self.read_decoded_length
    }

    /// The checksum algorithm inferred from the retained trailer, if one
    /// arrived.
    #[must_use]
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        self.algorithm
    }

    /// The base64 checksum value from the retained trailer, if one arrived.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Parse a `name:value` trailer line, retaining the configured one.
    fn record_trailer(&mut self, line: &[u8]) -> Result<(), ChunkedDecodeError> {
        let line = std::str::from_utf8(line)
            .map_err(|_| ChunkedDecodeError::malformed("trailer is not valid UTF-8"))?;
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ChunkedDecodeError::malformed("trailer without separator"))?;
        let name = name.trim().to_ascii_lowercase();
        if self.trailer_header.as_deref() == Some(name.as_str()) {
            self.algorithm = ChecksumAlgorithm::from_trailer_header(&name);
            self.checksum = Some(value.trim().to_owned());
            trace!(trailer = %name, "retained checksum trailer");
        }
        Ok(())
    }

    /// Final bookkeeping once the terminating empty line was consumed.
    fn finish(&mut self) -> Result<(), ChunkedDecodeError> {
        if self.read_decoded_length != self.decoded_length {
            return Err(ChunkedDecodeError::LengthMismatch {
                expected: self.decoded_length,
                actual: self.read_decoded_length,
            });
        }
        if let (Some(verifier), Some(expected)) = (self.verifier.take(), self.checksum.as_ref()) {
            let computed = verifier.finalize_base64();
            if &computed != expected {
                return Err(ChunkedDecodeError::ChecksumMismatch {
                    expected: expected.clone(),
                    computed,
                });
            }
        }
        Ok(())
    }
}

impl<R: AsyncRead + Unpin> AwsChunkedDecoder<R> {
    /// Pull more bytes from the inner reader into the rolling buffer.
    ///
    /// Resolves with the number of bytes read; `0` means the inner stream
    /// hit EOF.
    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<std::io::Result<usize>> {
        let mut tmp = [0u8; FILL_BUF_SIZE];
        let mut read_buf = ReadBuf::new(&mut tmp);
        ready!(Pin::new(&mut self.inner).poll_read(cx, &mut read_buf))?;
        let filled = read_buf.filled();
        self.buf.extend_from_slice(filled);
        Poll::Ready(Ok(filled.len()))
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AwsChunkedDecoder<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        loop {
            match this.state {
                DecoderState::Done => return Poll::Ready(Ok(())),

                DecoderState::ChunkHeader => {
                    if let Some(pos) = find_crlf(&this.buf) {
                        let line = this.buf.split_to(pos + 2);
                        let size = parse_chunk_size(&line[..pos])?;
                        this.state = if size == 0 {
                            DecoderState::Trailers
                        } else {
                            DecoderState::ChunkData { remaining: size }
                        };
                    } else if ready!(this.poll_fill(cx))? == 0 {
                        return Poll::Ready(Err(ChunkedDecodeError::UnexpectedEof.into()));
                    }
                }

                DecoderState::ChunkData { remaining } => {
                    if this.buf.is_empty() {
                        if ready!(this.poll_fill(cx))? == 0 {
                            return Poll::Ready(Err(ChunkedDecodeError::UnexpectedEof.into()));
                        }
                        continue;
                    }
                    let take = out
                        .remaining()
                        .min(this.buf.len())
                        .min(usize::try_from(remaining).unwrap_or(usize::MAX));
                    if take == 0 {
                        // The caller's buffer is full; emit what we have.
                        return Poll::Ready(Ok(()));
                    }
                    let chunk = this.buf.split_to(take);
                    out.put_slice(&chunk);
                    if let Some(verifier) = &mut this.verifier {
                        verifier.update(&chunk);
                    }
                    this.read_decoded_length += take as u64;
                    let remaining = remaining - take as u64;
                    this.state = if remaining == 0 {
                        DecoderState::ChunkDelimiter
                    } else {
                        DecoderState::ChunkData { remaining }
                    };
                    return Poll::Ready(Ok(()));
                }

                DecoderState::ChunkDelimiter => {
                    if this.buf.len() < 2 {
                        if ready!(this.poll_fill(cx))? == 0 {
                            return Poll::Ready(Err(ChunkedDecodeError::UnexpectedEof.into()));
                        }
                        continue;
                    }
                    if &this.buf[..2] != b"\r\n" {
                        return Poll::Ready(Err(ChunkedDecodeError::malformed(
                            "missing CRLF after chunk data",
                        )
                        .into()));
                    }
                    this.buf.advance(2);
                    this.state = DecoderState::ChunkHeader;
                }

                DecoderState::Trailers => {
                    if let Some(pos) = find_crlf(&this.buf) {
                        let line = this.buf.split_to(pos + 2);
                        if pos == 0 {
                            // Empty line: end of trailers, end of stream.
                            this.finish()?;
                            this.state = DecoderState::Done;
                            return Poll::Ready(Ok(()));
                        }
                        this.record_trailer(&line[..pos])?;
                    } else if ready!(this.poll_fill(cx))? == 0 {
                        return Poll::Ready(Err(ChunkedDecodeError::UnexpectedEof.into()));
                    }
                }
            }
        }
    }
}

/// Find the offset of the next `\r\n` in `data`.
fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

/// Parse a chunk-size line: hex digits optionally followed by `;`-separated
/// extensions such as `chunk-signature=...`.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ChunkedDecodeError> {
    let hex_part = match line.iter().position(|&b| b == b';') {
        Some(semi) => &line[..semi],
        None => line,
    };
    let hex_str = std::str::from_utf8(hex_part)
        .map_err(|_| ChunkedDecodeError::malformed("chunk size is not valid UTF-8"))?
        .trim();
    if hex_str.is_empty() {
        return Err(ChunkedDecodeError::malformed("empty chunk size"));
    }
    u64::from_str_radix(hex_str, 16)
        .map_err(|_| ChunkedDecodeError::malformed(format!("invalid chunk size '{hex_str}'")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
