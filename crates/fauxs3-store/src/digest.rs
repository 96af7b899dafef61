//! Content digests and checksums.
//!
//! Provides the MD5-based ETag computations (single object, per part, and
//! the composite multipart ETag) plus the additional checksum algorithms S3
//! exposes through the `x-amz-checksum-*` headers: SHA-1, SHA-256, CRC-32,
//! and CRC-32C.
//!
//! File-based helpers stream in fixed-size reads; nothing here buffers a
//! whole object in memory.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::error::StoreResult;

/// Read size for streaming file digests.
const READ_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// ChecksumAlgorithm
// ---------------------------------------------------------------------------

/// S3-supported checksum algorithms (excluding MD5, which is always computed
/// for the ETag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChecksumAlgorithm {
    /// CRC-32 (IEEE 802.3).
    Crc32,
    /// CRC-32C (Castagnoli).
    Crc32c,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
}

impl ChecksumAlgorithm {
    /// Return the canonical string used in S3 headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }

    /// The trailer header that carries this algorithm's checksum in an
    /// aws-chunked body.
    #[must_use]
    pub fn trailer_header(&self) -> &'static str {
        match self {
            Self::Crc32 => "x-amz-checksum-crc32",
            Self::Crc32c => "x-amz-checksum-crc32c",
            Self::Sha1 => "x-amz-checksum-sha1",
            Self::Sha256 => "x-amz-checksum-sha256",
        }
    }

    /// Resolve a trailer header name back to its algorithm.
    ///
    /// # Examples
    ///
    /// ```
    /// use fauxs3_store::digest::ChecksumAlgorithm;
    ///
    /// assert_eq!(
    ///     ChecksumAlgorithm::from_trailer_header("x-amz-checksum-sha256"),
    ///     Some(ChecksumAlgorithm::Sha256),
    /// );
    /// assert!(ChecksumAlgorithm::from_trailer_header("x-amz-meta-foo").is_none());
    /// ```
    #[must_use]
    pub fn from_trailer_header(header: &str) -> Option<Self> {
        match header.to_ascii_lowercase().as_str() {
            "x-amz-checksum-crc32" => Some(Self::Crc32),
            "x-amz-checksum-crc32c" => Some(Self::Crc32c),
            "x-amz-checksum-sha1" => Some(Self::Sha1),
            "x-amz-checksum-sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`ChecksumAlgorithm`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown checksum algorithm: {0}")]
pub struct ParseChecksumAlgorithmError(String);

impl FromStr for ChecksumAlgorithm {
    type Err = ParseChecksumAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRC32" => Ok(Self::Crc32),
            "CRC32C" => Ok(Self::Crc32c),
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            _ => Err(ParseChecksumAlgorithmError(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// ChecksumHasher
// ---------------------------------------------------------------------------

/// Incremental hasher for a single [`ChecksumAlgorithm`].
///
/// Used by the chunked-decoding stream to checksum payload bytes as they
/// pass through, and by [`checksum_file`] for file contents.
///
/// # Examples
///
/// ```
/// use fauxs3_store::digest::{ChecksumAlgorithm, ChecksumHasher};
///
/// let mut hasher = ChecksumHasher::new(ChecksumAlgorithm::Sha256);
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// assert!(!hasher.finalize_base64().is_empty());
/// ```
#[derive(Debug)]
pub enum ChecksumHasher {
    /// Running CRC-32 state.
    Crc32(crc32fast::Hasher),
    /// Running CRC-32C state.
    Crc32c(u32),
    /// Running SHA-1 state.
    Sha1(sha1::Sha1),
    /// Running SHA-256 state.
    Sha256(sha2::Sha256),
}

impl ChecksumHasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgorithm::Crc32c => Self::Crc32c(0),
            ChecksumAlgorithm::Sha1 => Self::Sha1(<sha1::Sha1 as Digest>::new()),
            ChecksumAlgorithm::Sha256 => Self::Sha256(<sha2::Sha256 as Digest>::new()),
        }
    }

    /// Feed more data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(data),
            Self::Crc32c(state) => *state = crc32c::crc32c_append(*state, data),
            Self::Sha1(h) => Digest::update(h, data),
            Self::Sha256(h) => Digest::update(h, data),
        }
    }

    /// Finalize and return the base64 encoding of the digest.
    ///
    /// CRC values are encoded big-endian, matching the AWS SDKs.
    #[must_use]
    pub fn finalize_base64(self) -> String {
        match self {
            Self::Crc32(h) => BASE64_STANDARD.encode(h.finalize().to_be_bytes()),
            Self::Crc32c(state) => BASE64_STANDARD.encode(state.to_be_bytes()),
            Self::Sha1(h) => BASE64_STANDARD.encode(Digest::finalize(h)),
            Self::Sha256(h) => BASE64_STANDARD.encode(Digest::finalize(h)),
        }
    }
}

// ---------------------------------------------------------------------------
// MD5 / ETag helpers
// ---------------------------------------------------------------------------

/// Compute the hex-encoded MD5 digest of in-memory data.
///
/// # Examples
///
/// ```
/// use fauxs3_store::digest::md5_hex;
///
/// assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Compute the raw 16-byte MD5 digest of a file, streaming its contents.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Internal`] when the file cannot be
/// read.
pub async fn md5_digest_file(path: &Path) -> StoreResult<[u8; 16]> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {} for digest", path.display()))?;
    let mut hasher = <md5::Md5 as Digest>::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .with_context(|| format!("failed to read {} for digest", path.display()))?;
        if n == 0 {
            break;
        }
        Digest::update(&mut hasher, &buf[..n]);
    }
    Ok(Digest::finalize(hasher).into())
}

/// Compute the hex-encoded MD5 digest of a file.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Internal`] when the file cannot be
/// read.
pub async fn md5_hex_file(path: &Path) -> StoreResult<String> {
    Ok(hex::encode(md5_digest_file(path).await?))
}

/// Suffix an ETag with the KMS key identifier when one is recorded.
///
/// Objects uploaded with SSE-KMS headers get the key id appended to their
/// part ETags; clients of the mock rely on this observable behavior.
#[must_use]
pub fn kms_tagged(md5_hex: String, kms_key_id: Option<&str>) -> String {
    match kms_key_id {
        Some(key_id) if !key_id.is_empty() => format!("{md5_hex}-{key_id}"),
        _ => md5_hex,
    }
}

/// Compute the hex MD5 of a file, suffixed with the KMS key id if present.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Internal`] when the file cannot be
/// read.
pub async fn kms_tagged_md5(kms_key_id: Option<&str>, path: &Path) -> StoreResult<String> {
    Ok(kms_tagged(md5_hex_file(path).await?, kms_key_id))
}

// ---------------------------------------------------------------------------
// Multipart ETag
// ---------------------------------------------------------------------------

/// Compute a composite multipart ETag from raw per-part MD5 digests.
///
/// The result is the MD5 of the concatenated 16-byte part digests, formatted
/// as `<hex>-<part_count>` (unquoted; the HTTP layer adds quotes).
#[must_use]
pub fn multipart_etag_from_digests(part_digests: &[[u8; 16]]) -> String {
    let mut combined = Vec::with_capacity(part_digests.len() * 16);
    for digest in part_digests {
        combined.extend_from_slice(digest);
    }
    let final_md5 = hex::encode(md5::Md5::digest(&combined));
    format!("{final_md5}-{}", part_digests.len())
}

/// Compute the composite multipart ETag over an ordered list of part files.
///
/// Each file is streamed for its MD5; the concatenation order is exactly the
/// order given.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Internal`] when any part file cannot
/// be read.
pub async fn multipart_etag<P: AsRef<Path>>(part_paths: &[P]) -> StoreResult<String> {
    let mut digests = Vec::with_capacity(part_paths.len());
    for path in part_paths {
        digests.push(md5_digest_file(path.as_ref()).await?);
    }
    Ok(multipart_etag_from_digests(&digests))
}

// ---------------------------------------------------------------------------
// File checksums
// ---------------------------------------------------------------------------

/// Compute the base64 checksum of a file for the given algorithm, streaming
/// its contents.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Internal`] when the file cannot be
/// read.
pub async fn checksum_file(path: &Path, algorithm: ChecksumAlgorithm) -> StoreResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {} for checksum", path.display()))?;
    let mut hasher = ChecksumHasher::new(algorithm);
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .with_context(|| format!("failed to read {} for checksum", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_base64())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
