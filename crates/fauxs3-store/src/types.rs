//! Core data types for the multipart upload store.
//!
//! Defines the externally visible upload descriptor ([`MultipartUpload`]),
//! the internal registration record ([`MultipartUploadInfo`]), staged-part
//! metadata ([`Part`]), and the small vocabulary types shared across the
//! crate: [`Owner`], [`StorageClass`], [`PartNumber`], [`CopyRange`], and
//! [`BucketDirectory`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::ChecksumAlgorithm;
use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// The principal that owns or initiated an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// The canonical user ID.
    pub id: String,
    /// The display name.
    pub display_name: String,
}

impl Default for Owner {
    fn default() -> Self {
        Self {
            id: "79a59df900b949e55d96a1e698fbacedfd6e09d98eacf8f8d5218e7cd47ef2be".to_owned(),
            display_name: "fauxs3".to_owned(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.display_name, self.id)
    }
}

// ---------------------------------------------------------------------------
// StorageClass
// ---------------------------------------------------------------------------

/// Storage class recorded on an upload and applied to the final object.
///
/// The mock does not tier data; the class is carried through as metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    /// The default storage class.
    #[default]
    Standard,
    /// Reduced redundancy.
    ReducedRedundancy,
    /// Infrequent access.
    StandardIa,
    /// Single-AZ infrequent access.
    OnezoneIa,
    /// Intelligent tiering.
    IntelligentTiering,
    /// Glacier.
    Glacier,
    /// Glacier Deep Archive.
    DeepArchive,
}

impl StorageClass {
    /// Return the canonical string used in S3 requests and listings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::ReducedRedundancy => "REDUCED_REDUNDANCY",
            Self::StandardIa => "STANDARD_IA",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::Glacier => "GLACIER",
            Self::DeepArchive => "DEEP_ARCHIVE",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`StorageClass`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown storage class: {0}")]
pub struct ParseStorageClassError(String);

impl FromStr for StorageClass {
    type Err = ParseStorageClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(Self::Standard),
            "REDUCED_REDUNDANCY" => Ok(Self::ReducedRedundancy),
            "STANDARD_IA" => Ok(Self::StandardIa),
            "ONEZONE_IA" => Ok(Self::OnezoneIa),
            "INTELLIGENT_TIERING" => Ok(Self::IntelligentTiering),
            "GLACIER" => Ok(Self::Glacier),
            "DEEP_ARCHIVE" => Ok(Self::DeepArchive),
            _ => Err(ParseStorageClassError(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// PartNumber
// ---------------------------------------------------------------------------

/// A validated part number in the range `[1, 10000]`.
///
/// S3 transmits part numbers as decimal strings in query parameters and as
/// integers in XML bodies; both construction paths validate the range.
///
/// # Examples
///
/// ```
/// use fauxs3_store::types::PartNumber;
///
/// let n: PartNumber = "42".parse().unwrap();
/// assert_eq!(n.get(), 42);
/// assert!("0".parse::<PartNumber>().is_err());
/// assert!("10001".parse::<PartNumber>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartNumber(u16);

impl PartNumber {
    /// Highest part number S3 accepts.
    pub const MAX: u16 = 10_000;

    /// Create a part number, validating the `[1, 10000]` range.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPartNumber`] when out of range.
    pub fn new(value: u32) -> Result<Self, StoreError> {
        match u16::try_from(value) {
            Ok(v) if (1..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(StoreError::InvalidPartNumber {
                value: value.to_string(),
            }),
        }
    }

    /// Return the numeric value.
    #[must_use]
    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PartNumber {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.parse().map_err(|_| StoreError::InvalidPartNumber {
            value: s.to_owned(),
        })?;
        Self::new(value)
    }
}

// ---------------------------------------------------------------------------
// CopyRange
// ---------------------------------------------------------------------------

/// An inclusive byte range for `UploadPartCopy`.
///
/// Mirrors the `x-amz-copy-source-range` header semantics: `bytes=a-b`
/// copies bytes `a..=b` of the source; the end is clamped to the source
/// length like an HTTP range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRange {
    /// First byte offset (inclusive).
    pub first: u64,
    /// Last byte offset (inclusive); `None` means "to the end".
    pub last: Option<u64>,
}

impl CopyRange {
    /// Parse a `bytes=a-b` range header value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRange`] on malformed input.
    ///
    /// # Examples
    ///
    /// ```
    /// use fauxs3_store::types::CopyRange;
    ///
    /// let range = CopyRange::parse("bytes=100-199").unwrap();
    /// assert_eq!(range.bounds(1024).unwrap(), (100, 199));
    /// ```
    pub fn parse(header: &str) -> Result<Self, StoreError> {
        let raw = header
            .strip_prefix("bytes=")
            .ok_or(StoreError::InvalidRange)?;
        let (first, last) = raw.split_once('-').ok_or(StoreError::InvalidRange)?;
        let first: u64 = first.parse().map_err(|_| StoreError::InvalidRange)?;
        let last = if last.is_empty() {
            None
        } else {
            let last: u64 = last.parse().map_err(|_| StoreError::InvalidRange)?;
            if last < first {
                return Err(StoreError::InvalidRange);
            }
            Some(last)
        };
        Ok(Self { first, last })
    }

    /// Resolve this range against a source of `len` bytes into inclusive
    /// `(start, end)` offsets. The end is clamped to `len - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRange`] when the range starts at or
    /// beyond the end of the source.
    pub fn bounds(&self, len: u64) -> Result<(u64, u64), StoreError> {
        if len == 0 || self.first >= len {
            return Err(StoreError::InvalidRange);
        }
        let end = self.last.map_or(len - 1, |last| last.min(len - 1));
        Ok((self.first, end))
    }
}

// ---------------------------------------------------------------------------
// BucketDirectory
// ---------------------------------------------------------------------------

/// The bucket metadata the store needs: a name and a root directory.
///
/// Bucket lifecycle (creation, listing, policies) is handled elsewhere; the
/// store only resolves object and staging paths below `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDirectory {
    /// The bucket name.
    pub name: String,
    /// The on-disk root directory for this bucket.
    pub path: PathBuf,
}

impl BucketDirectory {
    /// Create a bucket directory record.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The bucket's root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// MultipartUpload
// ---------------------------------------------------------------------------

/// An in-progress multipart upload as reported to clients.
///
/// Created by `CreateMultipartUpload`; the internal registration record
/// ([`MultipartUploadInfo`]) wraps this descriptor together with the
/// metadata applied to the final object on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartUpload {
    /// The object key that this upload will create.
    pub key: String,
    /// Unique identifier for this upload.
    pub upload_id: String,
    /// The owner of the final object.
    pub owner: Owner,
    /// The principal that initiated the upload.
    pub initiator: Owner,
    /// The storage class for the final object.
    pub storage_class: StorageClass,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MultipartUploadInfo
// ---------------------------------------------------------------------------

/// The full registration record for an in-progress upload.
///
/// Captured at initiation time and consumed by `CompleteMultipartUpload`
/// when the assembled object is handed to the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartUploadInfo {
    /// The externally visible descriptor.
    pub upload: MultipartUpload,
    /// Content type for the final object.
    pub content_type: String,
    /// Custom `x-amz-meta-*` metadata.
    pub user_metadata: HashMap<String, String>,
    /// Standard headers stored alongside the object (cache-control etc).
    pub store_headers: HashMap<String, String>,
    /// Server-side encryption headers captured at initiation.
    pub encryption_headers: HashMap<String, String>,
    /// The bucket the upload targets.
    pub bucket_name: String,
    /// Full-object checksum supplied at initiation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// The checksum algorithm for `checksum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
}

// ---------------------------------------------------------------------------
// Part / CompletedPart
// ---------------------------------------------------------------------------

/// A staged part as reported by `ListParts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// The part number (1-based, up to 10 000).
    pub part_number: PartNumber,
    /// Unquoted hex MD5 of the part bytes.
    pub etag: String,
    /// When the part file was last written.
    pub last_modified: DateTime<Utc>,
    /// Size of the part in bytes.
    pub size: u64,
}

/// A part reference supplied by the client to `CompleteMultipartUpload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    /// The part number being committed.
    pub part_number: PartNumber,
    /// The ETag the client recorded for the part.
    pub etag: String,
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// A single object tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// The tag key.
    pub key: String,
    /// The tag value.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
