//! Finalized object storage.
//!
//! [`ObjectStore`] is the contract the multipart engine depends on: install
//! an assembled payload under `(bucket, objectId)`, look up its metadata,
//! resolve its data path, and move spooled request bodies into staging.
//!
//! [`FsObjectStore`] implements the contract against the directory layout in
//! [`crate::layout`]. Payloads are installed by rename so an object is never
//! observable half-written; metadata is a JSON record next to the data file.
//! Durability is whatever the host filesystem provides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::digest::ChecksumAlgorithm;
use crate::error::{StoreError, StoreResult};
use crate::layout;
use crate::types::{BucketDirectory, Owner, StorageClass, Tag};

// ---------------------------------------------------------------------------
// ObjectMetadata
// ---------------------------------------------------------------------------

/// The persisted metadata record of a finalized object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// The stable internal identifier of the object.
    pub object_id: Uuid,
    /// The user-visible key.
    pub key: String,
    /// Content type of the payload.
    pub content_type: String,
    /// The object's ETag (unquoted).
    pub etag: String,
    /// Payload size in bytes.
    pub size: u64,
    /// When the object was installed.
    pub last_modified: DateTime<Utc>,
    /// Path of the payload file.
    pub data_path: PathBuf,
    /// Custom `x-amz-meta-*` metadata.
    pub user_metadata: HashMap<String, String>,
    /// Standard headers stored alongside the object.
    pub store_headers: HashMap<String, String>,
    /// Server-side encryption headers recorded for the object.
    pub encryption_headers: HashMap<String, String>,
    /// Object tags.
    pub tags: Vec<Tag>,
    /// Full-object checksum, if one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Algorithm for `checksum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
    /// The object owner.
    pub owner: Owner,
    /// The storage class.
    pub storage_class: StorageClass,
}

// ---------------------------------------------------------------------------
// StoreObjectParams
// ---------------------------------------------------------------------------

/// Parameters for [`ObjectStore::store_object`].
///
/// `source_path` must point at a file holding the complete payload; the
/// store takes ownership of it (the file is moved into place).
#[derive(Debug, Clone)]
pub struct StoreObjectParams {
    /// The user-visible key.
    pub key: String,
    /// Content type of the payload.
    pub content_type: String,
    /// Standard headers stored alongside the object.
    pub store_headers: HashMap<String, String>,
    /// The file holding the payload to install.
    pub source_path: PathBuf,
    /// Custom `x-amz-meta-*` metadata.
    pub user_metadata: HashMap<String, String>,
    /// Server-side encryption headers to record.
    pub encryption_headers: HashMap<String, String>,
    /// The object's ETag (unquoted).
    pub etag: String,
    /// Object tags.
    pub tags: Vec<Tag>,
    /// Algorithm for `checksum`.
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
    /// Full-object checksum, if one was supplied.
    pub checksum: Option<String>,
    /// The object owner.
    pub owner: Owner,
    /// The storage class.
    pub storage_class: StorageClass,
}

// ---------------------------------------------------------------------------
// ObjectStore contract
// ---------------------------------------------------------------------------

/// The object-store interface the multipart engine consumes.
///
/// Implementations must install payloads atomically: a concurrent reader
/// either sees the previous object state or the fully installed new one.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Install the payload at `params.source_path` as the object's data file
    /// and persist its metadata record.
    async fn store_object(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        params: StoreObjectParams,
    ) -> StoreResult<ObjectMetadata>;

    /// Look up the metadata record of a finalized object.
    async fn get_object_metadata(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
    ) -> StoreResult<ObjectMetadata>;

    /// Resolve the payload path for `(bucket, objectId)`.
    fn data_path(&self, bucket: &BucketDirectory, object_id: Uuid) -> PathBuf;

    /// Move a spooled request body into a staging location, returning the
    /// resulting file's size in bytes.
    async fn materialize_part_from_path(&self, source: &Path, dest: &Path) -> StoreResult<u64>;
}

// ---------------------------------------------------------------------------
// FsObjectStore
// ---------------------------------------------------------------------------

/// Filesystem-backed [`ObjectStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsObjectStore;

impl FsObjectStore {
    /// Create a filesystem object store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn store_object(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        params: StoreObjectParams,
    ) -> StoreResult<ObjectMetadata> {
        let object_dir = layout::object_dir(bucket, &object_id);
        tokio::fs::create_dir_all(&object_dir)
            .await
            .with_context(|| format!("failed to create object dir {}", object_dir.display()))?;

        let data_path = layout::data_path(bucket, &object_id);
        let size = install_file(&params.source_path, &data_path).await?;

        let metadata = ObjectMetadata {
            object_id,
            key: params.key,
            content_type: params.content_type,
            etag: params.etag,
            size,
            last_modified: Utc::now(),
            data_path,
            user_metadata: params.user_metadata,
            store_headers: params.store_headers,
            encryption_headers: params.encryption_headers,
            tags: params.tags,
            checksum: params.checksum,
            checksum_algorithm: params.checksum_algorithm,
            owner: params.owner,
            storage_class: params.storage_class,
        };

        let metadata_path = layout::metadata_path(bucket, &object_id);
        let json = serde_json::to_vec_pretty(&metadata)
            .context("failed to serialize object metadata")?;
        tokio::fs::write(&metadata_path, json)
            .await
            .with_context(|| {
                format!("failed to write metadata record {}", metadata_path.display())
            })?;

        debug!(
            bucket = %bucket.name,
            key = %metadata.key,
            object_id = %object_id,
            size,
            "stored object"
        );

        Ok(metadata)
    }

    async fn get_object_metadata(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
    ) -> StoreResult<ObjectMetadata> {
        let metadata_path = layout::metadata_path(bucket, &object_id);
        let json = match tokio::fs::read(&metadata_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NoSuchKey {
                    key: object_id.to_string(),
                });
            }
            Err(e) => {
                return Err(anyhow::Error::from(e)
                    .context(format!(
                        "failed to read metadata record {}",
                        metadata_path.display()
                    ))
                    .into());
            }
        };

        let metadata: ObjectMetadata = serde_json::from_slice(&json).with_context(|| {
            format!("corrupt metadata record {}", metadata_path.display())
        })?;
        Ok(metadata)
    }

    fn data_path(&self, bucket: &BucketDirectory, object_id: Uuid) -> PathBuf {
        layout::data_path(bucket, &object_id)
    }

    async fn materialize_part_from_path(&self, source: &Path, dest: &Path) -> StoreResult<u64> {
        install_file(source, dest).await
    }
}

/// Move `source` to `dest`, falling back to copy-and-remove when rename
/// fails (e.g. across filesystems). Returns the installed file's size.
async fn install_file(source: &Path, dest: &Path) -> StoreResult<u64> {
    match tokio::fs::rename(source, dest).await {
        Ok(()) => {
            trace!(source = %source.display(), dest = %dest.display(), "renamed file into place");
        }
        Err(_) => {
            tokio::fs::copy(source, dest).await.with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    source.display(),
                    dest.display()
                )
            })?;
            // Source may be a caller-managed temp file; removal is best-effort.
            let _ = tokio::fs::remove_file(source).await;
            trace!(source = %source.display(), dest = %dest.display(), "copied file into place");
        }
    }

    let len = tokio::fs::metadata(dest)
        .await
        .with_context(|| format!("failed to stat {}", dest.display()))?
        .len();
    Ok(len)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
