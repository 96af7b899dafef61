//! Multipart upload engine.
//!
//! [`MultipartStore`] tracks in-progress multipart uploads and their staged
//! part files. Uploads are registered under an opaque upload id; parts are
//! staged as individual files in a per-upload directory (see
//! [`crate::layout`]) and assembled into the final object on completion.
//!
//! # Concurrency
//!
//! The `uploadId → info` registry is a [`DashMap`], so lookups are
//! lock-free and removal is atomic. Each registration carries its own
//! async mutex: the terminal transitions (complete, abort) acquire it,
//! re-check that the upload is still registered, and only then mutate disk
//! state. A complete and an abort racing on the same upload therefore
//! resolve to exactly one winner; the loser observes the missing
//! registration and fails with `NoSuchUpload`.
//!
//! Concurrent `PutPart` calls target distinct files per part number and do
//! not contend. Two writers for the *same* part number race like they do on
//! S3: last writer wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use digest::Digest;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::digest::{
    kms_tagged, kms_tagged_md5, md5_digest_file, multipart_etag_from_digests, ChecksumAlgorithm,
};
use crate::error::{StoreError, StoreResult};
use crate::layout;
use crate::object::{ObjectStore, StoreObjectParams};
use crate::types::{
    BucketDirectory, CompletedPart, CopyRange, MultipartUpload, MultipartUploadInfo, Owner, Part,
    PartNumber, StorageClass,
};

/// The encryption header carrying the SSE-KMS key id; its presence tags
/// part ETags with the key.
pub const KMS_KEY_ID_HEADER: &str = "x-amz-server-side-encryption-aws-kms-key-id";

/// Buffer size for part writes and assembly copies.
const COPY_BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// NewUpload
// ---------------------------------------------------------------------------

/// Parameters captured when a multipart upload is initiated.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// The object key the upload will create.
    pub key: String,
    /// The stable internal object id.
    pub object_id: Uuid,
    /// The upload id chosen by the caller; must be unique process-wide.
    pub upload_id: String,
    /// Content type for the final object.
    pub content_type: String,
    /// Standard headers stored alongside the object.
    pub store_headers: HashMap<String, String>,
    /// The owner of the final object.
    pub owner: Owner,
    /// The principal initiating the upload.
    pub initiator: Owner,
    /// Custom `x-amz-meta-*` metadata.
    pub user_metadata: HashMap<String, String>,
    /// Server-side encryption headers captured at initiation.
    pub encryption_headers: HashMap<String, String>,
    /// Storage class for the final object.
    pub storage_class: StorageClass,
    /// Full-object checksum supplied at initiation.
    pub checksum: Option<String>,
    /// Algorithm for `checksum`.
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
}

// ---------------------------------------------------------------------------
// UploadEntry
// ---------------------------------------------------------------------------

/// A registered upload: its info record, its staging directory, and the
/// mutex serializing the terminal transitions.
#[derive(Debug)]
struct UploadEntry {
    info: MultipartUploadInfo,
    staging_dir: PathBuf,
    gate: tokio::sync::Mutex<()>,
}

// ---------------------------------------------------------------------------
// MultipartStore
// ---------------------------------------------------------------------------

/// The multipart upload engine.
///
/// Shared process-wide; all methods take `&self` and are safe to call from
/// concurrent request handlers.
pub struct MultipartStore {
    registry: DashMap<String, Arc<UploadEntry>>,
    object_store: Arc<dyn ObjectStore>,
    retain_files_on_exit: bool,
}

impl std::fmt::Debug for MultipartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartStore")
            .field("uploads", &self.registry.len())
            .field("retain_files_on_exit", &self.retain_files_on_exit)
            .finish()
    }
}

impl MultipartStore {
    /// Create a multipart engine backed by the given object store.
    ///
    /// When `retain_files_on_exit` is `false`, staging directories of
    /// still-registered uploads are swept when the engine is dropped.
    #[must_use]
    pub fn new(object_store: Arc<dyn ObjectStore>, retain_files_on_exit: bool) -> Self {
        Self {
            registry: DashMap::new(),
            object_store,
            retain_files_on_exit,
        }
    }

    /// Prepare a new multipart upload: create its staging directory and
    /// register it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] when the staging directory cannot be
    /// created or the upload id is already registered.
    pub async fn prepare_upload(
        &self,
        bucket: &BucketDirectory,
        new_upload: NewUpload,
    ) -> StoreResult<MultipartUpload> {
        let staging_dir = layout::parts_dir(bucket, &new_upload.object_id, &new_upload.upload_id);
        tokio::fs::create_dir_all(&staging_dir).await.map_err(|e| {
            error!(
                bucket = %bucket.name,
                key = %new_upload.key,
                upload_id = %new_upload.upload_id,
                error = %e,
                "failed to create staging directory"
            );
            StoreError::Internal(anyhow::Error::from(e).context(format!(
                "failed to create staging directory {}",
                staging_dir.display()
            )))
        })?;

        let upload = MultipartUpload {
            key: new_upload.key,
            upload_id: new_upload.upload_id.clone(),
            owner: new_upload.owner,
            initiator: new_upload.initiator,
            storage_class: new_upload.storage_class,
            initiated: Utc::now(),
        };

        let entry = Arc::new(UploadEntry {
            info: MultipartUploadInfo {
                upload: upload.clone(),
                content_type: new_upload.content_type,
                user_metadata: new_upload.user_metadata,
                store_headers: new_upload.store_headers,
                encryption_headers: new_upload.encryption_headers,
                bucket_name: bucket.name.clone(),
                checksum: new_upload.checksum,
                checksum_algorithm: new_upload.checksum_algorithm,
            },
            staging_dir: staging_dir.clone(),
            gate: tokio::sync::Mutex::new(()),
        });

        // The entry guard must drop before any await below.
        let inserted = match self.registry.entry(new_upload.upload_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        };
        if !inserted {
            // Upload ids are never reused; a duplicate means the caller
            // generated a colliding id.
            let _ = tokio::fs::remove_dir_all(&staging_dir).await;
            return Err(StoreError::Internal(anyhow::anyhow!(
                "upload id already registered: {}",
                new_upload.upload_id
            )));
        }

        debug!(
            bucket = %bucket.name,
            key = %upload.key,
            upload_id = %upload.upload_id,
            "prepared multipart upload"
        );

        Ok(upload)
    }

    /// List registered uploads, optionally filtered by bucket name and key
    /// prefix, ordered by `(key, upload_id)`.
    #[must_use]
    pub fn list_uploads(
        &self,
        bucket_name: Option<&str>,
        prefix: Option<&str>,
    ) -> Vec<MultipartUpload> {
        let mut uploads: Vec<MultipartUpload> = self
            .registry
            .iter()
            .filter(|entry| {
                bucket_name.is_none_or(|name| entry.value().info.bucket_name == name)
            })
            .filter(|entry| {
                prefix
                    .filter(|p| !p.is_empty())
                    .is_none_or(|p| entry.value().info.upload.key.starts_with(p))
            })
            .map(|entry| entry.value().info.upload.clone())
            .collect();

        uploads.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| a.upload_id.cmp(&b.upload_id))
        });
        uploads
    }

    /// Look up a registered upload's descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoSuchUpload`] for unknown or terminated ids.
    pub fn get_upload(&self, upload_id: &str) -> StoreResult<MultipartUpload> {
        self.registry
            .get(upload_id)
            .map(|entry| entry.value().info.upload.clone())
            .ok_or_else(|| StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
    }

    /// Stage a part from a byte stream, overwriting any existing part with
    /// the same number. Returns the part's ETag: the hex MD5 of the written
    /// bytes, KMS-tagged when the encryption headers carry a key id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the upload is not registered.
    /// - [`StoreError::Internal`] on I/O failure.
    pub async fn put_part(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        upload_id: &str,
        part_number: PartNumber,
        mut payload: impl AsyncRead + Unpin,
        encryption_headers: &HashMap<String, String>,
    ) -> StoreResult<String> {
        self.require_registered(upload_id)?;

        let part_path = layout::part_path(bucket, &object_id, upload_id, part_number);
        let mut file = tokio::fs::File::create(&part_path)
            .await
            .with_context(|| format!("failed to create part file {}", part_path.display()))?;

        let mut hasher = <md5::Md5 as Digest>::new();
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut written: u64 = 0;
        loop {
            let n = payload
                .read(&mut buf)
                .await
                .context("failed to read part payload")?;
            if n == 0 {
                break;
            }
            Digest::update(&mut hasher, &buf[..n]);
            file.write_all(&buf[..n])
                .await
                .with_context(|| format!("failed to write part file {}", part_path.display()))?;
            written += n as u64;
        }
        file.flush()
            .await
            .with_context(|| format!("failed to flush part file {}", part_path.display()))?;

        let md5_hex = hex::encode(Digest::finalize(hasher));
        let etag = kms_tagged(md5_hex, kms_key_id(encryption_headers));

        debug!(
            bucket = %bucket.name,
            upload_id,
            part_number = part_number.get(),
            size = written,
            "staged part"
        );

        Ok(etag)
    }

    /// Stage a part from a file already spooled to disk by the caller.
    ///
    /// The source file is moved into the staging directory and hashed in
    /// place. Semantics otherwise match [`put_part`](Self::put_part).
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the upload is not registered.
    /// - [`StoreError::Internal`] on I/O failure.
    pub async fn put_part_from_path(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        upload_id: &str,
        part_number: PartNumber,
        source: &Path,
        encryption_headers: &HashMap<String, String>,
    ) -> StoreResult<String> {
        self.require_registered(upload_id)?;

        let part_path = layout::part_path(bucket, &object_id, upload_id, part_number);
        self.object_store
            .materialize_part_from_path(source, &part_path)
            .await?;

        kms_tagged_md5(kms_key_id(encryption_headers), &part_path).await
    }

    /// Stage a part by copying a byte range of an existing object into the
    /// destination upload. Returns the new part's ETag.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the destination upload is not
    ///   registered or its staging directory is missing.
    /// - [`StoreError::NoSuchKey`] when the source object does not exist.
    /// - [`StoreError::InvalidRange`] when the range starts beyond the
    ///   source length.
    /// - [`StoreError::Internal`] on I/O failure.
    #[allow(clippy::too_many_arguments)]
    pub async fn copy_part(
        &self,
        source_bucket: &BucketDirectory,
        source_object_id: Uuid,
        range: Option<CopyRange>,
        part_number: PartNumber,
        dest_bucket: &BucketDirectory,
        dest_object_id: Uuid,
        upload_id: &str,
        encryption_headers: &HashMap<String, String>,
    ) -> StoreResult<String> {
        self.require_prepared(dest_bucket, dest_object_id, upload_id)
            .await?;

        let source_meta = self
            .object_store
            .get_object_metadata(source_bucket, source_object_id)
            .await?;
        let source_len = tokio::fs::metadata(&source_meta.data_path)
            .await
            .with_context(|| {
                format!(
                    "failed to stat source object {}",
                    source_meta.data_path.display()
                )
            })?
            .len();

        let (start, count) = match range {
            Some(range) => {
                let (start, end) = range.bounds(source_len)?;
                (start, end - start + 1)
            }
            None => (0, source_len),
        };

        let part_path = layout::part_path(dest_bucket, &dest_object_id, upload_id, part_number);
        let mut source_file = tokio::fs::File::open(&source_meta.data_path)
            .await
            .with_context(|| {
                format!(
                    "failed to open source object {}",
                    source_meta.data_path.display()
                )
            })?;
        source_file
            .seek(std::io::SeekFrom::Start(start))
            .await
            .context("failed to seek to copy range start")?;

        let mut part_file = tokio::fs::File::create(&part_path)
            .await
            .with_context(|| format!("failed to create part file {}", part_path.display()))?;

        let mut hasher = <md5::Md5 as Digest>::new();
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut remaining = count;
        while remaining > 0 {
            let want = buf.len().min(usize::try_from(remaining).unwrap_or(buf.len()));
            let n = source_file
                .read(&mut buf[..want])
                .await
                .context("failed to read source object")?;
            if n == 0 {
                return Err(StoreError::Internal(anyhow::anyhow!(
                    "source object truncated while copying range"
                )));
            }
            Digest::update(&mut hasher, &buf[..n]);
            part_file
                .write_all(&buf[..n])
                .await
                .with_context(|| format!("failed to write part file {}", part_path.display()))?;
            remaining -= n as u64;
        }
        part_file
            .flush()
            .await
            .with_context(|| format!("failed to flush part file {}", part_path.display()))?;

        let md5_hex = hex::encode(Digest::finalize(hasher));
        let etag = kms_tagged(md5_hex, kms_key_id(encryption_headers));

        debug!(
            source_bucket = %source_bucket.name,
            dest_bucket = %dest_bucket.name,
            upload_id,
            part_number = part_number.get(),
            bytes = count,
            "copied part from object"
        );

        Ok(etag)
    }

    /// List the staged parts of an upload, sorted ascending by part number.
    ///
    /// Part ETags are recomputed from the staged files on every call.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the staging directory is missing.
    /// - [`StoreError::Internal`] on I/O failure.
    pub async fn list_parts(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        upload_id: &str,
    ) -> StoreResult<Vec<Part>> {
        let staging_dir = layout::parts_dir(bucket, &object_id, upload_id);
        let mut dir = match tokio::fs::read_dir(&staging_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NoSuchUpload {
                    upload_id: upload_id.to_owned(),
                });
            }
            Err(e) => {
                return Err(StoreError::Internal(anyhow::Error::from(e).context(
                    format!("failed to read staging directory {}", staging_dir.display()),
                )));
            }
        };

        let mut parts = Vec::new();
        while let Some(dir_entry) = dir
            .next_entry()
            .await
            .context("failed to scan staging directory")?
        {
            let file_name = dir_entry.file_name();
            let Some(part_number) = file_name
                .to_str()
                .and_then(layout::part_number_from_file_name)
            else {
                continue;
            };

            let path = dir_entry.path();
            let metadata = dir_entry
                .metadata()
                .await
                .with_context(|| format!("failed to stat part file {}", path.display()))?;
            let last_modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let etag = hex::encode(md5_digest_file(&path).await?);

            parts.push(Part {
                part_number,
                etag,
                last_modified,
                size: metadata.len(),
            });
        }

        parts.sort_by_key(|part| part.part_number);
        Ok(parts)
    }

    /// Abort an upload: unregister it, then remove its staging directory
    /// and any partially-staged data file for the object.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the upload is not registered, or
    ///   when a concurrent complete/abort won the race.
    /// - [`StoreError::Internal`] when staged files cannot be removed; the
    ///   upload is unregistered regardless.
    pub async fn abort_upload(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        upload_id: &str,
    ) -> StoreResult<()> {
        let entry = self.entry(upload_id)?;
        let _gate = entry.gate.lock().await;

        // The upload may have completed or aborted while we waited.
        self.require_registered(upload_id)?;

        // Unregister before touching disk so no observer sees a registered
        // upload without its staging directory.
        self.registry.remove(upload_id);

        let staging_dir = layout::parts_dir(bucket, &object_id, upload_id);
        if let Err(e) = tokio::fs::remove_dir_all(&staging_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    bucket = %bucket.name,
                    upload_id,
                    error = %e,
                    "failed to remove staging directory on abort"
                );
                return Err(StoreError::Internal(anyhow::Error::from(e).context(
                    format!(
                        "failed to remove staging directory {}",
                        staging_dir.display()
                    ),
                )));
            }
        }

        // A partially staged data file may exist if a complete failed late.
        let data_path = self.object_store.data_path(bucket, object_id);
        if let Err(e) = tokio::fs::remove_file(&data_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    bucket = %bucket.name,
                    upload_id,
                    error = %e,
                    "failed to remove staged data file on abort"
                );
            }
        }

        debug!(bucket = %bucket.name, upload_id, "aborted multipart upload");
        Ok(())
    }

    /// Complete an upload: assemble the client's part list into the final
    /// object, store it, and tear down the staging state. Returns the
    /// multipart ETag (`<hex>-<count>`, unquoted).
    ///
    /// Part numbers must be strictly ascending. The assembled payload is
    /// the byte-for-byte concatenation of the part files in the order
    /// given.
    ///
    /// On failure before the object is stored, the upload stays registered
    /// and the client may retry. A cleanup failure after a successful store
    /// is logged and the call still succeeds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoSuchUpload`] when the upload is not registered, or
    ///   when a concurrent complete/abort won the race.
    /// - [`StoreError::InvalidPartOrder`] when part numbers are not
    ///   strictly ascending.
    /// - [`StoreError::InvalidPart`] when a referenced part file is
    ///   missing.
    /// - [`StoreError::Internal`] on I/O failure.
    pub async fn complete_upload(
        &self,
        bucket: &BucketDirectory,
        key: &str,
        object_id: Uuid,
        upload_id: &str,
        completed_parts: &[CompletedPart],
        encryption_headers: &HashMap<String, String>,
    ) -> StoreResult<String> {
        let entry = self.entry(upload_id)?;
        let _gate = entry.gate.lock().await;

        // The upload may have been aborted while we waited for the gate.
        self.require_registered(upload_id)?;

        let mut last_number = 0u32;
        let mut part_paths = Vec::with_capacity(completed_parts.len());
        for part in completed_parts {
            if part.part_number.get() <= last_number {
                return Err(StoreError::InvalidPartOrder);
            }
            last_number = part.part_number.get();

            let path = layout::part_path(bucket, &object_id, upload_id, part.part_number);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(StoreError::InvalidPart);
            }
            part_paths.push(path);
        }

        // The assembled payload lives in a temp file that is deleted on
        // every exit path; a successful store renames it away first.
        let temp_path = tempfile::NamedTempFile::new()
            .context("failed to create assembly temp file")?
            .into_temp_path();
        let (etag, size) = self
            .assemble_parts(&part_paths, &temp_path)
            .await?;

        let info = &entry.info;
        self.object_store
            .store_object(
                bucket,
                object_id,
                StoreObjectParams {
                    key: key.to_owned(),
                    content_type: info.content_type.clone(),
                    store_headers: info.store_headers.clone(),
                    source_path: temp_path.to_path_buf(),
                    user_metadata: info.user_metadata.clone(),
                    encryption_headers: encryption_headers.clone(),
                    etag: etag.clone(),
                    tags: Vec::new(),
                    checksum_algorithm: info.checksum_algorithm,
                    checksum: info.checksum.clone(),
                    owner: info.upload.owner.clone(),
                    storage_class: info.upload.storage_class,
                },
            )
            .await?;

        self.registry.remove(upload_id);

        let staging_dir = layout::parts_dir(bucket, &object_id, upload_id);
        if let Err(e) = tokio::fs::remove_dir_all(&staging_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                // The object is installed; the leftover staging directory is
                // an operator concern, not a client error.
                error!(
                    bucket = %bucket.name,
                    key,
                    upload_id,
                    error = %e,
                    "failed to remove staging directory after complete"
                );
            }
        }

        debug!(
            bucket = %bucket.name,
            key,
            upload_id,
            parts = completed_parts.len(),
            size,
            etag = %etag,
            "completed multipart upload"
        );

        Ok(etag)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Concatenate the part files into `dest`, computing per-part MD5
    /// digests in the same pass. Returns the multipart ETag and total size.
    async fn assemble_parts(
        &self,
        part_paths: &[PathBuf],
        dest: &Path,
    ) -> StoreResult<(String, u64)> {
        let mut dest_file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to open assembly file {}", dest.display()))?;

        let mut part_digests: Vec<[u8; 16]> = Vec::with_capacity(part_paths.len());
        let mut total: u64 = 0;
        let mut buf = vec![0u8; COPY_BUF_SIZE];

        for path in part_paths {
            let mut part_file = match tokio::fs::File::open(path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StoreError::InvalidPart);
                }
                Err(e) => {
                    return Err(StoreError::Internal(anyhow::Error::from(e).context(
                        format!("failed to open part file {}", path.display()),
                    )));
                }
            };

            let mut hasher = <md5::Md5 as Digest>::new();
            loop {
                let n = part_file
                    .read(&mut buf)
                    .await
                    .with_context(|| format!("failed to read part file {}", path.display()))?;
                if n == 0 {
                    break;
                }
                Digest::update(&mut hasher, &buf[..n]);
                dest_file
                    .write_all(&buf[..n])
                    .await
                    .with_context(|| format!("failed to write assembly file {}", dest.display()))?;
                total += n as u64;
            }
            part_digests.push(Digest::finalize(hasher).into());
        }

        dest_file
            .flush()
            .await
            .with_context(|| format!("failed to flush assembly file {}", dest.display()))?;

        Ok((multipart_etag_from_digests(&part_digests), total))
    }

    /// Clone the registered entry for `upload_id`.
    fn entry(&self, upload_id: &str) -> StoreResult<Arc<UploadEntry>> {
        self.registry
            .get(upload_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
    }

    /// Fail with `NoSuchUpload` unless `upload_id` is registered.
    fn require_registered(&self, upload_id: &str) -> StoreResult<()> {
        if self.registry.contains_key(upload_id) {
            Ok(())
        } else {
            Err(StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
        }
    }

    /// Fail with `NoSuchUpload` unless `upload_id` is registered and its
    /// staging directory exists.
    async fn require_prepared(
        &self,
        bucket: &BucketDirectory,
        object_id: Uuid,
        upload_id: &str,
    ) -> StoreResult<()> {
        self.require_registered(upload_id)?;
        let staging_dir = layout::parts_dir(bucket, &object_id, upload_id);
        if tokio::fs::try_exists(&staging_dir).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(StoreError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            })
        }
    }
}

impl Drop for MultipartStore {
    fn drop(&mut self) {
        if self.retain_files_on_exit {
            return;
        }
        for entry in self.registry.iter() {
            let staging_dir = &entry.value().staging_dir;
            if let Err(e) = std::fs::remove_dir_all(staging_dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        staging_dir = %staging_dir.display(),
                        error = %e,
                        "failed to sweep staging directory on shutdown"
                    );
                }
            }
        }
    }
}

/// Extract the KMS key id from the encryption headers, if present.
fn kms_key_id(encryption_headers: &HashMap<String, String>) -> Option<&str> {
    encryption_headers.get(KMS_KEY_ID_HEADER).map(String::as_str)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
