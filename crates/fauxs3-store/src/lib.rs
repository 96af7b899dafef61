//! Filesystem-backed object and multipart-upload storage for the fauxs3
//! S3 mock.
//!
//! This crate implements the storage side of an S3-compatible test double:
//! multipart upload lifecycle management, staged-part layout on disk, ETag
//! and checksum computation, and atomic installation of finalized objects.
//! HTTP routing, XML serialization, and authentication live in the layers
//! above and are not part of this crate.
//!
//! # Architecture
//!
//! ```text
//! HTTP layer (routing, XML, auth)
//!        |
//!        v
//! MultipartStore (upload registry, staging, complete/abort)
//!        |
//!        v
//! ObjectStore (FsObjectStore: atomic install + metadata records)
//!        |
//!        v
//! layout (on-disk path conventions) / digest (ETags, checksums)
//! ```
//!
//! A finished multipart upload is assembled by concatenating staged part
//! files in client order; its ETag is the S3-observable composite
//! `MD5(concat(MD5(part_i)))-<count>`.

pub mod config;
pub mod digest;
pub mod error;
pub mod layout;
pub mod multipart;
pub mod object;
pub mod types;
pub mod utils;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use multipart::MultipartStore;
pub use object::{FsObjectStore, ObjectStore};
