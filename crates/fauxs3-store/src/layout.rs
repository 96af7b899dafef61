//! On-disk layout conventions.
//!
//! Every path the store touches is derived here, below a bucket's root
//! directory:
//!
//! ```text
//! <bucket>/<objectId>/<uploadId>/<partNumber>.part   staged multipart part
//! <bucket>/<objectId>/object.data                    finalized object payload
//! <bucket>/<objectId>/object.json                    object metadata record
//! ```
//!
//! Objects are addressed by their internal UUID rather than by key, so key
//! renames and overwrites never move data on disk.

use std::path::PathBuf;

use uuid::Uuid;

use crate::types::{BucketDirectory, PartNumber};

/// Suffix of staged part files.
pub const PART_SUFFIX: &str = ".part";

/// File name of a finalized object's payload.
pub const DATA_FILE_NAME: &str = "object.data";

/// File name of a finalized object's metadata record.
pub const METADATA_FILE_NAME: &str = "object.json";

/// The directory holding a single object's data and metadata.
#[must_use]
pub fn object_dir(bucket: &BucketDirectory, object_id: &Uuid) -> PathBuf {
    bucket.path().join(object_id.to_string())
}

/// The path of a finalized object's payload file.
#[must_use]
pub fn data_path(bucket: &BucketDirectory, object_id: &Uuid) -> PathBuf {
    object_dir(bucket, object_id).join(DATA_FILE_NAME)
}

/// The path of a finalized object's metadata record.
#[must_use]
pub fn metadata_path(bucket: &BucketDirectory, object_id: &Uuid) -> PathBuf {
    object_dir(bucket, object_id).join(METADATA_FILE_NAME)
}

/// The staging directory for one multipart upload.
#[must_use]
pub fn parts_dir(bucket: &BucketDirectory, object_id: &Uuid, upload_id: &str) -> PathBuf {
    object_dir(bucket, object_id).join(upload_id)
}

/// The path of a single staged part file.
#[must_use]
pub fn part_path(
    bucket: &BucketDirectory,
    object_id: &Uuid,
    upload_id: &str,
    part_number: PartNumber,
) -> PathBuf {
    parts_dir(bucket, object_id, upload_id).join(format!("{part_number}{PART_SUFFIX}"))
}

/// Derive the part number from a staged part's file name.
///
/// Returns `None` for files that are not `<n>.part` with `n` in the valid
/// part-number range; directory scans skip those.
///
/// # Examples
///
/// ```
/// use fauxs3_store::layout::part_number_from_file_name;
///
/// assert_eq!(part_number_from_file_name("3.part").map(|n| n.get()), Some(3));
/// assert!(part_number_from_file_name("readme.txt").is_none());
/// assert!(part_number_from_file_name("0.part").is_none());
/// ```
#[must_use]
pub fn part_number_from_file_name(name: &str) -> Option<PartNumber> {
    name.strip_suffix(PART_SUFFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bucket() -> BucketDirectory {
        BucketDirectory::new("test-bucket", "/data/test-bucket")
    }

    #[test]
    fn test_should_build_object_paths() {
        let bucket = test_bucket();
        let id = Uuid::nil();

        let dir = object_dir(&bucket, &id);
        assert_eq!(
            dir,
            PathBuf::from("/data/test-bucket/00000000-0000-0000-0000-000000000000"),
        );
        assert_eq!(data_path(&bucket, &id), dir.join("object.data"));
        assert_eq!(metadata_path(&bucket, &id), dir.join("object.json"));
    }

    #[test]
    fn test_should_build_staging_paths() {
        let bucket = test_bucket();
        let id = Uuid::nil();
        let part = PartNumber::new(7).expect("test part");

        let dir = parts_dir(&bucket, &id, "upload-1");
        assert_eq!(dir, object_dir(&bucket, &id).join("upload-1"));
        assert_eq!(
            part_path(&bucket, &id, "upload-1", part),
            dir.join("7.part"),
        );
    }

    #[test]
    fn test_should_parse_part_number_from_file_name() {
        assert_eq!(
            part_number_from_file_name("1.part").map(|n| n.get()),
            Some(1)
        );
        assert_eq!(
            part_number_from_file_name("10000.part").map(|n| n.get()),
            Some(10_000)
        );
    }

    #[test]
    fn test_should_skip_foreign_file_names() {
        assert!(part_number_from_file_name("object.data").is_none());
        assert!(part_number_from_file_name("part.part.bak").is_none());
        assert!(part_number_from_file_name("x.part").is_none());
        assert!(part_number_from_file_name("10001.part").is_none());
        assert!(part_number_from_file_name(".part").is_none());
    }
}
