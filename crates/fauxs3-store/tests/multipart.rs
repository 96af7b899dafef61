//! End-to-end multipart upload scenarios against a real filesystem root.

use std::collections::HashMap;
use std::sync::Arc;

use digest::Digest;
use uuid::Uuid;

use fauxs3_store::digest::{md5_hex, multipart_etag_from_digests};
use fauxs3_store::error::StoreError;
use fauxs3_store::multipart::{MultipartStore, NewUpload};
use fauxs3_store::object::{FsObjectStore, ObjectStore, StoreObjectParams};
use fauxs3_store::types::{
    BucketDirectory, CompletedPart, CopyRange, Owner, PartNumber, StorageClass,
};
use fauxs3_store::utils::{generate_object_id, generate_upload_id};

const MIB: usize = 1024 * 1024;

struct Harness {
    _root: tempfile::TempDir,
    bucket: BucketDirectory,
    object_store: Arc<FsObjectStore>,
    store: MultipartStore,
}

async fn harness() -> Harness {
    let root = tempfile::tempdir().expect("tempdir");
    let bucket = BucketDirectory::new("scenario-bucket", root.path().join("scenario-bucket"));
    tokio::fs::create_dir_all(bucket.path()).await.expect("mkdir");
    let object_store = Arc::new(FsObjectStore::new());
    let store = MultipartStore::new(object_store.clone(), false);
    Harness {
        _root: root,
        bucket,
        object_store,
        store,
    }
}

fn upload_params(key: &str, object_id: Uuid, upload_id: &str) -> NewUpload {
    NewUpload {
        key: key.to_owned(),
        object_id,
        upload_id: upload_id.to_owned(),
        content_type: "application/octet-stream".to_owned(),
        store_headers: HashMap::new(),
        owner: Owner::default(),
        initiator: Owner::default(),
        user_metadata: HashMap::new(),
        encryption_headers: HashMap::new(),
        storage_class: StorageClass::Standard,
        checksum: None,
        checksum_algorithm: None,
    }
}

fn completed(number: u32, etag: &str) -> CompletedPart {
    CompletedPart {
        part_number: PartNumber::new(number).expect("part number"),
        etag: etag.to_owned(),
    }
}

async fn object_bytes(h: &Harness, object_id: Uuid) -> Vec<u8> {
    tokio::fs::read(h.object_store.data_path(&h.bucket, object_id))
        .await
        .expect("read object data")
}

#[tokio::test]
async fn test_should_complete_single_part_upload_of_ten_mib() {
    let h = harness().await;
    let object_id = generate_object_id();
    let upload_id = generate_upload_id();
    h.store
        .prepare_upload(&h.bucket, upload_params("big.bin", object_id, &upload_id))
        .await
        .expect("prepare");

    let payload = vec![0x5Au8; 10 * MIB];
    let part_etag = h
        .store
        .put_part(
            &h.bucket,
            object_id,
            &upload_id,
            PartNumber::new(1).expect("part number"),
            payload.as_slice(),
            &HashMap::new(),
        )
        .await
        .expect("put_part");
    assert_eq!(part_etag, md5_hex(&payload));

    let etag = h
        .store
        .complete_upload(
            &h.bucket,
            "big.bin",
            object_id,
            &upload_id,
            &[completed(1, &part_etag)],
            &HashMap::new(),
        )
        .await
        .expect("complete");

    // ETag is MD5(MD5(payload)) with a -1 suffix.
    let raw: [u8; 16] = md5::Md5::digest(&payload).into();
    assert_eq!(etag, multipart_etag_from_digests(&[raw]));
    assert!(etag.ends_with("-1"));

    let metadata = h
        .object_store
        .get_object_metadata(&h.bucket, object_id)
        .await
        .expect("metadata");
    assert_eq!(metadata.size, 10_485_760);
    assert_eq!(metadata.etag, etag);
    assert_eq!(object_bytes(&h, object_id).await, payload);
}

#[tokio::test]
async fn test_should_compute_documented_etag_for_two_part_upload() {
    let h = harness().await;
    let object_id = generate_object_id();
    let upload_id = generate_upload_id();
    h.store
        .prepare_upload(&h.bucket, upload_params("two.bin", object_id, &upload_id))
        .await
        .expect("prepare");

    let part1 = vec![b'a'; 5 * MIB];
    let part2 = vec![b'b'; 1024];

    let e1 = h
        .store
        .put_part(
            &h.bucket,
            object_id,
            &upload_id,
            PartNumber::new(1).expect("part number"),
            part1.as_slice(),
            &HashMap::new(),
        )
        .await
        .expect("put part 1");
    let e2 = h
        .store
        .put_part(
            &h.bucket,
            object_id,
            &upload_id,
            PartNumber::new(2).expect("part number"),
            part2.as_slice(),
            &HashMap::new(),
        )
        .await
        .expect("put part 2");

    let etag = h
        .store
        .complete_upload(
            &h.bucket,
            "two.bin",
            object_id,
            &upload_id,
            &[completed(1, &e1), completed(2, &e2)],
            &HashMap::new(),
        )
        .await
        .expect("complete");

    // hex(MD5(m1 || m2)) + "-2", where m1/m2 are the raw part digests.
    let m1: [u8; 16] = md5::Md5::digest(&part1).into();
    let m2: [u8; 16] = md5::Md5::digest(&part2).into();
    let mut concat = Vec::new();
    concat.extend_from_slice(&m1);
    concat.extend_from_slice(&m2);
    let expected = format!("{}-2", hex::encode(md5::Md5::digest(&concat)));
    assert_eq!(etag, expected);

    let data = object_bytes(&h, object_id).await;
    assert_eq!(data.len(), 5 * MIB + 1024);
    assert!(data[..5 * MIB].iter().all(|&b| b == b'a'));
    assert!(data[5 * MIB..].iter().all(|&b| b == b'b'));
}

#[tokio::test]
async fn test_should_round_trip_arbitrary_part_splits() {
    let h = harness().await;
    let data: Vec<u8> = (0..257 * 1024u32).map(|i| (i.wrapping_mul(31) % 256) as u8).collect();

    // Uneven splits, including a 1-byte part.
    let splits = [1usize, 64 * 1024, 100_000, data.len() - 1 - 64 * 1024 - 100_000];
    assert_eq!(splits.iter().sum::<usize>(), data.len());

    let object_id = generate_object_id();
    let upload_id = generate_upload_id();
    h.store
        .prepare_upload(&h.bucket, upload_params("split.bin", object_id, &upload_id))
        .await
        .expect("prepare");

    let mut offset = 0;
    let mut parts = Vec::new();
    for (i, len) in splits.iter().enumerate() {
        let number = u32::try_from(i + 1).expect("part index");
        let slice = &data[offset..offset + len];
        let etag = h
            .store
            .put_part(
                &h.bucket,
                object_id,
                &upload_id,
                PartNumber::new(number).expect("part number"),
                slice,
                &HashMap::new(),
            )
            .await
            .expect("put part");
        parts.push(completed(number, &etag));
        offset += len;
    }

    h.store
        .complete_upload(
            &h.bucket,
            "split.bin",
            object_id,
            &upload_id,
            &parts,
            &HashMap::new(),
        )
        .await
        .expect("complete");

    assert_eq!(object_bytes(&h, object_id).await, data);
}

#[tokio::test]
async fn test_should_abort_upload_after_part_was_staged() {
    let h = harness().await;
    let object_id = generate_object_id();
    let upload_id = generate_upload_id();
    h.store
        .prepare_upload(&h.bucket, upload_params("aborted.bin", object_id, &upload_id))
        .await
        .expect("prepare");

    let e1 = h
        .store
        .put_part(
            &h.bucket,
            object_id,
            &upload_id,
            PartNumber::new(1).expect("part number"),
            vec![0u8; 1024].as_slice(),
            &HashMap::new(),
        )
        .await
        .expect("put part");

    h.store
        .abort_upload(&h.bucket, object_id, &upload_id)
        .await
        .expect("abort");

    // Not listed, staging gone, complete rejected.
    assert!(h.store.list_uploads(Some("scenario-bucket"), None).is_empty());
    assert!(!fauxs3_store::layout::parts_dir(&h.bucket, &object_id, &upload_id).exists());
    let result = h
        .store
        .complete_upload(
            &h.bucket,
            "aborted.bin",
            object_id,
            &upload_id,
            &[completed(1, &e1)],
            &HashMap::new(),
        )
        .await;
    assert!(matches!(result, Err(StoreError::NoSuchUpload { .. })));
}

#[tokio::test]
async fn test_should_copy_range_into_part_and_complete() {
    let h = harness().await;

    // A 1 MiB source object with position-dependent bytes.
    let source: Vec<u8> = (0..MIB as u32).map(|i| (i.wrapping_mul(7) % 256) as u8).collect();
    let source_id = generate_object_id();
    let spool = h.bucket.path().parent().unwrap().join("source.body");
    tokio::fs::write(&spool, &source).await.expect("write spool");
    h.object_store
        .store_object(
            &h.bucket,
            source_id,
            StoreObjectParams {
                key: "source.bin".to_owned(),
                content_type: "application/octet-stream".to_owned(),
                store_headers: HashMap::new(),
                source_path: spool,
                user_metadata: HashMap::new(),
                encryption_headers: HashMap::new(),
                etag: md5_hex(&source),
                tags: Vec::new(),
                checksum_algorithm: None,
                checksum: None,
                owner: Owner::default(),
                storage_class: StorageClass::Standard,
            },
        )
        .await
        .expect("store source");

    let dest_id = generate_object_id();
    let upload_id = generate_upload_id();
    h.store
        .prepare_upload(&h.bucket, upload_params("slice.bin", dest_id, &upload_id))
        .await
        .expect("prepare");

    let range = CopyRange::parse("bytes=100-199").expect("range");
    let etag = h
        .store
        .copy_part(
            &h.bucket,
            source_id,
            Some(range),
            PartNumber::new(1).expect("part number"),
            &h.bucket,
            dest_id,
            &upload_id,
            &HashMap::new(),
        )
        .await
        .expect("copy_part");
    assert_eq!(etag, md5_hex(&source[100..200]));

    h.store
        .complete_upload(
            &h.bucket,
            "slice.bin",
            dest_id,
            &upload_id,
            &[completed(1, &etag)],
            &HashMap::new(),
        )
        .await
        .expect("complete");

    assert_eq!(object_bytes(&h, dest_id).await, &source[100..200]);
}

#[tokio::test]
async fn test_should_produce_different_etags_for_permuted_parts() {
    let h = harness().await;
    let chunks: [&[u8]; 2] = [b"first part content", b"second part content"];

    let mut etags = Vec::new();
    for (name, order) in [("fwd", [0usize, 1]), ("rev", [1, 0])] {
        let object_id = generate_object_id();
        let upload_id = generate_upload_id();
        h.store
            .prepare_upload(&h.bucket, upload_params(name, object_id, &upload_id))
            .await
            .expect("prepare");

        let mut parts = Vec::new();
        for (i, &chunk_index) in order.iter().enumerate() {
            let number = u32::try_from(i + 1).expect("part index");
            let etag = h
                .store
                .put_part(
                    &h.bucket,
                    object_id,
                    &upload_id,
                    PartNumber::new(number).expect("part number"),
                    chunks[chunk_index],
                    &HashMap::new(),
                )
                .await
                .expect("put part");
            parts.push(completed(number, &etag));
        }

        etags.push(
            h.store
                .complete_upload(&h.bucket, name, object_id, &upload_id, &parts, &HashMap::new())
                .await
                .expect("complete"),
        );
    }

    assert_ne!(etags[0], etags[1]);
}
