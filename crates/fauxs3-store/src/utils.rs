//! Identifier helpers.

use uuid::Uuid;

/// Generate an opaque upload id for a new multipart upload.
///
/// Upload ids must be unique for the lifetime of the process and are never
/// reused after abort or complete; a random UUID satisfies both.
///
/// # Examples
///
/// ```
/// use fauxs3_store::utils::generate_upload_id;
///
/// let id = generate_upload_id();
/// assert_eq!(id.len(), 36);
/// assert_ne!(id, generate_upload_id());
/// ```
#[must_use]
pub fn generate_upload_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a stable internal object id, decoupled from the object key.
#[must_use]
pub fn generate_object_id() -> Uuid {
    Uuid::new_v4()
}
