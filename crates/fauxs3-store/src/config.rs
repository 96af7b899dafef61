//! Store configuration.
//!
//! Provides [`StoreConfig`] for configuring the filesystem store.
//! Configuration values are loaded from `FAUXS3_*` environment variables
//! with sensible defaults for local test runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::BucketDirectory;

/// Store configuration.
///
/// # Examples
///
/// ```
/// use fauxs3_store::config::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert!(!config.retain_files_on_exit);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Root directory under which bucket directories are created.
    #[builder(default = PathBuf::from("./fauxs3-data"))]
    pub root_dir: PathBuf,

    /// When set, staging directories of in-progress uploads are left on
    /// disk at shutdown instead of being swept.
    #[builder(default = false)]
    pub retain_files_on_exit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./fauxs3-data"),
            retain_files_on_exit: false,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FAUXS3_ROOT_DIR` | `./fauxs3-data` |
    /// | `FAUXS3_RETAIN_FILES_ON_EXIT` | `false` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("FAUXS3_ROOT_DIR") {
            config.root_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FAUXS3_RETAIN_FILES_ON_EXIT") {
            config.retain_files_on_exit = parse_bool(&v);
        }

        config
    }

    /// Resolve the directory record for a bucket under the configured root.
    #[must_use]
    pub fn bucket_dir(&self, name: &str) -> BucketDirectory {
        BucketDirectory::new(name, self.root_dir.join(name))
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("./fauxs3-data"));
        assert!(!config.retain_files_on_exit);
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = StoreConfig::builder()
            .root_dir("/tmp/fauxs3".into())
            .retain_files_on_exit(true)
            .build();
        assert_eq!(config.root_dir, PathBuf::from("/tmp/fauxs3"));
        assert!(config.retain_files_on_exit);
    }

    #[test]
    fn test_should_resolve_bucket_dir_under_root() {
        let config = StoreConfig::builder().root_dir("/data".into()).build();
        let bucket = config.bucket_dir("my-bucket");
        assert_eq!(bucket.name, "my-bucket");
        assert_eq!(bucket.path, PathBuf::from("/data/my-bucket"));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = StoreConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("rootDir"));
        assert!(json.contains("retainFilesOnExit"));
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool(""));
    }
}
