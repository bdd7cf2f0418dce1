//! ObjectStore trait
//!
//! The transport seam behind [`S3Dict`](crate::S3Dict). Each method is one
//! round trip against a single, preconfigured bucket.

use async_trait::async_trait;

use crate::error::Result;

/// Key-addressed byte storage in one bucket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full content of an object
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the key is absent.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an object
    async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// Remove an object
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Check whether an object exists without downloading it
    ///
    /// A missing key is `Ok(false)`; authentication failures are errors.
    async fn object_exists(&self, key: &str) -> Result<bool>;

    /// List keys starting with `prefix`, in listing order
    ///
    /// Only the first page of the listing is returned.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fail early if this store is known to reject writes
    ///
    /// Checked by read-then-delete operations before the read.
    fn check_writable(&self) -> Result<()> {
        Ok(())
    }
}
