use async_trait::async_trait;
use crate::error::StoreError;
use crate::storage::PutOptions;

/// A single bucket in an object-storage backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`. With `opts.upsert` an existing object is
    /// overwritten.
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        opts: &PutOptions,
    ) -> Result<(), StoreError>;

    /// Public URL for `key`. Does not check that the object exists.
    async fn public_url(
        &self,
        key: &str,
    ) -> Result<String, StoreError>;

    /// Remove every key in `keys`. Missing keys are reported the way the
    /// backend reports them.
    async fn remove(
        &self,
        keys: &[String],
    ) -> Result<(), StoreError>;
}
