use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::config::{ProviderConfig, ResolvedConfig};
use crate::error::{ProviderError, Result};
use crate::file::FileDescriptor;
use crate::key::{digest_hash, object_key};
use crate::storage::{ClientOptions, ObjectStore, PutOptions, SupabaseStorage};

pub const PROVIDER_ID: &str = "supabase";
pub const PROVIDER_NAME: &str = "Supabase Storage";

/// Caller-supplied parameters. Accepted for compatibility with the host's
/// provider contract and not read.
pub type UploadParams = Map<String, Value>;

/// Upload provider bound to one bucket and directory prefix.
pub struct Provider {
    config: ResolvedConfig,
    store: Arc<dyn ObjectStore>,
}

impl Provider {
    pub fn new(config: ResolvedConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self { config, store }
    }

    /// Resolve `config` and connect to Supabase Storage.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let resolved = config.resolve()?;
        let client_options = ClientOptions::from_extras(&resolved.client_options)?;
        let store = SupabaseStorage::new(
            &resolved.api_url,
            &resolved.api_key,
            &resolved.bucket,
            &client_options,
        )?;
        info!(
            "{} provider ready: bucket={} directory={:?}",
            PROVIDER_ID, resolved.bucket, resolved.directory
        );
        Ok(Self::new(resolved, Arc::new(store)))
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn key_for(&self, file: &FileDescriptor) -> String {
        object_key(&self.config.directory, file)
    }

    /// Store `file.buffer` and set `file.url`.
    ///
    /// `file.hash` is replaced by its digest before the key is computed. If
    /// the URL lookup fails after a successful write, the object is left in
    /// place and `file.url` stays unset.
    pub async fn upload(&self, file: &mut FileDescriptor, _params: &UploadParams) -> Result<()> {
        file.hash = digest_hash(&file.hash);

        let key = self.key_for(file);
        let opts = PutOptions::immutable(file.mime.clone());
        debug!("uploading {} ({} bytes, {})", key, file.buffer.len(), file.mime);

        if let Err(source) = self.store.put(&key, &file.buffer, &opts).await {
            error!("upload of {} failed: {}", key, source);
            return Err(ProviderError::StorageWrite { key, source });
        }

        let key = self.key_for(file);
        let url = match self.store.public_url(&key).await {
            Ok(url) => url,
            Err(source) => {
                error!("public url lookup for {} failed: {}", key, source);
                return Err(ProviderError::PublicUrl { key, source });
            }
        };

        info!("uploaded {} -> {}", key, url);
        file.url = Some(url);
        Ok(())
    }

    /// Remove the object for `file` using its current hash.
    pub async fn delete(&self, file: &FileDescriptor, _params: &UploadParams) -> Result<()> {
        let key = self.key_for(file);
        debug!("deleting {}", key);

        self.store
            .remove(std::slice::from_ref(&key))
            .await
            .map_err(|source| {
                error!("delete of {} failed: {}", key, source);
                ProviderError::StorageDelete { key: key.clone(), source }
            })?;

        info!("deleted {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        fail_put: bool,
        fail_url: bool,
        fail_remove: bool,
        put_keys: Mutex<Vec<(String, PutOptions)>>,
        url_keys: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    fn backend_error() -> StoreError {
        StoreError::Status { status: 500, body: "boom".into() }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn put(&self, key: &str, _data: &[u8], opts: &PutOptions) -> Result<(), StoreError> {
            if self.fail_put {
                return Err(backend_error());
            }
            self.put_keys.lock().unwrap().push((key.to_string(), opts.clone()));
            Ok(())
        }

        async fn public_url(&self, key: &str) -> Result<String, StoreError> {
            if self.fail_url {
                return Err(StoreError::InvalidUrl(key.to_string()));
            }
            self.url_keys.lock().unwrap().push(key.to_string());
            Ok(format!("https://cdn.test/{}", key))
        }

        async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
            if self.fail_remove {
                return Err(backend_error());
            }
            self.removed.lock().unwrap().extend_from_slice(keys);
            Ok(())
        }
    }

    fn resolved(directory: &str) -> ResolvedConfig {
        ResolvedConfig {
            api_url: "https://project.supabase.co".into(),
            api_key: "anon".into(),
            bucket: "strapi-uploads".into(),
            directory: directory.into(),
            client_options: Map::new(),
        }
    }

    fn photo() -> FileDescriptor {
        FileDescriptor::new("photo", ".png", "abc123", "image/png")
            .with_path("thumbs")
            .with_buffer(b"png-bytes".to_vec())
    }

    #[tokio::test]
    async fn write_key_matches_url_key() {
        let store = Arc::new(MockStore::default());
        let provider = Provider::new(resolved("media"), store.clone());
        let mut file = photo();

        provider.upload(&mut file, &UploadParams::new()).await.unwrap();

        let put_key = store.put_keys.lock().unwrap()[0].0.clone();
        let url_key = store.url_keys.lock().unwrap()[0].clone();
        assert_eq!(put_key, url_key);
        assert_eq!(put_key, format!("media/thumbs/photo-{}.png", digest_hash("abc123")));
        assert_eq!(file.url.as_deref(), Some(format!("https://cdn.test/{}", put_key).as_str()));
    }

    #[tokio::test]
    async fn upload_rehashes_and_sets_put_options() {
        let store = Arc::new(MockStore::default());
        let provider = Provider::new(resolved(""), store.clone());
        let mut file = photo();

        provider.upload(&mut file, &UploadParams::new()).await.unwrap();

        assert_eq!(file.hash, digest_hash("abc123"));
        let (_, opts) = store.put_keys.lock().unwrap()[0].clone();
        assert_eq!(opts.cache_control, "public, max-age=31536000, immutable");
        assert!(opts.upsert);
        assert_eq!(opts.content_type, "image/png");
    }

    #[tokio::test]
    async fn write_failure_is_storage_write_error() {
        let store = Arc::new(MockStore { fail_put: true, ..Default::default() });
        let provider = Provider::new(resolved(""), store.clone());
        let mut file = photo();

        let err = provider.upload(&mut file, &UploadParams::new()).await.unwrap_err();

        assert!(matches!(err, ProviderError::StorageWrite { .. }));
        assert!(file.url.is_none());
        assert!(store.url_keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn url_failure_leaves_object_and_no_url() {
        let store = Arc::new(MockStore { fail_url: true, ..Default::default() });
        let provider = Provider::new(resolved(""), store.clone());
        let mut file = photo();

        let err = provider.upload(&mut file, &UploadParams::new()).await.unwrap_err();

        assert!(matches!(err, ProviderError::PublicUrl { .. }));
        assert_eq!(store.put_keys.lock().unwrap().len(), 1);
        assert!(store.removed.lock().unwrap().is_empty());
        assert!(file.url.is_none());
    }

    #[tokio::test]
    async fn delete_uses_current_hash() {
        let store = Arc::new(MockStore::default());
        let provider = Provider::new(resolved("media"), store.clone());
        let mut file = photo();
        provider.upload(&mut file, &UploadParams::new()).await.unwrap();

        provider.delete(&file, &UploadParams::new()).await.unwrap();

        let put_key = store.put_keys.lock().unwrap()[0].0.clone();
        assert_eq!(*store.removed.lock().unwrap(), vec![put_key]);
    }

    #[tokio::test]
    async fn delete_failure_propagates() {
        let store = Arc::new(MockStore { fail_remove: true, ..Default::default() });
        let provider = Provider::new(resolved(""), store);

        let err = provider.delete(&photo(), &UploadParams::new()).await.unwrap_err();

        match err {
            ProviderError::StorageDelete { key, source } => {
                assert_eq!(key, "thumbs/photo-abc123.png");
                assert!(matches!(source, StoreError::Status { status: 500, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn repeated_upload_to_same_key_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStorage::new(dir.path(), "strapi-uploads", None));
        let provider = Provider::new(resolved("media"), store.clone());

        let mut first = photo().with_buffer(b"v1".to_vec());
        let mut second = photo().with_buffer(b"v2".to_vec());
        provider.upload(&mut first, &UploadParams::new()).await.unwrap();
        provider.upload(&mut second, &UploadParams::new()).await.unwrap();

        assert_eq!(first.url, second.url);
        let key = provider.key_for(&second);
        assert_eq!(std::fs::read(store.data_path(&key)).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn local_round_trip_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStorage::new(dir.path(), "strapi-uploads", Some("https://cdn.test".into())));
        let provider = Provider::new(resolved(""), store.clone());
        let mut file = photo();

        provider.upload(&mut file, &UploadParams::new()).await.unwrap();
        let key = provider.key_for(&file);
        assert_eq!(file.url.as_deref(), Some(format!("https://cdn.test/{}", key).as_str()));
        assert!(store.data_path(&key).exists());

        provider.delete(&file, &UploadParams::new()).await.unwrap();
        assert!(!store.data_path(&key).exists());

        // already gone: the local backend treats it as a no-op
        provider.delete(&file, &UploadParams::new()).await.unwrap();
    }

    #[test]
    fn from_config_keeps_resolved_settings() {
        let cfg = ProviderConfig {
            api_url: "https://project.supabase.co".into(),
            api_key: "anon".into(),
            directory: "/media/".into(),
            ..Default::default()
        };
        let provider = Provider::from_config(&cfg).unwrap();

        assert_eq!(provider.config().bucket, "strapi-uploads");
        assert_eq!(provider.config().directory, "media");
        assert_eq!(provider.key_for(&photo()), "media/thumbs/photo-abc123.png");
        assert_eq!((PROVIDER_ID, PROVIDER_NAME), ("supabase", "Supabase Storage"));
    }

    #[test]
    fn from_config_requires_credentials() {
        let err = Provider::from_config(&ProviderConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::Config(_)));
    }
}
