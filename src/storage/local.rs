use tokio::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use crate::error::StoreError;
use crate::storage::{ObjectStore, PutOptions};

/// Filesystem-backed bucket. Objects live at `root/<bucket>/<key>` with a
/// `<key>.meta.json` sidecar holding the put options.
pub struct LocalStorage {
    root: PathBuf,
    public_base: Option<String>,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, bucket: &str, public_base: Option<String>) -> Self {
        Self {
            root: root.into().join(bucket),
            public_base: public_base.map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    pub fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.meta.json", key))
    }

    pub async fn read_meta(&self, key: &str) -> Result<PutOptions, StoreError> {
        let raw = fs::read(self.meta_path(key)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Keys must stay below the bucket root: no `..`, no absolute paths.
fn check_key(key: &str) -> Result<(), StoreError> {
    let escapes = Path::new(key).components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if escapes {
        return Err(StoreError::InvalidUrl(key.to_string()));
    }
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        opts: &PutOptions,
    ) -> Result<(), StoreError> {
        check_key(key)?;
        let path = self.data_path(key);
        if !opts.upsert && fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        fs::write(self.meta_path(key), serde_json::to_vec(opts)?).await?;
        debug!("local put {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    async fn public_url(&self, key: &str) -> Result<String, StoreError> {
        check_key(key)?;
        match &self.public_base {
            Some(base) => Ok(format!("{}/{}", base, key)),
            None => {
                let path = self.data_path(key);
                let absolute = if path.is_absolute() {
                    path
                } else {
                    std::env::current_dir()?.join(path)
                };
                reqwest::Url::from_file_path(&absolute)
                    .map(|u| u.to_string())
                    .map_err(|_| StoreError::InvalidUrl(absolute.display().to_string()))
            }
        }
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            check_key(key)?;
            remove_if_present(&self.data_path(key)).await?;
            remove_if_present(&self.meta_path(key)).await?;
        }
        Ok(())
    }
}
