use thiserror::Error;

/// Errors raised by an [`ObjectStore`](crate::storage::ObjectStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage api returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced to the host by [`Provider`](crate::provider::Provider).
///
/// Every variant carries the backend cause; nothing is retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to write object {key}")]
    StorageWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The write succeeded but the URL could not be resolved. The object
    /// stays in the bucket.
    #[error("failed to resolve public url for {key}")]
    PublicUrl {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete object {key}")]
    StorageDelete {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
