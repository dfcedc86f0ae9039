//! Upload provider that stores CMS media in a Supabase Storage bucket.
//!
//! [`Provider`] exposes `upload` and `delete`. Object keys are derived from
//! file metadata by [`object_key`]; the backend sits behind [`ObjectStore`].

pub mod config;
pub mod error;
pub mod file;
pub mod key;
pub mod provider;
pub mod storage;

pub use config::{ProviderConfig, ProviderOptions, ResolvedConfig};
pub use error::{ProviderError, StoreError};
pub use file::FileDescriptor;
pub use key::object_key;
pub use provider::{Provider, UploadParams, PROVIDER_ID, PROVIDER_NAME};
pub use storage::{LocalStorage, ObjectStore, PutOptions, SupabaseStorage};
