use serde::{Serialize, Deserialize};

pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOptions {
    pub cache_control: String,
    pub upsert: bool,
    pub content_type: String,
}

impl PutOptions {
    /// Options used for every media upload: long-lived cache, overwrite on
    /// conflict.
    pub fn immutable(content_type: impl Into<String>) -> Self {
        Self {
            cache_control: IMMUTABLE_CACHE_CONTROL.to_string(),
            upsert: true,
            content_type: content_type.into(),
        }
    }
}
