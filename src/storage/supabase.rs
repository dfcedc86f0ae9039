//! Supabase Storage REST backend.
//!
//! Object routes live under `{api_url}/storage/v1/object`. Public objects are
//! served from `{api_url}/storage/v1/object/public/{bucket}/{key}` without
//! any request to the API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ProviderError, StoreError};
use crate::storage::{ObjectStore, PutOptions};

const STORAGE_PATH: [&str; 3] = ["storage", "v1", "object"];

/// Transport settings taken from the passthrough `options` table.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Recognized keys: `headers` (string table) and `timeout_secs`.
    /// Anything else is ignored.
    pub fn from_extras(extras: &Map<String, Value>) -> Result<Self, ProviderError> {
        let mut opts = Self::default();

        for (name, value) in extras {
            match name.as_str() {
                "headers" => {
                    let table = value.as_object().ok_or_else(|| {
                        ProviderError::Config("options.headers must be a table".into())
                    })?;
                    for (header, v) in table {
                        let v = v.as_str().ok_or_else(|| {
                            ProviderError::Config(format!("options.headers.{} must be a string", header))
                        })?;
                        let header_name = HeaderName::from_bytes(header.as_bytes())
                            .map_err(|e| ProviderError::Config(format!("header {}: {}", header, e)))?;
                        let header_value = HeaderValue::from_str(v)
                            .map_err(|e| ProviderError::Config(format!("header {}: {}", header, e)))?;
                        opts.headers.insert(header_name, header_value);
                    }
                }
                "timeout_secs" => {
                    let secs = value.as_u64().ok_or_else(|| {
                        ProviderError::Config("options.timeout_secs must be a positive integer".into())
                    })?;
                    opts.timeout = Some(Duration::from_secs(secs));
                }
                other => debug!("ignoring unrecognized client option {:?}", other),
            }
        }

        Ok(opts)
    }
}

pub struct SupabaseStorage {
    base: Url,
    bucket: String,
    client: Client,
}

impl SupabaseStorage {
    pub fn new(
        api_url: &str,
        api_key: &str,
        bucket: &str,
        options: &ClientOptions,
    ) -> Result<Self, ProviderError> {
        let base = Url::parse(api_url.trim_end_matches('/'))
            .map_err(|e| ProviderError::Config(format!("api_url {:?}: {}", api_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ProviderError::Config(format!("api_url {:?} is not a base url", api_url)));
        }

        let mut headers = options.headers.clone();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ProviderError::Config(format!("api_key: {}", e)))?;
        let apikey = HeaderValue::from_str(api_key)
            .map_err(|e| ProviderError::Config(format!("api_key: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(HeaderName::from_static("apikey"), apikey);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            base,
            bucket: bucket.to_string(),
            client,
        })
    }

    /// `{base}/storage/v1/object/{scope...}/{bucket}/{key...}` with each
    /// segment percent-encoded.
    fn object_url(&self, scope: &[&str], key: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(STORAGE_PATH);
            segments.extend(scope);
            segments.push(&self.bucket);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!("storage api returned {}: {}", status, body);
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        opts: &PutOptions,
    ) -> Result<(), StoreError> {
        let url = self.object_url(&[], Some(key))?;
        debug!("POST {} ({} bytes)", url, data.len());

        let resp = self
            .client
            .post(url)
            .header(CACHE_CONTROL, &opts.cache_control)
            .header(CONTENT_TYPE, &opts.content_type)
            .header("x-upsert", if opts.upsert { "true" } else { "false" })
            .body(data.to_vec())
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn public_url(&self, key: &str) -> Result<String, StoreError> {
        Ok(self.object_url(&["public"], Some(key))?.to_string())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let url = self.object_url(&[], None)?;
        debug!("DELETE {} {:?}", url, keys);

        let resp = self
            .client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": keys }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
