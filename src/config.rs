use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use anyhow::Result;

use crate::error::ProviderError;

pub const DEFAULT_BUCKET: &str = "strapi-uploads";
pub const DEFAULT_CONFIG_FILE: &str = "supabase-upload.toml";

pub const ENV_API_URL: &str = "SUPABASE_API_URL";
pub const ENV_API_KEY: &str = "SUPABASE_API_KEY";
pub const ENV_BUCKET: &str = "SUPABASE_BUCKET";
pub const ENV_DIRECTORY: &str = "SUPABASE_DIRECTORY";

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

/// Provider settings as supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, alias = "apiUrl")]
    pub api_url: String,
    #[serde(default, alias = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub options: ProviderOptions,
}

/// `options` table. `dynamic_directory` is handled here; everything else is
/// handed to the storage client untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub dynamic_directory: bool,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            bucket: default_bucket(),
            directory: String::new(),
            options: ProviderOptions::default(),
        }
    }
}

/// Configuration after defaulting and normalization. Read-only for the
/// lifetime of a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub api_key: String,
    pub bucket: String,
    pub directory: String,
    pub client_options: Map<String, Value>,
}

/// Drop one leading and one trailing slash.
pub fn normalize_directory(directory: &str) -> String {
    let d = directory.strip_prefix('/').unwrap_or(directory);
    d.strip_suffix('/').unwrap_or(d).to_string()
}

/// `<year>/<month>` with an unpadded month, e.g. `2024/3`.
pub fn dated_directory(date: NaiveDate) -> String {
    format!("{}/{}", date.year(), date.month())
}

impl ProviderConfig {
    pub fn load_or_create(config_path: Option<&str>) -> Result<Self> {
        let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        if std::path::Path::new(config_file).exists() {
            let content = std::fs::read_to_string(config_file)?;
            let config: ProviderConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_file)?;
            tracing::info!("Wrote default config to {}", config_file);
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_API_URL) {
            self.api_url = v;
        }
        if let Some(v) = lookup(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Some(v) = lookup(ENV_BUCKET) {
            self.bucket = v;
        }
        if let Some(v) = lookup(ENV_DIRECTORY) {
            self.directory = v;
        }
    }

    pub fn resolve(&self) -> Result<ResolvedConfig, ProviderError> {
        self.resolve_on(Local::now().date_naive())
    }

    /// Resolve using `today` for the dynamic directory.
    pub fn resolve_on(&self, today: NaiveDate) -> Result<ResolvedConfig, ProviderError> {
        if self.api_url.trim().is_empty() {
            return Err(ProviderError::Config("api_url is required".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api_key is required".into()));
        }

        Ok(self.resolve_offline_on(today))
    }

    /// Like [`resolve_on`](Self::resolve_on) without requiring API
    /// credentials, for backends that do not talk to Supabase.
    pub fn resolve_offline_on(&self, today: NaiveDate) -> ResolvedConfig {
        let bucket = if self.bucket.is_empty() {
            default_bucket()
        } else {
            self.bucket.clone()
        };

        let mut directory = normalize_directory(&self.directory);
        if directory.is_empty() && self.options.dynamic_directory {
            directory = dated_directory(today);
        }

        ResolvedConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            bucket,
            directory,
            client_options: self.options.extras.clone(),
        }
    }
}
