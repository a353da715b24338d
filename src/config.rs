//! Process configuration
//!
//! Read once at startup: a `.env` file (if any) is loaded through `dotenvy`,
//! then `DATABASE_URL` / `DB_*` for the store and `MIRROR_*` for the rest.

use crate::connection::StoreConfig;
use crate::core::{MirrorError, Result};
use crate::loader::LoaderConfig;
use crate::schema::DdlOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spacexdata.com/v4/";
pub const DEFAULT_SCHEMA_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/r-spacex/SpaceX-API/master/docs/{dataset}/v4/schema.md";

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub store: StoreConfig,
    pub data_dir: PathBuf,
    pub schema_dir: PathBuf,
    /// Prefix joined with each dataset's source path.
    pub api_base_url: String,
    /// Schema document location; `{dataset}` is replaced by the dataset name.
    pub schema_url_template: String,
    pub loader: LoaderConfig,
    pub ddl: DdlOptions,
    pub http_timeout: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            data_dir: PathBuf::from("data"),
            schema_dir: PathBuf::from("schema"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            schema_url_template: DEFAULT_SCHEMA_URL_TEMPLATE.to_string(),
            loader: LoaderConfig::default(),
            ddl: DdlOptions::default(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl MirrorConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let store = StoreConfig::from_env()?;
        Self::from_vars(store, |key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Unset and empty
    /// variables fall back to the defaults.
    pub fn from_vars<F>(store: StoreConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self {
            store,
            ..Self::default()
        };

        if let Some(dir) = var("MIRROR_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("MIRROR_SCHEMA_DIR") {
            config.schema_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("MIRROR_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(template) = var("MIRROR_SCHEMA_URL_TEMPLATE") {
            config.schema_url_template = template;
        }
        if let Some(keys) = var("MIRROR_CONFLICT_KEYS") {
            config.loader = LoaderConfig::with_conflict_keys(
                keys.split(',').map(str::trim).filter(|key| !key.is_empty()),
            );
        }
        // Present but empty disables the extension prelude.
        if let Some(extension) = lookup("MIRROR_UUID_EXTENSION") {
            let extension = extension.trim();
            config.ddl.uuid_extension = (!extension.is_empty()).then(|| extension.to_string());
        }
        if let Some(secs) = var("MIRROR_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                MirrorError::Config("MIRROR_HTTP_TIMEOUT_SECS must be a number of seconds".into())
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(MirrorError::Config("API base URL cannot be empty".to_string()));
        }
        if !self.schema_url_template.contains("{dataset}") {
            return Err(MirrorError::Config(
                "Schema URL template must contain {dataset}".to_string(),
            ));
        }
        if self.loader.conflict_keys.is_empty() {
            return Err(MirrorError::Config(
                "At least one conflict key is required".to_string(),
            ));
        }
        self.store.validate()
    }

    pub fn data_url(&self, source_path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            source_path.trim_start_matches('/')
        )
    }

    pub fn schema_url(&self, dataset: &str) -> String {
        self.schema_url_template.replace("{dataset}", dataset)
    }
}
