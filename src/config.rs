use crate::error::CatalogError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

const DEFAULT_API_BASE: &str = "https://cardle-strapi-api-0030dbf64eee.herokuapp.com/api";

/// Process-wide configuration, loaded once from defaults and `CARDLE_*` env vars.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("FATAL: invalid configuration: {e}"))
});

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database_url: String,
    pub makes_url: Url,
    pub models_url: Url,
    /// Upstream make list consumed by `sync`, written by `fetch`.
    pub makes_path: PathBuf,
    /// Export artifact read by the downstream app.
    pub export_path: PathBuf,
    pub page_limit: u32,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: usize,
    pub proxy: Option<Url>,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:cars.db".to_string(),
            makes_url: Url::parse(&format!("{DEFAULT_API_BASE}/makes/"))
                .expect("default makes url is valid"),
            models_url: Url::parse(&format!("{DEFAULT_API_BASE}/models"))
                .expect("default models url is valid"),
            makes_path: PathBuf::from("makes.json"),
            export_path: PathBuf::from("src/data/cars.json"),
            page_limit: 200,
            request_delay_ms: 200,
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            max_retries: 2,
            proxy: None,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, CatalogError> {
        Self::from_figment(Figment::from(Serialized::defaults(Config::default())))
    }

    fn from_figment(base: Figment) -> Result<Self, CatalogError> {
        Ok(base.merge(Env::prefixed("CARDLE_")).extract()?)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
