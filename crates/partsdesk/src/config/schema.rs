use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiClientBuilder};
use crate::board::{DEFAULT_JOBS_PER_PAGE, DEFAULT_PARTS_PER_PAGE};
use crate::dashboard::DEFAULT_DASHBOARD_PAGE_SIZE;
use crate::error::Result;
use crate::secrets::{self, SecretError};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_base_url("http://localhost:8000")
    }
}

impl Config {
    /// A configuration with defaults everywhere except the service URL.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            api: ApiConfig {
                base_url: base_url.to_string(),
                token: None,
                token_file: None,
                token_env_var: None,
                connect_timeout_secs: default_connect_timeout_secs(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            polling: PollingConfig::default(),
            paging: PagingConfig::default(),
            downloads: DownloadsConfig::default(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    /// Resolves the bearer token. No configured source means no token.
    pub fn resolve_token(&self) -> std::result::Result<Option<SecretString>, SecretError> {
        secrets::resolve_secret_optional(
            self.api.token.as_deref(),
            self.api.token_file.as_deref(),
            self.api.token_env_var.as_deref(),
        )
    }

    pub fn client_builder(&self) -> Result<ApiClientBuilder> {
        Ok(ApiClient::builder(&self.api.base_url)
            .maybe_token(self.resolve_token()?)
            .connect_timeout(Duration::from_secs(self.api.connect_timeout_secs))
            .request_timeout(Duration::from_secs(self.api.request_timeout_secs)))
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        Ok(self.client_builder()?.build()?)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        PathBuf::from(secrets::expand_home(&self.downloads.directory))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env_var: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    500
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_jobs_per_page")]
    pub jobs_per_page: usize,
    #[serde(default = "default_parts_per_page")]
    pub parts_per_page: usize,
    #[serde(default = "default_dashboard_page_size")]
    pub dashboard_page_size: u32,
}

fn default_jobs_per_page() -> usize {
    DEFAULT_JOBS_PER_PAGE
}

fn default_parts_per_page() -> usize {
    DEFAULT_PARTS_PER_PAGE
}

fn default_dashboard_page_size() -> u32 {
    DEFAULT_DASHBOARD_PAGE_SIZE
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            jobs_per_page: DEFAULT_JOBS_PER_PAGE,
            parts_per_page: DEFAULT_PARTS_PER_PAGE,
            dashboard_page_size: DEFAULT_DASHBOARD_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadsConfig {
    #[serde(default = "default_downloads_directory")]
    pub directory: String,
}

fn default_downloads_directory() -> String {
    ".".to_string()
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            directory: default_downloads_directory(),
        }
    }
}
