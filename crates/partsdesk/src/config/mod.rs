pub mod loader;
pub mod schema;

pub use loader::{
    default_config_path, load_config, load_config_from_str, load_config_or_default,
    API_URL_ENV_VAR,
};
pub use schema::{
    ApiConfig, Config, DownloadsConfig, PagingConfig, PollingConfig, CONFIG_VERSION,
};
