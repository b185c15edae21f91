use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::secrets::SecretError;
use crate::status::UnknownStatus;
use crate::verification::VerificationError;

#[derive(Error, Debug)]
pub enum PartsdeskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Data integrity error: {0}")]
    UnknownStatus(#[from] UnknownStatus),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Action not available: {0}")]
    ActionUnavailable(String),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("No config file found and no default location available")]
    NoConfigLocation,
}

pub type Result<T> = std::result::Result<T, PartsdeskError>;
