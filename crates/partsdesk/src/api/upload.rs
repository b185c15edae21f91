//! Scraping job uploads and image file parts.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};

use crate::api::error::ApiError;
use crate::models::{FieldError, ServiceTypes};

const MISSING: &str = "value_error.missing";
const INVALID: &str = "value_error";

/// The scraping job form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapingUpload {
    pub name: String,
    pub file: Option<PathBuf>,
    /// Defaults to the first scraping service of the catalog.
    pub scraper_type: Option<String>,
}

/// A scraping upload that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpload {
    pub name: String,
    pub file: PathBuf,
    pub scraper_type: String,
}

impl ScrapingUpload {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
            scraper_type: None,
        }
    }

    pub fn with_scraper_type(mut self, scraper_type: impl Into<String>) -> Self {
        self.scraper_type = Some(scraper_type.into());
        self
    }

    /// Checks the form against the service catalog without contacting the
    /// service. All problems are reported together.
    pub fn validate(&self, catalog: &ServiceTypes) -> Result<PreparedUpload, ApiError> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::for_field("name", "Name is required", MISSING));
        }

        let file = match &self.file {
            None => {
                errors.push(FieldError::for_field("file", "File is required", MISSING));
                None
            }
            Some(path) => match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() && meta.len() > 0 => Some(path.clone()),
                Ok(meta) if meta.is_file() => {
                    errors.push(FieldError::for_field("file", "File is empty", INVALID));
                    None
                }
                Ok(_) => {
                    errors.push(FieldError::for_field("file", "Not a regular file", INVALID));
                    None
                }
                Err(e) => {
                    errors.push(FieldError::for_field(
                        "file",
                        &format!("Cannot read file: {}", e),
                        INVALID,
                    ));
                    None
                }
            },
        };

        let scraper_type = match self.scraper_type.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                if catalog.scraping.is_empty() || catalog.scraping.iter().any(|s| s.id == id) {
                    Some(id.to_string())
                } else {
                    errors.push(FieldError::for_field(
                        "scraper_type",
                        &format!("Unknown scraper type '{}'", id),
                        INVALID,
                    ));
                    None
                }
            }
            _ => match catalog.scraping.first() {
                Some(service) => Some(service.id.clone()),
                None => {
                    errors.push(FieldError::for_field(
                        "scraper_type",
                        "No scraping service is available",
                        MISSING,
                    ));
                    None
                }
            },
        };

        match (file, scraper_type) {
            (Some(file), Some(scraper_type)) if errors.is_empty() => Ok(PreparedUpload {
                name: name.to_string(),
                file,
                scraper_type,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

/// Human-readable form of an estimated duration in seconds.
///
/// Durations above one hour are rounded up to whole hours, shorter ones to
/// whole minutes.
pub fn format_estimated_duration(seconds: u64) -> String {
    if seconds > 3600 {
        let hours = seconds.div_ceil(3600);
        format!("{} hours", hours)
    } else {
        let minutes = seconds.div_ceil(60);
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    }
}

/// Builds a multipart `file` part with a MIME type guessed from the name.
pub(crate) async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::ReadUpload {
            path: path.to_path_buf(),
            source: e,
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    log::debug!("Uploading {} as {} ({} bytes)", file_name, mime, bytes.len());

    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime.essence_str())?)
}

pub(crate) async fn file_form(path: &Path) -> Result<Form, ApiError> {
    Ok(Form::new().part("file", file_part(path).await?))
}
