//! Bulk exports of a job's parts and images.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, Response};

use crate::api::client::ApiClient;
use crate::api::error::ApiError;

/// Which export of a job to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    EnrichedCsv,
    ScrapedCsv,
    ImagesZip,
}

impl DownloadKind {
    fn path_suffix(&self) -> &'static str {
        match self {
            DownloadKind::EnrichedCsv => "download-enriched",
            DownloadKind::ScrapedCsv => "download-scraped",
            DownloadKind::ImagesZip => "download-images",
        }
    }

    /// File name used when the response does not suggest one.
    pub fn default_filename(&self, job_id: &str) -> String {
        match self {
            DownloadKind::EnrichedCsv => format!("enriched_parts_{}.csv", job_id),
            DownloadKind::ScrapedCsv => format!("scraped_parts_{}.csv", job_id),
            DownloadKind::ImagesZip => format!("images_{}.zip", job_id),
        }
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadKind::EnrichedCsv => write!(f, "enriched parts CSV"),
            DownloadKind::ScrapedCsv => write!(f, "scraped parts CSV"),
            DownloadKind::ImagesZip => write!(f, "images archive"),
        }
    }
}

/// A fully received export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Writes the payload into `dir` under its file name.
    ///
    /// The file is written in one go; a failed write leaves no partial
    /// export under the final name.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf, ApiError> {
        let target = dir.join(&self.filename);
        let staging = dir.join(format!(".{}.part", self.filename));

        let failed = |e: std::io::Error| ApiError::DownloadFailed {
            what: self.filename.clone(),
            reason: format!("cannot write to '{}': {}", target.display(), e),
        };

        std::fs::create_dir_all(dir).map_err(failed)?;
        std::fs::write(&staging, &self.bytes).map_err(failed)?;
        if let Err(e) = std::fs::rename(&staging, &target) {
            let _ = std::fs::remove_file(&staging);
            return Err(failed(e));
        }

        log::info!("Saved {} ({} bytes)", target.display(), self.bytes.len());
        Ok(target)
    }
}

static RE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).unwrap());

/// Extracts a safe file name from a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let captured = RE_FILENAME.captures(header)?.get(1)?.as_str().trim();
    // Never let the server pick a directory.
    let name = captured
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(captured)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn header_value(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl ApiClient {
    /// Fetches one export of a job in full.
    pub async fn download(&self, job_id: &str, kind: DownloadKind) -> Result<Download, ApiError> {
        let what = kind.to_string();
        let path = format!("/jobs/{}/{}", job_id, kind.path_suffix());
        let operation = format!("download {}", what);

        let response = self
            .execute(&operation, self.request(Method::GET, &path))
            .await
            .map_err(|e| e.into_download_failure(&what))?;

        let filename = header_value(&response, CONTENT_DISPOSITION)
            .as_deref()
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| kind.default_filename(job_id));
        let content_type = header_value(&response, CONTENT_TYPE);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from(e).into_download_failure(&what))?;

        log::info!("Downloaded {} for job {} ({} bytes)", what, job_id, bytes.len());

        Ok(Download {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="export_42.csv""#).as_deref(),
            Some("export_42.csv")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=images.zip").as_deref(),
            Some("images.zip")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''parts.csv").as_deref(),
            Some("parts.csv")
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some("passwd")
        );
        assert!(filename_from_disposition("inline").is_none());
    }

    #[test]
    fn test_default_filenames() {
        assert_eq!(
            DownloadKind::EnrichedCsv.default_filename("j1"),
            "enriched_parts_j1.csv"
        );
        assert_eq!(
            DownloadKind::ScrapedCsv.default_filename("j1"),
            "scraped_parts_j1.csv"
        );
        assert_eq!(DownloadKind::ImagesZip.default_filename("j1"), "images_j1.zip");
    }

    #[test]
    fn test_save_into_writes_whole_payload() {
        let dir = TempDir::new().unwrap();
        let download = Download {
            filename: "scraped_parts_j1.csv".to_string(),
            content_type: Some("text/csv".to_string()),
            bytes: b"code,title\nAB-1,Pump\n".to_vec(),
        };

        let path = download.save_into(&dir.path().join("out")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), download.bytes);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
