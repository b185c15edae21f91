//! Resolution of the API bearer token from its configured sources.
//!
//! Sources are tried in priority order:
//!
//! 1. **Direct value** in the config (`api.token`), handy for local testing
//! 2. **File reference** (`api.token_file`), e.g. a mounted secret
//! 3. **Env var reference** (`api.token_env_var`)

use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first non-empty source.
///
/// A configured source that fails (missing file, unset variable) is an
/// error; it does not fall through to the next source.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = non_empty(direct) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::EmptyFile { path: expanded });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            // Env vars may carry a trailing newline
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_secret`], but a missing source yields `Ok(None)`.
///
/// The token is optional: an unauthenticated client is valid.
pub fn resolve_secret_optional(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<Option<SecretString>> {
    match resolve_secret(direct, file_path, env_var) {
        Ok(secret) => Ok(Some(secret)),
        Err(SecretError::NoSourceProvided) => Ok(None),
        Err(e) => Err(e),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Expands a leading `~` to the user's home directory.
pub(crate) fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("PARTSDESK_TEST_TOKEN_1", "env_value");
        let result =
            resolve_secret(Some("direct_value"), None, Some("PARTSDESK_TEST_TOKEN_1")).unwrap();
        assert_eq!(result.expose_secret(), "direct_value");
        std::env::remove_var("PARTSDESK_TEST_TOKEN_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "file_value").unwrap();

        std::env::set_var("PARTSDESK_TEST_TOKEN_2", "env_value");
        let result = resolve_secret(
            None,
            Some(temp_file.path().to_str().unwrap()),
            Some("PARTSDESK_TEST_TOKEN_2"),
        )
        .unwrap();
        assert_eq!(result.expose_secret(), "file_value");
        std::env::remove_var("PARTSDESK_TEST_TOKEN_2");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback_is_trimmed() {
        std::env::set_var("PARTSDESK_TEST_TOKEN_3", "env_value\n");
        let result = resolve_secret(Some(""), Some(""), Some("PARTSDESK_TEST_TOKEN_3")).unwrap();
        assert_eq!(result.expose_secret(), "env_value");
        std::env::remove_var("PARTSDESK_TEST_TOKEN_3");
    }

    #[test]
    #[serial]
    fn test_unset_env_var_error() {
        std::env::remove_var("PARTSDESK_TEST_TOKEN_4");
        let result = resolve_secret(None, None, Some("PARTSDESK_TEST_TOKEN_4"));
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
    }

    #[test]
    fn test_no_source() {
        assert!(matches!(
            resolve_secret(None, None, None),
            Err(SecretError::NoSourceProvided)
        ));
        assert!(resolve_secret_optional(None, Some(""), None).unwrap().is_none());
    }

    #[test]
    fn test_file_errors() {
        let result = resolve_secret(None, Some("/nonexistent/partsdesk/token"), None);
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));

        let temp_file = NamedTempFile::new().unwrap();
        let result = resolve_secret(None, Some(temp_file.path().to_str().unwrap()), None);
        assert!(matches!(result, Err(SecretError::EmptyFile { .. })));
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/etc/token"), "/etc/token");
        assert_eq!(expand_home("~alice/token"), "~alice/token");
    }
}
