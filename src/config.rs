//! Runtime configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `WEIGHTWISE_BUNDLE_DIR` | `models` |
//! | `WEIGHTWISE_ALLOW_UNSIGNED_BUNDLES` | `false` |
//! | `WEIGHTWISE_BUNDLE_PUBKEY_B64` | unset |
//! | `WEIGHTWISE_LOG_MODE` | `stderr` (or `file`) |
//! | `WEIGHTWISE_LOG_FILE` | `weightwise.log` |
//! | `WEIGHTWISE_SANITIZE_MAX_BYTES` | 16 KiB |

use std::path::PathBuf;

use crate::adapters::bundle::{verifying_key_from_b64, ArtifactError, LoadOptions};

pub const BUNDLE_DIR_ENV: &str = "WEIGHTWISE_BUNDLE_DIR";
pub const ALLOW_UNSIGNED_ENV: &str = "WEIGHTWISE_ALLOW_UNSIGNED_BUNDLES";
pub const PUBKEY_ENV: &str = "WEIGHTWISE_BUNDLE_PUBKEY_B64";
pub const LOG_MODE_ENV: &str = "WEIGHTWISE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "WEIGHTWISE_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "WEIGHTWISE_SANITIZE_MAX_BYTES";

const DEFAULT_BUNDLE_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "weightwise.log";
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// Where formatted logs go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim() {
            "file" => Self::File,
            "stderr" => Self::Stderr,
            other => {
                tracing::warn!("Unknown {LOG_MODE_ENV}={other:?}, logging to stderr");
                Self::Stderr
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bundle_dir: PathBuf,
    pub allow_unsigned: bool,
    /// Base64 Ed25519 verifying key for signed bundles
    pub bundle_pubkey_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Per-line cap for the log sanitizer
    pub sanitize_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from(DEFAULT_BUNDLE_DIR),
            allow_unsigned: false,
            bundle_pubkey_b64: None,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bundle_dir: lookup(BUNDLE_DIR_ENV)
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.bundle_dir, PathBuf::from),
            allow_unsigned: lookup(ALLOW_UNSIGNED_ENV).is_some_and(|v| parse_bool(&v)),
            bundle_pubkey_b64: lookup(PUBKEY_ENV).filter(|v| !v.trim().is_empty()),
            log_mode: lookup(LOG_MODE_ENV).map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: lookup(LOG_FILE_ENV)
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.log_file, PathBuf::from),
            sanitize_max_bytes: lookup(SANITIZE_MAX_BYTES_ENV)
                .as_deref()
                .and_then(parse_max_bytes)
                .unwrap_or(defaults.sanitize_max_bytes),
        }
    }

    /// Bundle load options derived from this config.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` if the configured key is malformed.
    pub fn load_options(&self) -> Result<LoadOptions, ArtifactError> {
        let verifying_key = self
            .bundle_pubkey_b64
            .as_deref()
            .map(verifying_key_from_b64)
            .transpose()?;
        Ok(LoadOptions {
            allow_unsigned: self.allow_unsigned,
            verifying_key,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

fn parse_max_bytes(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            (BUNDLE_DIR_ENV, "/srv/bundle"),
            (ALLOW_UNSIGNED_ENV, "yes"),
            (LOG_MODE_ENV, "file"),
            (LOG_FILE_ENV, "/var/log/ww.log"),
            (SANITIZE_MAX_BYTES_ENV, "4096"),
        ]);
        assert_eq!(config.bundle_dir, PathBuf::from("/srv/bundle"));
        assert!(config.allow_unsigned);
        assert_eq!(config.log_mode, LogMode::File);
        assert_eq!(config.log_file, PathBuf::from("/var/log/ww.log"));
        assert_eq!(config.sanitize_max_bytes, 4096);
    }

    #[test]
    fn test_bool_and_size_parsing() {
        for value in ["1", "true", "TRUE", "yes", "YES"] {
            assert!(config_from(&[(ALLOW_UNSIGNED_ENV, value)]).allow_unsigned);
        }
        for value in ["0", "false", "True", "on", ""] {
            assert!(!config_from(&[(ALLOW_UNSIGNED_ENV, value)]).allow_unsigned);
        }
        assert_eq!(
            config_from(&[(SANITIZE_MAX_BYTES_ENV, "0")]).sanitize_max_bytes,
            DEFAULT_SANITIZE_MAX_BYTES
        );
        assert_eq!(config_from(&[(LOG_MODE_ENV, "syslog")]).log_mode, LogMode::Stderr);
    }

    #[test]
    fn test_load_options_decode_key() {
        let config = config_from(&[(PUBKEY_ENV, "not base64!")]);
        assert!(config.load_options().is_err());

        let key = ed25519_dalek::SigningKey::from_bytes(&[5u8; 32]).verifying_key();
        let b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            key.as_bytes(),
        );
        let config = config_from(&[(PUBKEY_ENV, b64.as_str())]);
        let options = config.load_options().expect("valid key");
        assert_eq!(options.verifying_key, Some(key));
        assert!(!options.allow_unsigned);
    }
}
