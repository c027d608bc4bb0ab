/// Startup configuration
///
/// Built once in `main` from the process environment (after `.env` has been
/// loaded) and handed to the orchestrator. A missing credential is reported
/// here, before the window opens.
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReplaceError, Result};

pub const CLOUD_NAME_VAR: &str = "CLOUD_NAME";
pub const API_KEY_VAR: &str = "API_KEY";
pub const API_SECRET_VAR: &str = "API_SECRET";
pub const TIMEOUT_VAR: &str = "REQUEST_TIMEOUT_SECS";
pub const TEMP_DIR_VAR: &str = "GEN_REPLACE_TEMP_DIR";
pub const PURGE_REMOTE_VAR: &str = "GEN_REPLACE_PURGE_REMOTE";

/// Timeout applied to every outbound HTTP call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudinary account credentials
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

// Keep the secret out of logs
impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: CloudCredentials,
    pub request_timeout: Duration,
    /// Directory that holds the per-interaction temp files
    pub temp_dir: PathBuf,
    /// Destroy the remote asset once the transformed image has been fetched
    pub purge_remote: bool,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            match lookup(name).map(|v| v.trim().to_string()) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(ReplaceError::Config(format!(
                    "environment variable {} is not set",
                    name
                ))),
            }
        };

        let credentials = CloudCredentials {
            cloud_name: required(CLOUD_NAME_VAR)?,
            api_key: required(API_KEY_VAR)?,
            api_secret: required(API_SECRET_VAR)?,
        };

        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ReplaceError::Config(format!("{} must be a whole number of seconds, got {:?}", TIMEOUT_VAR, raw))
                })?;
                if secs == 0 {
                    return Err(ReplaceError::Config(format!("{} must be greater than zero", TIMEOUT_VAR)));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let temp_dir = lookup(TEMP_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_temp_dir);

        let purge_remote = match lookup(PURGE_REMOTE_VAR) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ReplaceError::Config(format!("{} must be true or false, got {:?}", PURGE_REMOTE_VAR, raw))
            })?,
            None => false,
        };

        Ok(Config {
            credentials,
            request_timeout,
            temp_dir,
            purge_remote,
        })
    }
}

/// Default temp directory
/// Returns ~/.cache/gen-replace/uploads on Linux
fn default_temp_dir() -> PathBuf {
    let mut path = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    path.push("gen-replace");
    path.push("uploads");
    path
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn credentials() -> HashMap<String, String> {
        env(&[
            (CLOUD_NAME_VAR, "demo"),
            (API_KEY_VAR, "123456"),
            (API_SECRET_VAR, "s3cr3t"),
        ])
    }

    #[test]
    fn test_defaults() {
        let vars = credentials();
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.credentials.cloud_name, "demo");
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
        assert!(!config.purge_remote);
        assert!(config.temp_dir.ends_with("gen-replace/uploads"));
    }

    #[test]
    fn test_missing_variable_is_named() {
        let mut vars = credentials();
        vars.remove(API_SECRET_VAR);

        let err = Config::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        match err {
            ReplaceError::Config(msg) => assert!(msg.contains(API_SECRET_VAR)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let mut vars = credentials();
        vars.insert(CLOUD_NAME_VAR.to_string(), "   ".to_string());

        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut vars = credentials();
        vars.insert(TIMEOUT_VAR.to_string(), "5".to_string());
        vars.insert(TEMP_DIR_VAR.to_string(), "/tmp/replace-test".to_string());
        vars.insert(PURGE_REMOTE_VAR.to_string(), "yes".to_string());

        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/replace-test"));
        assert!(config.purge_remote);
    }

    #[test]
    fn test_bad_timeout() {
        let mut vars = credentials();
        vars.insert(TIMEOUT_VAR.to_string(), "0".to_string());
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());

        vars.insert(TIMEOUT_VAR.to_string(), "soon".to_string());
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let vars = credentials();
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("<redacted>"));
    }
}
