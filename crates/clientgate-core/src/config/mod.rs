//! Configuration loading and validation.
//!
//! Config location: `~/.clientgate/clientgate.json` (JSON5 accepted).

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default access token lifetime in minutes.
const DEFAULT_TOKEN_EXPIRY_MINUTES: u64 = 30;
/// Longest accepted access token lifetime: one year.
pub const MAX_TOKEN_EXPIRY_MINUTES: u64 = 366 * 24 * 60;
/// Minimum JWT secret length in bytes.
const MIN_SECRET_BYTES: usize = 32;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON5 parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] json5::Error),

    /// Config validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Token and login settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Client store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns error if an existing config cannot be read or parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to a path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("clientgate.json")
    }

    /// Get the clientgate state directory.
    ///
    /// Uses `CLIENTGATE_STATE_DIR` env var if set, otherwise `~/.clientgate`.
    #[must_use]
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CLIENTGATE_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Some(home) = dirs::home_dir() {
            home.join(".clientgate")
        } else {
            PathBuf::from(".clientgate")
        }
    }

    /// Apply environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var("CLIENTGATE_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }

        if let Ok(minutes) = std::env::var("CLIENTGATE_TOKEN_EXPIRY_MINUTES") {
            match minutes.parse() {
                Ok(minutes) => self.auth.token_expiry_minutes = minutes,
                Err(_) => tracing::warn!(
                    value = %minutes,
                    "Ignoring invalid CLIENTGATE_TOKEN_EXPIRY_MINUTES"
                ),
            }
        }

        if let Ok(dir) = std::env::var("CLIENTGATE_DATA_DIR") {
            self.store.data_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_expiry_minutes == 0 {
            return Err(ConfigError::Validation(
                "Token expiry cannot be 0".to_string(),
            ));
        }

        if self.auth.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
            return Err(ConfigError::Validation(format!(
                "Token expiry must be at most {MAX_TOKEN_EXPIRY_MINUTES} minutes, got {}",
                self.auth.token_expiry_minutes
            )));
        }

        validate_token_url(&self.auth.token_url)?;

        if let Some(secret) = &self.auth.jwt_secret {
            let bytes = hex::decode(secret)
                .map_err(|e| ConfigError::Validation(format!("JWT secret is not hex: {e}")))?;
            if bytes.len() < MIN_SECRET_BYTES {
                return Err(ConfigError::Validation(format!(
                    "JWT secret must be at least {MIN_SECRET_BYTES} bytes, got {}",
                    bytes.len()
                )));
            }
        }

        Ok(())
    }
}

/// Login paths are plain segments of `[A-Za-z0-9._-]` joined by `/`.
fn validate_token_url(token_url: &str) -> Result<(), ConfigError> {
    let path = token_url.trim_start_matches('/');
    if path.is_empty() {
        return Err(ConfigError::Validation(
            "Token URL cannot be empty".to_string(),
        ));
    }

    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    };

    if !path.split('/').all(valid_segment) {
        return Err(ConfigError::Validation(format!(
            "Token URL is not a plain path: {token_url}"
        )));
    }

    Ok(())
}

/// Token and login configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// JWT signing secret (hex-encoded). Generated at startup if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,

    /// Clock skew tolerated when checking `exp`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,

    /// Report unknown-email and wrong-password logins with the same response.
    #[serde(default = "default_true")]
    pub mask_login_failures: bool,

    /// Path the password login endpoint is mounted at.
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

const fn default_token_expiry() -> u64 {
    DEFAULT_TOKEN_EXPIRY_MINUTES
}

const fn default_true() -> bool {
    true
}

fn default_token_url() -> String {
    "api/clients/login".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_minutes: default_token_expiry(),
            leeway_secs: 0,
            mask_login_failures: default_true(),
            token_url: default_token_url(),
        }
    }
}

impl AuthConfig {
    /// Access token lifetime.
    #[must_use]
    pub const fn token_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.token_expiry_minutes.saturating_mul(60))
    }

    /// Absolute route of the login endpoint, e.g. `/api/clients/login`.
    #[must_use]
    pub fn login_path(&self) -> String {
        format!("/{}", self.token_url.trim_start_matches('/'))
    }

    /// The configured secret, wrapped so it stays out of logs.
    #[must_use]
    pub fn secret(&self) -> Option<SecretString> {
        self.jwt_secret.clone().map(SecretString::from)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_expiry_minutes", &self.token_expiry_minutes)
            .field("leeway_secs", &self.leeway_secs)
            .field("mask_login_failures", &self.mask_login_failures)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Client store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory holding the client database. Defaults to `<state dir>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| Config::state_dir().join("data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SECRET: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.token_expiry_minutes, 30);
        assert_eq!(config.auth.leeway_secs, 0);
        assert!(config.auth.mask_login_failures);
        assert_eq!(config.auth.token_url, "api/clients/login");
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("clientgate.json");

        let mut config = Config::default();
        config.auth.jwt_secret = Some(SECRET.to_string());
        config.auth.token_expiry_minutes = 90;
        config.store.data_dir = Some(temp.path().join("data"));

        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.auth.jwt_secret.as_deref(), Some(SECRET));
        assert_eq!(loaded.auth.token_expiry_minutes, 90);
        assert_eq!(loaded.store.data_dir(), temp.path().join("data"));
    }

    #[test]
    fn test_json5_partial_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("clientgate.json");
        std::fs::write(
            &path,
            "{\n  // trailing commas and comments are fine\n  auth: { leewaySecs: 5, maskLoginFailures: false, },\n}\n",
        )
        .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.auth.leeway_secs, 5);
        assert!(!loaded.auth.mask_login_failures);
        assert_eq!(loaded.auth.token_expiry_minutes, 30);
    }

    #[test]
    fn test_rejects_zero_expiry() {
        let mut config = Config::default();
        config.auth.token_expiry_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("not-hex".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.auth.jwt_secret = Some("abcd".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_expiry_duration() {
        let config = AuthConfig::default();
        assert_eq!(config.token_expiry(), std::time::Duration::from_secs(30 * 60));

        let config = AuthConfig {
            token_expiry_minutes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.token_expiry(), std::time::Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_rejects_huge_expiry() {
        let mut config = Config::default();
        config.auth.token_expiry_minutes = MAX_TOKEN_EXPIRY_MINUTES;
        assert!(config.validate().is_ok());

        for minutes in [MAX_TOKEN_EXPIRY_MINUTES + 1, 1_000_000_000_000, u64::MAX] {
            config.auth.token_expiry_minutes = minutes;
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "{minutes} minutes should be rejected"
            );
        }
    }

    #[test]
    fn test_token_url() {
        let mut config = Config::default();
        assert_eq!(config.auth.login_path(), "/api/clients/login");

        config.auth.token_url = "/oauth/token".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.login_path(), "/oauth/token");

        for bad in ["", "/", "api//login", "api/{id}", "api/:id", "api/*rest", "a b"] {
            config.auth.token_url = bad.to_string();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
