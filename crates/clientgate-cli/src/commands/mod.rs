//! CLI command implementations.

pub mod check;
pub mod client;
pub mod init;

pub use check::{run_resolve, run_token, run_verify};
pub use client::run_client;
pub use init::run_init;

use std::path::Path;

use clientgate_auth::AuthState;
use clientgate_core::Config;

/// Load the config at `path`, or defaults when it does not exist yet, with
/// environment overrides applied.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = if path.exists() {
        Config::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Config::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Open the client store and token codec described by the config.
fn open_state(config: &Config) -> anyhow::Result<AuthState> {
    AuthState::initialize(config).map_err(|e| anyhow::anyhow!("Failed to open auth state: {}", e))
}

/// Tokens minted or checked from the CLI are only meaningful against a
/// persistent secret.
fn require_secret(config: &Config) -> anyhow::Result<()> {
    if config.auth.jwt_secret.is_none() {
        anyhow::bail!(
            "No JWT secret configured. Run 'clientgate init' or set CLIENTGATE_JWT_SECRET."
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("clientgate.json")).unwrap();
        assert_eq!(config.auth.token_expiry_minutes, 30);
    }

    #[test]
    fn test_load_config_rejects_bad_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("clientgate.json");
        std::fs::write(&path, "{ auth: { tokenExpiryMinutes: 0 } }").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_require_secret() {
        let mut config = Config::default();
        assert!(require_secret(&config).is_err());

        config.auth.jwt_secret = Some("ab".repeat(32));
        assert!(require_secret(&config).is_ok());
    }
}
