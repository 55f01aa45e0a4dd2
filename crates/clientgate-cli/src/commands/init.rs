//! Config bootstrap.

use std::path::Path;

use clientgate_auth::JwtCodec;
use clientgate_core::Config;

use crate::ui;

/// Write a fresh config with a generated JWT secret.
///
/// # Errors
///
/// Returns error if the config exists and `force` is not set, or the write
/// fails.
pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let mut config = Config::default();
    config.auth.jwt_secret = Some(JwtCodec::generate_hex_secret());
    config.save(path)?;

    ui::success(&format!("Wrote config to {}", path.display()));
    ui::kv("Data directory", &config.store.data_dir().display().to_string());
    ui::kv(
        "Token expiry",
        &format!("{} minutes", config.auth.token_expiry_minutes),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_secret() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("clientgate.json");

        run_init(&path, false).unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.auth.jwt_secret.is_some());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("clientgate.json");

        run_init(&path, false).unwrap();
        let first = Config::load(&path).unwrap().auth.jwt_secret;

        assert!(run_init(&path, false).is_err());

        run_init(&path, true).unwrap();
        let second = Config::load(&path).unwrap().auth.jwt_secret;
        assert_ne!(first, second);
    }
}
