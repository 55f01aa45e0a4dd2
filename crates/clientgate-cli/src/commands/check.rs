//! Credential and token checks against the configured store.

use std::path::Path;

use clientgate_auth::Client;
use clientgate_core::normalize_email;

use super::{load_config, open_state, require_secret};
use crate::ui;

/// Check an email/password pair.
///
/// # Errors
///
/// Returns error if the credentials are rejected.
pub async fn run_verify(
    config_path: &Path,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let state = open_state(&config)?;

    let email = normalize_email(email)?;
    let password = match password {
        Some(password) => password,
        None => ui::prompts::password("Password")?,
    };

    let client = state
        .authenticator
        .verify(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Verification failed: {}", e))?;

    ui::success("Credentials accepted");
    print_client(&client);

    Ok(())
}

/// Resolve a bearer token to its client.
///
/// # Errors
///
/// Returns error if no secret is configured or the token is rejected.
pub async fn run_resolve(config_path: &Path, token: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    require_secret(&config)?;
    let state = open_state(&config)?;

    let client = state
        .authenticator
        .resolve(token.trim())
        .await
        .map_err(|e| anyhow::anyhow!("Token rejected: {}", e))?;

    ui::success("Token accepted");
    print_client(&client);

    Ok(())
}

/// Mint an access token for an existing client.
///
/// # Errors
///
/// Returns error if no secret is configured or the client does not exist.
pub async fn run_token(config_path: &Path, client_id: &str, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    require_secret(&config)?;
    let state = open_state(&config)?;
    let auth = &state.authenticator;

    let client = auth
        .store()
        .find_by_id(client_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", client_id))?;

    let issued = auth.codec().encode(&client.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issued)?);
        return Ok(());
    }

    ui::success(&format!("Issued token for '{}'", client.email));
    ui::kv("Expires", &issued.expires_at.to_rfc3339());
    println!("{}", issued.access_token);

    Ok(())
}

fn print_client(client: &Client) {
    ui::kv("ID", &client.id);
    ui::kv("Email", &client.email);
    ui::kv("Created", &client.created_at.to_rfc3339());
}
