//! Client management commands.

use std::path::Path;

use clientgate_auth::{Authenticator, Credentials};
use clientgate_core::{check_password, normalize_email};

use super::{load_config, open_state};
use crate::ui;

/// Client actions.
pub enum ClientAction {
    /// Register a new client.
    Add {
        email: String,
        password: Option<String>,
    },
    /// List all clients.
    List,
    /// Delete a client.
    Remove { id: String, yes: bool },
}

/// Run a client management action.
///
/// # Errors
///
/// Returns error if the store cannot be opened or the action fails.
pub async fn run_client(config_path: &Path, action: ClientAction) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let state = open_state(&config)?;
    let auth = &state.authenticator;

    match action {
        ClientAction::Add { email, password } => add_client(auth, &email, password).await,
        ClientAction::List => list_clients(auth).await,
        ClientAction::Remove { id, yes } => remove_client(auth, &id, yes).await,
    }
}

async fn add_client(
    auth: &Authenticator,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let email = normalize_email(email)?;

    let password = match password {
        Some(password) => password,
        None => ui::prompts::new_password("Password")?,
    };
    check_password(&password)?;

    let client = auth
        .register(&Credentials { email, password })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    ui::success(&format!("Created client '{}'", client.email));
    ui::kv("ID", &client.id);

    Ok(())
}

async fn list_clients(auth: &Authenticator) -> anyhow::Result<()> {
    let mut clients = auth
        .store()
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list clients: {}", e))?;

    if clients.is_empty() {
        ui::info("No clients registered.");
        ui::info("Run 'clientgate client add <email>' to register one.");
        return Ok(());
    }

    clients.sort_by_key(|c| c.created_at);

    ui::info(&format!("Clients ({}):", clients.len()));
    println!();
    println!("{:<45} {:<32} {:<20}", "ID", "EMAIL", "CREATED");
    println!("{}", "-".repeat(97));

    for client in clients {
        let created = client.created_at.format("%Y-%m-%d %H:%M:%S");
        println!("{:<45} {:<32} {:<20}", client.id, client.email, created);
    }

    Ok(())
}

async fn remove_client(auth: &Authenticator, id: &str, yes: bool) -> anyhow::Result<()> {
    let client = auth
        .store()
        .find_by_id(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find client: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", id))?;

    if !yes && !ui::prompts::confirm(&format!("Delete client '{}'?", client.email))? {
        ui::info("Cancelled.");
        return Ok(());
    }

    auth.store()
        .delete(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete client: {}", e))?;

    ui::success(&format!("Deleted client '{}'", client.email));

    Ok(())
}
