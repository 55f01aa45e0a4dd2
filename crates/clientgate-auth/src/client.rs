//! Client model.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A registered API client: the principal both login and token resolution
/// produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client ID. Tokens carry it as their subject.
    pub id: String,
    /// Login email, stored normalized.
    pub email: String,
    /// Argon2 PHC hash (stored in DB, not exposed in public API).
    pub password_hash: String,
    /// When the client was created.
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Create a client with a fresh ID around an already-computed hash.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: format!("client_{}", uuid_v4()),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a safe version of the client for API responses (no hash).
    #[must_use]
    pub fn to_public(&self) -> PublicClient {
        PublicClient {
            id: self.id.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public client representation (for API responses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicClient {
    /// Unique client ID.
    pub id: String,
    /// Login email.
    pub email: String,
    /// When created.
    pub created_at: DateTime<Utc>,
}

/// Generate a random UUID v4 string.
fn uuid_v4() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);

    // Set version (4) and variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::new("a@b.com", "$argon2id$stub");
        assert!(client.id.starts_with("client_"));
        assert_eq!(client.email, "a@b.com");
        assert_ne!(client.id, Client::new("a@b.com", "h").id);
    }

    #[test]
    fn test_uuid_shape() {
        let id = uuid_v4();
        assert_eq!(id.len(), 36);
        assert_eq!(id.as_bytes()[14], b'4');
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn test_public_view_drops_hash() {
        let client = Client::new("a@b.com", "$argon2id$secret-hash");
        let public = client.to_public();
        assert_eq!(public.id, client.id);

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
