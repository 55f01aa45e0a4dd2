//! Client storage.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use tokio::sync::RwLock;

use crate::AuthError;
use crate::client::Client;

/// Client lookup and administration.
///
/// Lookups return `Ok(None)` for an unknown key; `Err` is reserved for the
/// store itself failing.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Find a client by login email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, AuthError>;

    /// Find a client by ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, AuthError>;

    /// Insert a new client. Fails with `ClientExists` on a taken email.
    async fn create(&self, client: &Client) -> Result<(), AuthError>;

    /// Delete a client, returning whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, AuthError>;

    /// List all clients.
    async fn list(&self) -> Result<Vec<Client>, AuthError>;

    /// Count clients.
    async fn count(&self) -> Result<usize, AuthError> {
        Ok(self.list().await?.len())
    }
}

const INDEX_PREFIX: &[u8] = b"idx:";

fn email_index_key(email: &str) -> String {
    format!("idx:email:{email}")
}

/// Client store backed by sled.
pub struct SledClientStore {
    tree: sled::Tree,
}

impl SledClientStore {
    /// Open or create a client store at the given directory.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, AuthError> {
        let db = sled::open(path.join("clients"))
            .map_err(|e| AuthError::Storage(format!("Failed to open client database: {e}")))?;

        Self::with_db(&db)
    }

    /// Create a client store on an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if tree cannot be opened.
    pub fn with_db(db: &sled::Db) -> Result<Self, AuthError> {
        let tree = db
            .open_tree("clients")
            .map_err(|e| AuthError::Storage(format!("Failed to open clients tree: {e}")))?;

        Ok(Self { tree })
    }

    fn get(&self, id: &[u8]) -> Result<Option<Client>, AuthError> {
        match self.tree.get(id) {
            Ok(Some(value)) => {
                let client: Client = serde_json::from_slice(&value)
                    .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}")))?;
                Ok(Some(client))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Get error: {e}"))),
        }
    }

    fn flush(&self) -> Result<(), AuthError> {
        self.tree
            .flush()
            .map(|_| ())
            .map_err(|e| AuthError::Storage(format!("Flush error: {e}")))
    }
}

#[async_trait]
impl ClientStore for SledClientStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, AuthError> {
        match self.tree.get(email_index_key(email).as_bytes()) {
            Ok(Some(id)) => self.get(&id),
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Storage(format!("Index lookup error: {e}"))),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, AuthError> {
        // Index entries share the keyspace and must not resolve as clients
        if id.as_bytes().starts_with(INDEX_PREFIX) {
            return Ok(None);
        }
        self.get(id.as_bytes())
    }

    async fn create(&self, client: &Client) -> Result<(), AuthError> {
        let value = serde_json::to_vec(client)
            .map_err(|e| AuthError::Storage(format!("Serialization error: {e}")))?;

        // Index entry and record commit together or not at all
        let index_key = email_index_key(&client.email);
        let result = self.tree.transaction(|tx| {
            if tx.get(index_key.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(()));
            }
            tx.insert(index_key.as_bytes(), client.id.as_bytes())?;
            tx.insert(client.id.as_bytes(), value.as_slice())?;
            Ok(())
        });

        match result {
            Ok(()) => self.flush(),
            Err(TransactionError::Abort(())) => {
                Err(AuthError::ClientExists(client.email.clone()))
            }
            Err(TransactionError::Storage(e)) => {
                Err(AuthError::Storage(format!("Insert error: {e}")))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AuthError> {
        let Some(client) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let index_key = email_index_key(&client.email);
        let removed = self
            .tree
            .transaction(|tx| {
                tx.remove(index_key.as_bytes())?;
                Ok::<_, ConflictableTransactionError<()>>(tx.remove(id.as_bytes())?.is_some())
            })
            .map_err(|e| AuthError::Storage(format!("Delete error: {e:?}")))?;

        self.flush()?;

        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<Client>, AuthError> {
        let mut clients = Vec::new();

        for result in self.tree.iter() {
            let (key, value) = result.map_err(|e| AuthError::Storage(format!("Iter error: {e}")))?;

            if key.starts_with(INDEX_PREFIX) {
                continue;
            }

            let client: Client = serde_json::from_slice(&value)
                .map_err(|e| AuthError::Storage(format!("Deserialization error: {e}")))?;
            clients.push(client);
        }

        Ok(clients)
    }
}

impl std::fmt::Debug for SledClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledClientStore").finish_non_exhaustive()
    }
}

/// In-memory client store.
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    clients: RwLock<HashMap<String, Client>>,
}

impl MemoryClientStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, AuthError> {
        let clients = self.clients.read().await;
        Ok(clients.values().find(|c| c.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, AuthError> {
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn create(&self, client: &Client) -> Result<(), AuthError> {
        let mut clients = self.clients.write().await;
        if clients.values().any(|c| c.email == client.email) {
            return Err(AuthError::ClientExists(client.email.clone()));
        }
        clients.insert(client.id.clone(), client.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AuthError> {
        Ok(self.clients.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<Client>, AuthError> {
        Ok(self.clients.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    async fn exercise(store: &dyn ClientStore) {
        assert_eq!(store.count().await.unwrap(), 0);

        let client = Client::new("a@b.com", "hash");
        store.create(&client).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let by_id = store.find_by_id(&client.id).await.unwrap().unwrap();
        assert_eq!(by_id, client);

        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, client.id);

        assert!(store.find_by_email("x@y.com").await.unwrap().is_none());
        assert!(store.find_by_id("client_missing").await.unwrap().is_none());

        let dup = Client::new("a@b.com", "other");
        assert!(matches!(
            store.create(&dup).await,
            Err(AuthError::ClientExists(_))
        ));

        assert!(store.delete(&client.id).await.unwrap());
        assert!(!store.delete(&client.id).await.unwrap());
        assert!(store.find_by_email("a@b.com").await.unwrap().is_none());

        // Email is free again after delete
        store.create(&dup).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sled_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledClientStore::open(temp_dir.path()).unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryClientStore::new()).await;
    }

    #[tokio::test]
    async fn test_sled_rejected_create_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledClientStore::open(temp_dir.path()).unwrap();
        let first = Client::new("a@b.com", "hash");
        store.create(&first).await.unwrap();

        let dup = Client::new("a@b.com", "other");
        assert!(store.create(&dup).await.is_err());

        assert!(store.find_by_id(&dup.id).await.unwrap().is_none());
        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, first.id);
        assert_eq!(store.list().await.unwrap(), vec![first]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sled_concurrent_registrations() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SledClientStore::open(temp_dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create(&Client::new("a@b.com", format!("hash{i}"))).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => created += 1,
                Err(AuthError::ClientExists(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        let clients = store.list().await.unwrap();
        assert_eq!(clients.len(), 1);

        // Every email index entry points at a stored record
        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email, clients[0]);
    }

    #[tokio::test]
    async fn test_index_keys_are_not_clients() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledClientStore::open(temp_dir.path()).unwrap();
        store.create(&Client::new("a@b.com", "hash")).await.unwrap();

        assert!(store.find_by_id("idx:email:a@b.com").await.unwrap().is_none());
    }
}
