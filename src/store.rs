use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Key under which the login flow stores the credential.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

// 1. CredentialStore Contract
/// CredentialStore
///
/// A process-wide key-value store for credentials. Only read, write and delete are
/// needed: the login flow writes, every navigation reads, and the navigator deletes
/// on logout or when the gate rejects the credential.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Removes the entry, returning the previous value if there was one.
    fn remove(&self, key: &str) -> Option<String>;
}

// 2. In-Memory Implementation
/// MemoryCredentialStore
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token` under `ACCESS_TOKEN_KEY`.
    pub fn with_access_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(ACCESS_TOKEN_KEY, token.into());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

/// StoreState
///
/// The shared handle type used by the navigator.
pub type StoreState = Arc<dyn CredentialStore>;
