//! Session persistence and the authentication guard.
//!
//! The session is the client-held credential set (token, API key, cached
//! profile) representing a logged-in user. Storage is an explicit interface
//! injected into everything that needs session data, rather than read ad hoc
//! from a global store.

use anyhow::Result;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ApiError;

pub const KEY_TOKEN: &str = "token";
pub const KEY_PROFILE: &str = "profile";
pub const KEY_API_KEY: &str = "apiKey";

/// Persistent string key/value storage for session artifacts.
///
/// Values are stored as plain strings; structured values (the cached profile)
/// are stored as their JSON text. Last writer wins; there is no locking, and
/// two independent processes sharing the same store can race.
pub trait SessionStore {
    /// Load the value stored under `key`. Absent keys and storage failures
    /// both read as `None`; load failures are swallowed, not surfaced.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, overwriting any prior value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the entry under `key`. No-op when absent.
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete every entry.
    fn clear(&self) -> Result<()>;

    /// The stored session token, if any.
    fn token(&self) -> Option<String> {
        self.get(KEY_TOKEN)
    }

    /// The stored API key, if any.
    fn api_key(&self) -> Option<String> {
        self.get(KEY_API_KEY)
    }

    /// The cached login response, parsed. Unparseable text reads as absent.
    fn profile(&self) -> Option<Value> {
        self.get(KEY_PROFILE)
            .and_then(|text| serde_json::from_str(&text).ok())
    }

    /// The current user's name from the cached profile (`data.name`).
    fn profile_name(&self) -> Option<String> {
        self.profile()
            .and_then(|p| p["data"]["name"].as_str().map(|s| s.to_string()))
    }
}

/// True iff a token is present in the store.
///
/// Pure predicate, no network call: it can return true for a token the
/// server has since invalidated.
pub fn is_authenticated(store: &dyn SessionStore) -> bool {
    store.token().is_some_and(|t| !t.is_empty())
}

/// Fail with `MissingSession` unless a token is stored.
///
/// Callers propagate the error with `?`, so unlike a redirect-style guard
/// this one actually halts the calling flow.
pub fn require_authentication(store: &dyn SessionStore) -> Result<()> {
    if is_authenticated(store) {
        Ok(())
    } else {
        Err(ApiError::MissingSession.into())
    }
}

/// File-backed store: a single JSON object at `<state-dir>/session.json`.
///
/// Every read goes back to the file, so concurrent writers within one
/// process see each other's updates.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        Ok(Self {
            path: state_dir.join("session.json"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for unit tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.get(KEY_TOKEN), None);
        store.set(KEY_TOKEN, "abc123").unwrap();
        assert_eq!(store.get(KEY_TOKEN), Some("abc123".to_string()));

        // Overwrite wins
        store.set(KEY_TOKEN, "def456").unwrap();
        assert_eq!(store.token(), Some("def456".to_string()));

        store.remove(KEY_TOKEN).unwrap();
        assert_eq!(store.token(), None);
        // Removing again is a no-op
        store.remove(KEY_TOKEN).unwrap();
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set(KEY_API_KEY, "key-1").unwrap();
        }
        let store = FileStore::new(dir.path()).unwrap();
        assert_eq!(store.api_key(), Some("key-1".to_string()));
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        std::fs::write(store.path(), "not json {{{").unwrap();
        assert_eq!(store.get(KEY_TOKEN), None);
        // A write recovers the store
        store.set(KEY_TOKEN, "tok").unwrap();
        assert_eq!(store.token(), Some("tok".to_string()));
    }

    #[test]
    fn test_profile_name() {
        let store = MemoryStore::new();
        assert_eq!(store.profile_name(), None);

        store
            .set(KEY_PROFILE, r#"{ "data": { "name": "ada", "credits": 1000 } }"#)
            .unwrap();
        assert_eq!(store.profile_name(), Some("ada".to_string()));

        store.set(KEY_PROFILE, "garbled").unwrap();
        assert_eq!(store.profile_name(), None);
    }

    #[test]
    fn test_authentication_guard() {
        let store = MemoryStore::new();
        assert!(!is_authenticated(&store));
        let err = require_authentication(&store).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::ApiError>(),
            Some(ApiError::MissingSession)
        ));

        store.set(KEY_TOKEN, "tok").unwrap();
        assert!(is_authenticated(&store));
        assert!(require_authentication(&store).is_ok());

        // An empty token does not count as logged in
        store.set(KEY_TOKEN, "").unwrap();
        assert!(!is_authenticated(&store));
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set(KEY_TOKEN, "t").unwrap();
        store.set(KEY_PROFILE, "{}").unwrap();
        store.set(KEY_API_KEY, "k").unwrap();
        store.clear().unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.api_key(), None);
        assert_eq!(store.get(KEY_PROFILE), None);
    }
}
