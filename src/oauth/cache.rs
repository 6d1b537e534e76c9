use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::PurinaError;
use crate::oauth::token::Credential;

const CACHE_KEY_SUFFIX: &str = "_access_token";

/// Derive the cache key from a client ID: the part before the first `_`
/// plus a fixed suffix. Stable across processes for the same client ID.
pub fn cache_key(client_id: &str) -> String {
    let prefix = client_id.split('_').next().unwrap_or_default();
    format!("{prefix}{CACHE_KEY_SUFFIX}")
}

/// Durable home for one credential per cache key.
///
/// `load` never fails: anything that cannot be turned back into a credential
/// is reported as absent so the caller falls back to a fresh handshake.
pub trait TokenStore: Send + Sync {
    /// Check, up front, that `store` has a chance of succeeding.
    fn ensure_writable(&self) -> Result<(), PurinaError> {
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Credential>;

    /// Replace whatever is stored under `key`.
    fn store(&self, key: &str, credential: &Credential) -> Result<(), PurinaError>;
}

impl std::fmt::Debug for dyn TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish()
    }
}

fn decode(key: &str, contents: &str) -> Option<Credential> {
    if contents.trim().is_empty() {
        return None;
    }
    // Only the object form is a cache record; serde would also accept a
    // positional array for the derived struct.
    let record = match serde_json::from_str::<serde_json::Value>(contents) {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            tracing::debug!(key, "cached credential is not a JSON object, ignoring");
            return None;
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "cached credential is corrupt, ignoring");
            return None;
        }
    };
    match serde_json::from_value::<Credential>(record) {
        Ok(credential) if !credential.access_token.is_empty() => Some(credential),
        Ok(_) => {
            tracing::debug!(key, "cached credential has an empty token, ignoring");
            None
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "cached credential is corrupt, ignoring");
            None
        }
    }
}

/// One JSON file per key inside a cache directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl TokenStore for FileTokenStore {
    fn ensure_writable(&self) -> Result<(), PurinaError> {
        let not_writable = |detail: String| {
            PurinaError::Configuration(format!(
                "{} is not writable: {detail}",
                self.dir.display()
            ))
        };

        let meta = std::fs::metadata(&self.dir).map_err(|e| not_writable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(not_writable("not a directory".to_string()));
        }

        let probe = self
            .dir
            .join(format!(".write-probe-{}", std::process::id()));
        std::fs::write(&probe, b"").map_err(|e| not_writable(e.to_string()))?;
        if let Err(e) = std::fs::remove_file(&probe) {
            tracing::debug!(path = %probe.display(), error = %e, "failed to remove write probe");
        }
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Credential> {
        let path = self.path_for(key);
        let contents = std::fs::read_to_string(&path).ok()?;
        decode(key, &contents)
    }

    fn store(&self, key: &str, credential: &Credential) -> Result<(), PurinaError> {
        let path = self.path_for(key);
        let storage_error = |detail: String| PurinaError::Storage {
            location: path.display().to_string(),
            detail,
        };
        let data = serde_json::to_string(credential).map_err(|e| storage_error(e.to_string()))?;
        std::fs::write(&path, data).map_err(|e| storage_error(e.to_string()))
    }
}

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    stores: Arc<AtomicUsize>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw record text under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &str, contents: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), contents.into());
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Number of successful `store` calls.
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self, key: &str) -> Option<Credential> {
        let contents = self.raw(key)?;
        decode(key, &contents)
    }

    fn store(&self, key: &str, credential: &Credential) -> Result<(), PurinaError> {
        let storage_error = |detail: String| PurinaError::Storage {
            location: format!("memory:{key}"),
            detail,
        };
        let data = serde_json::to_string(credential).map_err(|e| storage_error(e.to_string()))?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| storage_error("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), data);
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn credential(token: &str, expires: i64) -> Credential {
        Credential::new(token, DateTime::from_timestamp(expires, 0).unwrap())
    }

    #[test]
    fn cache_key_uses_prefix_before_underscore() {
        assert_eq!(cache_key("acme_prod_12345"), "acme_access_token");
        assert_eq!(cache_key("acme"), "acme_access_token");
        assert_eq!(cache_key("_leading"), "_access_token");
    }

    #[test]
    fn cache_key_is_stable() {
        assert_eq!(cache_key("tenant_a"), cache_key("tenant_b"));
        assert_ne!(cache_key("one_x"), cache_key("two_x"));
    }

    #[test]
    fn path_for_appends_json_extension() {
        let store = FileTokenStore::new("/tmp/purina-cache");
        assert_eq!(
            store.path_for("acme_access_token"),
            PathBuf::from("/tmp/purina-cache/acme_access_token.json")
        );
    }

    #[test]
    fn file_store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        let cred = credential("tok-1", 1_900_000_000);

        store.store("acme_access_token", &cred).unwrap();
        let loaded = store.load("acme_access_token").unwrap();

        assert_eq!(loaded, cred);
    }

    #[test]
    fn file_store_writes_cache_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        store
            .store("acme_access_token", &credential("tok-1", 1_900_000_000))
            .unwrap();

        let raw = std::fs::read_to_string(store.path_for("acme_access_token")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["access_token"], "tok-1");
        assert_eq!(json["expires_in"], 1_900_000_000);
    }

    #[test]
    fn file_store_overwrites_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        store
            .store("k", &credential("a-much-longer-first-token", 1_900_000_000))
            .unwrap();
        store.store("k", &credential("short", 1_900_000_100)).unwrap();

        let loaded = store.load("k").unwrap();
        assert_eq!(loaded.access_token, "short");
        assert_eq!(loaded.expires_at.timestamp(), 1_900_000_100);
    }

    #[test]
    fn file_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        assert!(store.load("nobody_access_token").is_none());
    }

    #[test]
    fn file_load_corrupt_or_empty_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());

        std::fs::write(store.path_for("truncated"), r#"{"access_token":"ab"#).unwrap();
        std::fs::write(store.path_for("empty"), "").unwrap();
        std::fs::write(store.path_for("wrong_shape"), r#"["a", 1]"#).unwrap();
        std::fs::write(
            store.path_for("blank_token"),
            r#"{"access_token":"","expires_in":1900000000}"#,
        )
        .unwrap();

        assert!(store.load("truncated").is_none());
        assert!(store.load("empty").is_none());
        assert!(store.load("wrong_shape").is_none());
        assert!(store.load("blank_token").is_none());
    }

    #[test]
    fn file_store_into_missing_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("gone"));
        let err = store.store("k", &credential("t", 1)).unwrap_err();
        assert!(matches!(err, PurinaError::Storage { .. }));
    }

    #[test]
    fn ensure_writable_accepts_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.dir(), dir.path());
        store.ensure_writable().unwrap();
        // the probe file is cleaned up
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn ensure_writable_rejects_missing_dir() {
        let store = FileTokenStore::new("/some/local/directory");
        let err = store.ensure_writable().unwrap_err();
        assert!(matches!(err, PurinaError::Configuration(_)));
        assert!(err.to_string().contains("/some/local/directory"));
    }

    #[test]
    fn ensure_writable_rejects_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let err = FileTokenStore::new(&file).ensure_writable().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn memory_store_roundtrip_and_count() {
        let store = MemoryTokenStore::new();
        let shared = store.clone();
        let cred = credential("mem", 1_900_000_000);

        store.store("k", &cred).unwrap();

        assert_eq!(shared.load("k").unwrap(), cred);
        assert_eq!(shared.store_count(), 1);
    }

    #[test]
    fn positional_array_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path_for("acme_access_token"), r#"["tok", 4102444800]"#).unwrap();

        assert!(store.load("acme_access_token").is_none());
    }

    #[test]
    fn memory_store_corrupt_raw_is_absent() {
        let store = MemoryTokenStore::new();
        store.insert_raw("k", "{not json");
        assert!(store.load("k").is_none());
        assert_eq!(store.raw("k").as_deref(), Some("{not json"));
    }
}
