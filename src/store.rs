//! Local persistent key-value storage.
//!
//! Mirrors the device key-value API the mobile client persists its session
//! into: string keys, string values, multi-key reads and writes.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Keys under which a login persists its credentials.
pub mod keys {
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const ROLE: &str = "role";
    pub const EMAIL: &str = "email";
    pub const MEMBER_ID: &str = "memberId";

    /// Every session key, in persistence order.
    pub const SESSION: [&str; 4] = [REFRESH_TOKEN, ROLE, EMAIL, MEMBER_ID];
}

/// String key-value storage that outlives the process.
///
/// `multi_set` and `multi_remove` must apply all pairs or none: a session is
/// either fully present or fully absent.
///
/// # Example
///
/// ```rust,ignore
/// impl KeyValueStore for KeychainStore {
///     async fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
///         keys.iter().map(|k| self.keychain.read(k)).collect()
///     }
///     // ...
/// }
/// ```
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read several keys at once. The result has one slot per requested key.
    fn multi_get(
        &self,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<String>>, StoreError>> + Send;

    /// Write several pairs atomically.
    fn multi_set(
        &self,
        pairs: Vec<(String, String)>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove several keys atomically. Missing keys are ignored.
    fn multi_remove(&self, keys: &[&str]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read a single key.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        async move {
            let mut values = self.multi_get(&[key]).await?;
            Ok(values.pop().flatten())
        }
    }
}

/// In-process store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored pair.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().await.clone()
    }
}

impl KeyValueStore for MemoryStore {
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> Result<(), StoreError> {
        self.entries.write().await.extend(pairs);
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write replaces the file through a temporary sibling and a rename, so
/// readers never observe half of a `multi_set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let contents = serde_json::to_vec_pretty(entries)?;
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // Owner-only: the file holds a refresh token.
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&tmp).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.extend(pairs);
        self.save(&entries).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.save(&entries).await
    }
}
