//! Durable key/value storage backing the session store.
//!
//! The browser client kept its session in two local-storage keys. Here the
//! same two keys live behind [`KeyValueStore`], with a JSON file
//! implementation for the terminal client and an in-memory one for tests.

use super::errors::AuthResult;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "skillatics_token";

/// Storage key holding the JSON-encoded user snapshot
pub const USER_KEY: &str = "skillatics_user";

/// String key/value storage with atomic multi-key writes
pub trait KeyValueStore: Send + Sync {
    /// Read a single key
    fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Write all entries or none of them
    fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()>;

    /// Remove all keys in one write
    fn remove_many(&self, keys: &[&str]) -> AuthResult<()>;
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()> {
        let mut map = self.entries();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> AuthResult<()> {
        let mut map = self.entries();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON document on disk, rewritten through a temp file and rename
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store at `<dir>/session.json`, creating `dir` if needed
    pub fn in_dir(dir: &Path) -> AuthResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self::new(dir.join("session.json")))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> AuthResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Unreadable documents read as empty so login and logout still work
    fn read_map_or_empty(&self) -> BTreeMap<String, String> {
        self.read_map().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    /// Hidden temp file next to the target, unique per process and write
    fn temp_path(&self) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let name = self
            .path
            .file_name()
            .map_or_else(|| "session.json".into(), |n| n.to_string_lossy());
        self.path.with_file_name(format!(
            ".{}.tmp.{}.{}.{}",
            name,
            std::process::id(),
            nanos,
            counter
        ))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> AuthResult<()> {
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.temp_path();
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)?;

        let written = file
            .write_all(contents.as_bytes())
            .and_then(|()| file.sync_all());
        drop(file);
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn modify<F>(&self, f: F) -> AuthResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut map = self.read_map_or_empty();
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(self.read_map_or_empty().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AuthResult<()> {
        self.modify(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> AuthResult<()> {
        self.modify(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
