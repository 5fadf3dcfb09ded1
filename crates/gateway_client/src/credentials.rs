use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Client-local persistence for the bearer token.
pub trait CredentialStorage: Send + Sync {
    fn get(&self) -> Result<Option<String>>;

    fn set(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Key-value JSON file kept in a state directory, one entry per key.
pub struct FileCredentials {
    root: PathBuf,
}

impl FileCredentials {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create credential dir {}", self.root.display())
        })?;
        let path = self.path();
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), entries)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CredentialStorage for FileCredentials {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(TOKEN_KEY))
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        if !self.path().exists() {
            return Ok(());
        }
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// In-process token slot, for tests and sessions that should not touch disk.
#[derive(Default)]
pub struct MemoryCredentials {
    token: Mutex<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStorage for MemoryCredentials {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
