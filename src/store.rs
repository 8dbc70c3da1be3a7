use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;

use crate::prelude::*;

/// Flat mapping of primitive values: numbers and RFC 3339 timestamps.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(pub Map<String, Value>);

impl Blob {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Durable key-value storage for the accumulated state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns [`None`] when nothing has been saved under the key yet.
    async fn load(&self, key: &str) -> Result<Option<Blob>>;

    async fn save(&self, key: &str, blob: &Blob) -> Result;
}

/// Stores every key as a separate JSON file.
#[must_use]
pub struct JsonFileStore {
    directory: PathBuf,
}

impl JsonFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

#[async_trait]
impl Store for JsonFileStore {
    #[instrument(skip_all, name = "Loading the state…", fields(key = key))]
    async fn load(&self, key: &str) -> Result<Option<Blob>> {
        let path = self.path(key);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let contents = fs::read(&path)
            .await
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let blob = serde_json::from_slice(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        Ok(Some(blob))
    }

    /// Write into a temporary file and rename it over the old one,
    /// so that a crash leaves either the old or the new state.
    #[instrument(skip_all, name = "Saving the state…", fields(key = key))]
    async fn save(&self, key: &str, blob: &Blob) -> Result {
        fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("failed to create `{}`", self.directory.display()))?;
        let path = self.path(key);
        let temporary_path = path.with_extension("json.tmp");
        fs::write(&temporary_path, serde_json::to_vec_pretty(blob)?)
            .await
            .with_context(|| format!("failed to write `{}`", temporary_path.display()))?;
        fs::rename(&temporary_path, &path)
            .await
            .with_context(|| format!("failed to replace `{}`", path.display()))?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }
}

#[cfg(test)]
pub use self::memory::MemoryStore;
