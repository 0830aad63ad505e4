//! Search history persisted as a JSON array of `{ "id", "name" }` objects.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use crate::{Config, model::SearchHistoryEntry};

#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// Record a city. Names already present (ignoring case and surrounding
    /// whitespace) are not duplicated; the existing entry is returned instead.
    async fn add_city(&self, name: &str) -> Result<SearchHistoryEntry>;

    /// All entries, oldest first.
    async fn list(&self) -> Result<Vec<SearchHistoryEntry>>;

    /// Returns `false` when no entry had this id.
    async fn remove_city(&self, id: &str) -> Result<bool>;
}

/// History kept in a single JSON file.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// History at the file named by `config`. Needs no API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.history_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<SearchHistoryEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read history file: {}", self.path.display())
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history file: {}", self.path.display()))
    }

    async fn write(&self, entries: &[SearchHistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(entries).context("Failed to serialize history")?;

        // Write beside the target and rename, so the history file is never half-written.
        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write history file: {}", tmp.display()))?;

        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err).with_context(|| {
                format!("Failed to replace history file: {}", self.path.display())
            });
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history".to_string());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }
}

fn same_city(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait]
impl HistoryStore for JsonFileHistory {
    async fn add_city(&self, name: &str) -> Result<SearchHistoryEntry> {
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "Cannot add an empty city name to history");

        let _guard = self.write_lock.lock().await;
        let mut entries = self.read().await?;

        if let Some(existing) = entries.iter().find(|e| same_city(&e.name, name)) {
            tracing::debug!(city = name, id = %existing.id, "city already in history");
            return Ok(existing.clone());
        }

        let entry = SearchHistoryEntry {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        entries.push(entry.clone());
        self.write(&entries).await?;

        tracing::info!(city = name, id = %entry.id, "added city to history");
        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<SearchHistoryEntry>> {
        self.read().await
    }

    async fn remove_city(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read().await?;

        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        self.write(&entries).await?;
        tracing::info!(id, "removed city from history");
        Ok(true)
    }
}
