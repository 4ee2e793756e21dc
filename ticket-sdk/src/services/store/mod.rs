//! File-backed ticket store
//!
//! Append-only NDJSON file on disk, one `FlattenedTicket` per line. Lookups
//! scan the whole file, which is fine for the volumes a support desk files.

mod models;
pub use models::FlattenedTicket;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::warn;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{ServiceConfig, StoreConfig, DEFAULT_PROVIDER};
use crate::core::TicketStore;
use crate::error::{Result, ServiceError};

/// NDJSON ticket store
pub struct FileTicketStore {
    path: PathBuf,

    /// Serializes appends from concurrent requests
    write_lock: Mutex<()>,
}

impl FileTicketStore {
    /// Create a store from `TICKET_STORE_PATH` or the default location.
    ///
    /// The parent directory is created eagerly so a bad path fails at startup.
    pub fn from_env() -> Result<Self> {
        let config = StoreConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    pub fn new_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self::at(config.path))
    }

    /// Store backed by `path` without touching the filesystem
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn append_line(&self, line: &str) -> Result<()> {
        self.ensure_parent_dir().await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<FlattenedTicket>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut file = fs::File::open(&self.path).await?;
        let mut buf = String::new();
        file.read_to_string(&mut buf).await?;

        let mut out = Vec::new();
        for (index, line) in buf.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FlattenedTicket>(line) {
                Ok(ticket) => out.push(ticket),
                Err(err) => warn!("Skipping unreadable ticket record on line {}: {}", index + 1, err),
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl TicketStore for FileTicketStore {
    async fn save(&self, ticket: &FlattenedTicket) -> Result<String> {
        let mut record = ticket.clone();
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }

        let line = serde_json::to_string(&record)?;

        let _guard = self.write_lock.lock().await;
        self.append_line(&line)
            .await
            .map_err(|e| e.with_context_value("path", self.path.display()))?;

        Ok(record.id)
    }

    async fn find_by_ticket_id(&self, ticket_id: &str) -> Result<FlattenedTicket> {
        self.read_all()
            .await?
            .into_iter()
            .find(|t| t.ticket_id == ticket_id)
            .ok_or_else(|| ServiceError::not_found(format!("ticket not found: {}", ticket_id)))
    }

    async fn find_all(&self) -> Result<Vec<FlattenedTicket>> {
        self.read_all().await
    }
}
