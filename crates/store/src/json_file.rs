use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{PublicationLedger, StoreError, TopicCatalog, TopicRepository};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

/// Catalog and ledger stored as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    topics_path: PathBuf,
    ledger_path: PathBuf,
}

impl JsonFileRepository {
    /// Opens the repository, creating whichever document is absent.
    pub async fn open(
        topics_path: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let repository = Self {
            topics_path: topics_path.into(),
            ledger_path: ledger_path.into(),
        };
        repository.ensure_documents().await?;
        debug!(
            topics = %repository.topics_path.display(),
            ledger = %repository.ledger_path.display(),
            "opened topic repository"
        );
        Ok(repository)
    }

    /// Creates absent documents with their initial content. Idempotent: an
    /// existing document is left untouched, whatever it contains.
    pub async fn ensure_documents(&self) -> Result<(), StoreError> {
        if !exists(&self.topics_path).await? {
            info!(path = %self.topics_path.display(), "creating default topics file");
            write_document(&self.topics_path, &TopicCatalog::seeded()).await?;
        }
        if !exists(&self.ledger_path).await? {
            info!(path = %self.ledger_path.display(), "creating empty published file");
            write_document(&self.ledger_path, &PublicationLedger::default()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TopicRepository for JsonFileRepository {
    async fn load_catalog(&self) -> Result<TopicCatalog, StoreError> {
        read_document(&self.topics_path).await
    }

    async fn save_catalog(&self, catalog: &TopicCatalog) -> Result<(), StoreError> {
        write_document(&self.topics_path, catalog).await
    }

    async fn load_ledger(&self) -> Result<PublicationLedger, StoreError> {
        read_document(&self.ledger_path).await
    }

    async fn save_ledger(&self, ledger: &PublicationLedger) -> Result<(), StoreError> {
        write_document(&self.ledger_path, ledger).await
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn unavailable(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        document: path.display().to_string(),
        reason: err.to_string(),
    }
}

async fn exists(path: &Path) -> Result<bool, StoreError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| unavailable(path, e))
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| unavailable(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        document: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Writes to a sibling temporary file, then renames it over `path`, so a
/// reader never observes a half-written document.
async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut json = serde_json::to_vec_pretty(value).map_err(|e| unavailable(path, e))?;
    json.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        match tokio::fs::create_dir_all(parent).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(unavailable(path, e)),
        }
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, &json)
        .await
        .map_err(|e| unavailable(path, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| unavailable(path, e))
}
