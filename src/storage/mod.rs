//! Persistence of uploaded PDFs and their summaries.
//!
//! Two layouts are supported: an object layout (`pdfs/<name>`, `summaries/<name>_summary.txt`)
//! served by `object_store` for the local filesystem and Google Cloud Storage, and a relational
//! layout in SQLite.

use crate::config::{Config, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

mod object;
mod sqlite;

pub use object::ObjectDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be created from configuration.
    #[error("storage misconfigured: {0}")]
    Configuration(String),
    /// Read or write against the backend failed.
    #[error("storage operation failed: {0}")]
    Backend(String),
    /// Filesystem error while preparing the backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listing entry for a stored PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    /// File name the PDF was uploaded under.
    pub filename: String,
    /// Size of the PDF in bytes.
    pub size: u64,
    /// Whether a summary is persisted for the PDF.
    pub has_summary: bool,
}

/// Storage port used by the summary service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Store (or replace) a PDF. Replacing a PDF drops its persisted summary.
    async fn put_pdf(&self, filename: &str, bytes: Bytes) -> Result<(), StorageError>;

    /// Fetch a PDF, `None` when absent.
    async fn get_pdf(&self, filename: &str) -> Result<Option<Bytes>, StorageError>;

    /// List stored PDFs sorted by file name.
    async fn list_pdfs(&self) -> Result<Vec<StoredDocument>, StorageError>;

    /// Store (or replace) the summary for a PDF.
    async fn put_summary(&self, filename: &str, summary: &str) -> Result<(), StorageError>;

    /// Fetch the persisted summary, `None` when absent.
    async fn get_summary(&self, filename: &str) -> Result<Option<String>, StorageError>;

    /// Remove a persisted summary. Missing summaries are not an error.
    async fn delete_summary(&self, filename: &str) -> Result<(), StorageError>;
}

/// Build the store selected by configuration; `None` disables persistence.
pub fn from_config(config: &Config) -> Result<Option<Arc<dyn DocumentStore>>, StorageError> {
    let store: Arc<dyn DocumentStore> = match config.storage_backend {
        StorageBackend::None => return Ok(None),
        StorageBackend::Local => Arc::new(ObjectDocumentStore::local(&config.storage_local_root)?),
        StorageBackend::Gcs => {
            let bucket = config.gcs_bucket_name.as_deref().ok_or_else(|| {
                StorageError::Configuration("GCS_BUCKET_NAME is required".into())
            })?;
            Arc::new(ObjectDocumentStore::gcs(
                bucket,
                config.gcs_service_account_key_b64.as_deref(),
            )?)
        }
        StorageBackend::Sqlite => Arc::new(SqliteDocumentStore::open(&config.sqlite_path)?),
    };
    tracing::info!(backend = store.backend(), "Document storage initialized");
    Ok(Some(store))
}
