use super::{DocumentStore, StorageError, StoredDocument};
use crate::document::is_valid_pdf_filename;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures_util::TryStreamExt;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

const PDF_PREFIX: &str = "pdfs";
const SUMMARY_PREFIX: &str = "summaries";
const SUMMARY_SUFFIX: &str = "_summary.txt";

/// Object-layout store over any `object_store` backend.
pub struct ObjectDocumentStore {
    inner: Arc<dyn ObjectStore>,
    label: &'static str,
}

impl ObjectDocumentStore {
    /// Wrap an existing object store.
    pub fn new(inner: Arc<dyn ObjectStore>, label: &'static str) -> Self {
        Self { inner, label }
    }

    /// Store objects below `root` on the local filesystem.
    pub fn local(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let fs = LocalFileSystem::new_with_prefix(root)
            .map_err(|error| StorageError::Configuration(error.to_string()))?;
        Ok(Self::new(Arc::new(fs), "local"))
    }

    /// Store objects in a Google Cloud Storage bucket.
    ///
    /// Without a key the builder falls back to application default credentials.
    pub fn gcs(bucket: &str, service_account_key_b64: Option<&str>) -> Result<Self, StorageError> {
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
        if let Some(encoded) = service_account_key_b64 {
            let decoded = STANDARD.decode(encoded.trim()).map_err(|error| {
                StorageError::Configuration(format!("GCS_SA_KEY_B64 is not valid base64: {error}"))
            })?;
            let key = String::from_utf8(decoded).map_err(|error| {
                StorageError::Configuration(format!("GCS_SA_KEY_B64 is not UTF-8: {error}"))
            })?;
            builder = builder.with_service_account_key(key);
        }
        let store = builder
            .build()
            .map_err(|error| StorageError::Configuration(error.to_string()))?;
        Ok(Self::new(Arc::new(store), "gcs"))
    }

    /// Volatile store, used by tests and dry runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    async fn read(&self, path: &StorePath) -> Result<Option<Bytes>, StorageError> {
        match self.inner.get(path).await {
            Ok(result) => result.bytes().await.map(Some).map_err(backend),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(error) => Err(backend(error)),
        }
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StorageError> {
        match self.inner.delete(path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(error) => Err(backend(error)),
        }
    }
}

fn backend(error: object_store::Error) -> StorageError {
    StorageError::Backend(error.to_string())
}

fn pdf_path(filename: &str) -> StorePath {
    StorePath::from(format!("{PDF_PREFIX}/{filename}"))
}

fn summary_path(filename: &str) -> StorePath {
    StorePath::from(format!("{SUMMARY_PREFIX}/{filename}{SUMMARY_SUFFIX}"))
}

#[async_trait]
impl DocumentStore for ObjectDocumentStore {
    fn backend(&self) -> &'static str {
        self.label
    }

    async fn put_pdf(&self, filename: &str, bytes: Bytes) -> Result<(), StorageError> {
        self.inner
            .put(&pdf_path(filename), PutPayload::from(bytes))
            .await
            .map_err(backend)?;
        self.remove(&summary_path(filename)).await
    }

    async fn get_pdf(&self, filename: &str) -> Result<Option<Bytes>, StorageError> {
        self.read(&pdf_path(filename)).await
    }

    async fn list_pdfs(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let summary_prefix = StorePath::from(SUMMARY_PREFIX);
        let summaries: HashSet<String> = self
            .inner
            .list(Some(&summary_prefix))
            .map_ok(|meta| meta.location.filename().unwrap_or_default().to_string())
            .try_collect::<Vec<_>>()
            .await
            .map_err(backend)?
            .into_iter()
            .filter_map(|name| name.strip_suffix(SUMMARY_SUFFIX).map(str::to_string))
            .collect();

        let pdf_prefix = StorePath::from(PDF_PREFIX);
        let mut pdfs = BTreeMap::new();
        let objects: Vec<_> = self
            .inner
            .list(Some(&pdf_prefix))
            .try_collect()
            .await
            .map_err(backend)?;
        for meta in objects {
            match meta.location.filename() {
                Some(name) if is_valid_pdf_filename(name) => {
                    pdfs.insert(name.to_string(), meta.size as u64);
                }
                _ => {}
            }
        }

        Ok(pdfs
            .into_iter()
            .map(|(filename, size)| StoredDocument {
                has_summary: summaries.contains(&filename),
                filename,
                size,
            })
            .collect())
    }

    async fn put_summary(&self, filename: &str, summary: &str) -> Result<(), StorageError> {
        self.inner
            .put(
                &summary_path(filename),
                PutPayload::from(summary.as_bytes().to_vec()),
            )
            .await
            .map(|_| ())
            .map_err(backend)
    }

    async fn get_summary(&self, filename: &str) -> Result<Option<String>, StorageError> {
        match self.read(&summary_path(filename)).await? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|error| StorageError::Backend(format!("summary is not UTF-8: {error}"))),
            None => Ok(None),
        }
    }

    async fn delete_summary(&self, filename: &str) -> Result<(), StorageError> {
        self.remove(&summary_path(filename)).await
    }
}
