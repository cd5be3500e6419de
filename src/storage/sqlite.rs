use super::{DocumentStore, StorageError, StoredDocument};
use crate::document::compute_digest;
use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS pdfs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL UNIQUE,
        content BLOB NOT NULL,
        digest TEXT NOT NULL,
        upload_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS summaries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pdf_id INTEGER NOT NULL UNIQUE,
        summary TEXT NOT NULL,
        summarized_at TEXT NOT NULL,
        FOREIGN KEY (pdf_id) REFERENCES pdfs(id) ON DELETE CASCADE
    );
"#;

/// Relational store keeping PDFs and summaries in one SQLite file.
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path).map_err(sql)?)
    }

    /// Database that lives only as long as the store.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory().map_err(sql)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(sql)?;
        conn.execute_batch(SCHEMA).map_err(sql)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            operation(&mut guard).map_err(sql)
        })
        .await
        .map_err(|error| StorageError::Backend(format!("sqlite task failed: {error}")))?
    }
}

fn sql(error: rusqlite::Error) -> StorageError {
    StorageError::Backend(error.to_string())
}

fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn put_pdf(&self, filename: &str, bytes: Bytes) -> Result<(), StorageError> {
        let filename = filename.to_string();
        let digest = compute_digest(&bytes);
        let uploaded_at = now();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO pdfs (filename, content, digest, upload_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(filename) DO UPDATE SET
                     content = excluded.content,
                     digest = excluded.digest,
                     upload_at = excluded.upload_at",
                params![filename, bytes.as_ref(), digest, uploaded_at],
            )?;
            tx.execute(
                "DELETE FROM summaries
                 WHERE pdf_id = (SELECT id FROM pdfs WHERE filename = ?1)",
                params![filename],
            )?;
            tx.commit()
        })
        .await
    }

    async fn get_pdf(&self, filename: &str) -> Result<Option<Bytes>, StorageError> {
        let filename = filename.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT content FROM pdfs WHERE filename = ?1",
                params![filename],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
        })
        .await
        .map(|content| content.map(Bytes::from))
    }

    async fn list_pdfs(&self) -> Result<Vec<StoredDocument>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.filename, length(p.content), s.id IS NOT NULL
                 FROM pdfs p
                 LEFT JOIN summaries s ON s.pdf_id = p.id
                 ORDER BY p.filename",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(StoredDocument {
                    filename: row.get(0)?,
                    size: row.get::<_, i64>(1)?.max(0) as u64,
                    has_summary: row.get(2)?,
                })
            })?;
            let documents = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(documents)
        })
        .await
    }

    async fn put_summary(&self, filename: &str, summary: &str) -> Result<(), StorageError> {
        let filename_owned = filename.to_string();
        let summary = summary.to_string();
        let summarized_at = now();
        let updated = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO summaries (pdf_id, summary, summarized_at)
                     SELECT id, ?2, ?3 FROM pdfs WHERE filename = ?1
                     ON CONFLICT(pdf_id) DO UPDATE SET
                         summary = excluded.summary,
                         summarized_at = excluded.summarized_at",
                    params![filename_owned, summary, summarized_at],
                )
            })
            .await?;
        if updated == 0 {
            return Err(StorageError::Backend(format!(
                "cannot store summary for unknown PDF {filename}"
            )));
        }
        Ok(())
    }

    async fn get_summary(&self, filename: &str) -> Result<Option<String>, StorageError> {
        let filename = filename.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT s.summary FROM summaries s
                 JOIN pdfs p ON p.id = s.pdf_id
                 WHERE p.filename = ?1",
                params![filename],
                |row| row.get(0),
            )
            .optional()
        })
        .await
    }

    async fn delete_summary(&self, filename: &str) -> Result<(), StorageError> {
        let filename = filename.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM summaries
                 WHERE pdf_id = (SELECT id FROM pdfs WHERE filename = ?1)",
                params![filename],
            )
            .map(|_| ())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back_pdf_and_summary() {
        let store = SqliteDocumentStore::in_memory().expect("db");
        store
            .put_pdf("a.pdf", Bytes::from_static(b"%PDF"))
            .await
            .expect("put");
        store.put_summary("a.pdf", "Summary").await.expect("summary");

        assert_eq!(
            store.get_pdf("a.pdf").await.expect("get").as_deref(),
            Some(&b"%PDF"[..])
        );
        assert_eq!(
            store.get_summary("a.pdf").await.expect("get").as_deref(),
            Some("Summary")
        );
    }

    #[tokio::test]
    async fn summary_for_unknown_pdf_is_rejected() {
        let store = SqliteDocumentStore::in_memory().expect("db");
        assert!(store.put_summary("ghost.pdf", "text").await.is_err());
    }

    #[tokio::test]
    async fn reupload_replaces_content_and_clears_summary() {
        let store = SqliteDocumentStore::in_memory().expect("db");
        store
            .put_pdf("a.pdf", Bytes::from_static(b"one"))
            .await
            .expect("put");
        store.put_summary("a.pdf", "old").await.expect("summary");
        store
            .put_pdf("a.pdf", Bytes::from_static(b"three"))
            .await
            .expect("replace");

        assert!(store.get_summary("a.pdf").await.expect("get").is_none());
        let listed = store.list_pdfs().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size, 5);
    }

    #[tokio::test]
    async fn listing_flags_summaries_and_sorts() {
        let store = SqliteDocumentStore::in_memory().expect("db");
        for name in ["z.pdf", "m.pdf"] {
            store
                .put_pdf(name, Bytes::from_static(b"ab"))
                .await
                .expect("put");
        }
        store.put_summary("z.pdf", "Z").await.expect("summary");
        store.put_summary("z.pdf", "Z2").await.expect("overwrite");

        let listed = store.list_pdfs().await.expect("list");
        let names: Vec<_> = listed.iter().map(|doc| doc.filename.as_str()).collect();
        assert_eq!(names, vec!["m.pdf", "z.pdf"]);
        assert!(!listed[0].has_summary);
        assert!(listed[1].has_summary);
        assert_eq!(store.get_summary("z.pdf").await.expect("get").as_deref(), Some("Z2"));

        store.delete_summary("z.pdf").await.expect("delete");
        assert!(store.get_summary("z.pdf").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("pdfsum.db");
        {
            let store = SqliteDocumentStore::open(&path).expect("open");
            store
                .put_pdf("a.pdf", Bytes::from_static(b"x"))
                .await
                .expect("put");
        }
        let reopened = SqliteDocumentStore::open(&path).expect("reopen");
        assert!(reopened.get_pdf("a.pdf").await.expect("get").is_some());
    }
}
