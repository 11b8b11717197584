//! SQLite-backed document and chunk storage

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Document, DocumentStatus, StoredChunk};

use super::document_store::DocumentStore;

/// SQLite document store
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Persistence(format!("failed to create data dir: {}", e)))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Persistence(format!("failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (tests, throwaway runs)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Persistence(format!("failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::Persistence(format!("failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                source_url TEXT NOT NULL,
                status TEXT NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_class ON documents(user_id, class_id);
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

            CREATE TABLE IF NOT EXISTS document_chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE,
                UNIQUE(document_id, chunk_index)
            );

            CREATE INDEX IF NOT EXISTS idx_document_chunks_document
                ON document_chunks(document_id);
        "#,
        )
        .map_err(|e| Error::Persistence(format!("failed to run migrations: {}", e)))?;

        tracing::debug!("database migrations complete");
        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn insert_document(&self, document: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (id, user_id, class_id, filename, source_url, status, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                document.id.to_string(),
                document.user_id.to_string(),
                document.class_id.to_string(),
                document.filename,
                document.source_url,
                status_to_string(&document.status),
                document.uploaded_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Persistence(format!("failed to insert document: {}", e)))?;

        Ok(())
    }

    fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, class_id, filename, source_url, status, uploaded_at
                 FROM documents WHERE id = ?1",
            )
            .map_err(|e| Error::Persistence(format!("failed to prepare query: {}", e)))?;

        let document = stmt
            .query_row(params![id.to_string()], row_to_document)
            .optional()
            .map_err(|e| Error::Persistence(format!("failed to get document: {}", e)))?;

        Ok(document)
    }

    fn list_by_class(&self, user_id: &Uuid, class_id: &Uuid) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, class_id, filename, source_url, status, uploaded_at
                 FROM documents WHERE user_id = ?1 AND class_id = ?2
                 ORDER BY uploaded_at DESC",
            )
            .map_err(|e| Error::Persistence(format!("failed to prepare query: {}", e)))?;

        let documents = stmt
            .query_map(params![user_id.to_string(), class_id.to_string()], row_to_document)
            .map_err(|e| Error::Persistence(format!("failed to list documents: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(documents)
    }

    fn set_status(&self, id: &Uuid, status: DocumentStatus) -> Result<()> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                "UPDATE documents SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status_to_string(&status)],
            )
            .map_err(|e| Error::Persistence(format!("failed to update status: {}", e)))?;

        if updated == 0 {
            return Err(Error::DocumentNotFound(*id));
        }
        Ok(())
    }

    fn delete_document(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let deleted = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])
            .map_err(|e| Error::Persistence(format!("failed to delete document: {}", e)))?;

        Ok(deleted > 0)
    }

    fn replace_chunks(&self, document_id: &Uuid, contents: &[String]) -> Result<()> {
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| Error::Persistence(format!("failed to begin transaction: {}", e)))?;

        {
            tx.execute(
                "DELETE FROM document_chunks WHERE document_id = ?1",
                params![document_id.to_string()],
            )
            .map_err(|e| Error::Persistence(format!("failed to clear prior chunks: {}", e)))?;

            let mut stmt = tx
                .prepare(
                    "INSERT INTO document_chunks (document_id, chunk_index, content, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| Error::Persistence(format!("failed to prepare statement: {}", e)))?;

            let now = Utc::now().to_rfc3339();
            for (index, content) in contents.iter().enumerate() {
                stmt.execute(params![
                    document_id.to_string(),
                    index as i64,
                    content,
                    &now,
                ])
                .map_err(|e| Error::Persistence(format!("failed to insert chunk: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::Persistence(format!("failed to commit chunks: {}", e)))?;

        Ok(())
    }

    fn chunks_for_document(&self, document_id: &Uuid) -> Result<Vec<StoredChunk>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, chunk_index, content
                 FROM document_chunks WHERE document_id = ?1
                 ORDER BY chunk_index ASC",
            )
            .map_err(|e| Error::Persistence(format!("failed to prepare query: {}", e)))?;

        let chunks = stmt
            .query_map(params![document_id.to_string()], row_to_chunk)
            .map_err(|e| Error::Persistence(format!("failed to list chunks: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(chunks)
    }

    fn chunk_count(&self, document_id: &Uuid) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM document_chunks WHERE document_id = ?1",
                params![document_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Persistence(format!("failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }
}

// Helper functions

fn status_to_string(status: &DocumentStatus) -> &'static str {
    status.as_str()
}

fn string_to_status(s: &str) -> DocumentStatus {
    match s {
        "pending" => DocumentStatus::Pending,
        "processing" => DocumentStatus::Processing,
        "processed" => DocumentStatus::Processed,
        "failed" => DocumentStatus::Failed,
        _ => DocumentStatus::Failed,
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let class_id_str: String = row.get(2)?;
    let filename: String = row.get(3)?;
    let source_url: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let uploaded_at_str: String = row.get(6)?;

    Ok(Document {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        user_id: Uuid::parse_str(&user_id_str).unwrap_or_else(|_| Uuid::nil()),
        class_id: Uuid::parse_str(&class_id_str).unwrap_or_else(|_| Uuid::nil()),
        filename,
        source_url,
        status: string_to_status(&status_str),
        uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at_str)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<StoredChunk> {
    let id: i64 = row.get(0)?;
    let document_id_str: String = row.get(1)?;
    let chunk_index: i64 = row.get(2)?;
    let content: String = row.get(3)?;

    Ok(StoredChunk {
        id,
        document_id: Uuid::parse_str(&document_id_str).unwrap_or_else(|_| Uuid::nil()),
        chunk_index: chunk_index as u32,
        content,
    })
}
