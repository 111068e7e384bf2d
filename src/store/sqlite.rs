//! SQLite-backed content store
//!
//! Embeddings are stored as little-endian `f32` BLOBs in a side table and
//! joined onto content rows when a project is listed.

use super::{ContentRow, ContentStore, StoreError};
use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Content store over a pooled SQLite database
#[derive(Clone)]
pub struct SqliteContentStore {
    pool: DbPool,
}

impl SqliteContentStore {
    /// Open (or create) the content database
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Connection-scoped pragmas must run on every pooled connection
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });
        let pool = Pool::builder().max_size(16).build(manager)?;

        {
            let conn = pool.get()?;
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            tracing::debug!("Content store journal mode: {}", mode);
        }

        let store = Self { pool };
        store.migrate()?;

        Ok(store)
    }

    fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying content store migration {}", version);

                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Insert or update a content row, optionally with its embedding
    ///
    /// Re-ingesting an id keeps its position in listing order. A row given
    /// without an embedding keeps the stored one while its text is unchanged;
    /// if the text changed, the stale embedding is removed.
    pub fn insert(
        &self,
        project_id: &str,
        row: &ContentRow,
        model: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.get_conn()?;
        let now = chrono::Utc::now().timestamp();
        let tx = conn.transaction()?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT text FROM content WHERE id = ?1",
                params![row.id],
                |r| r.get(0),
            )
            .optional()?;
        let text_changed = previous.is_some_and(|text| text != row.text);

        // An upsert, not OR REPLACE: replacing would cascade to the embedding
        tx.execute(
            "INSERT INTO content (id, project_id, text, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                project_id = excluded.project_id,
                text = excluded.text",
            params![row.id, project_id, row.text, now],
        )?;

        match &row.embedding {
            Some(embedding) => {
                tx.execute(
                    "INSERT OR REPLACE INTO embeddings (content_id, vector, model, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![row.id, encode_vector(embedding), model, now],
                )?;
            }
            None if text_changed => {
                tx.execute(
                    "DELETE FROM embeddings WHERE content_id = ?1",
                    params![row.id],
                )?;
            }
            None => {}
        }

        tx.commit()?;
        Ok(())
    }

    /// Number of content rows stored for a project
    pub fn count(&self, project_id: &str) -> Result<usize, StoreError> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM content WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn list_blocking(&self, project_id: &str) -> Result<Vec<ContentRow>, StoreError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.text, e.vector
             FROM content c
             LEFT JOIN embeddings e ON e.content_id = c.id
             WHERE c.project_id = ?1
             ORDER BY c.created_at, c.rowid",
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<Vec<u8>>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, text, blob)| {
                let embedding = blob.and_then(|bytes| match decode_vector(&id, &bytes) {
                    Ok(vector) => Some(vector),
                    Err(e) => {
                        tracing::warn!("Ignoring stored embedding: {}", e);
                        None
                    }
                });
                ContentRow {
                    id,
                    text,
                    embedding,
                }
            })
            .collect())
    }

    fn fetch_embedding_blocking(&self, content_id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        let conn = self.get_conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT vector FROM embeddings WHERE content_id = ?1",
                params![content_id],
                |row| row.get(0),
            )
            .optional()?;

        blob.map(|bytes| decode_vector(content_id, &bytes))
            .transpose()
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ContentRow>, StoreError> {
        let store = self.clone();
        let project_id = project_id.to_string();
        tokio::task::spawn_blocking(move || store.list_blocking(&project_id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("Query task failed: {}", e)))?
    }

    async fn fetch_embedding(&self, content_id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        let store = self.clone();
        let content_id = content_id.to_string();
        tokio::task::spawn_blocking(move || store.fetch_embedding_blocking(&content_id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("Query task failed: {}", e)))?
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(id: &str, bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::MalformedEmbedding {
            id: id.to_string(),
            reason: format!("{} bytes is not a whole number of f32 values", bytes.len()),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: content rows and their embeddings
    r#"
    CREATE TABLE content (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        text TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE INDEX idx_content_project ON content(project_id, created_at);

    CREATE TABLE embeddings (
        content_id TEXT PRIMARY KEY,
        vector BLOB NOT NULL,
        model TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (content_id) REFERENCES content(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_embeddings_model ON embeddings(model);
    "#,
];
