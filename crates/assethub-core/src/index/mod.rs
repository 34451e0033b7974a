//! Derived search index over catalog assets.
//!
//! The index lives in its own SQLite file and is never authoritative: every
//! document is a projection of a catalog asset plus its tag/category
//! relationships, regenerable at any time. If the file is corrupt or its
//! schema version does not match, the only recovery is [`AssetIndex::recreate`]
//! followed by a full rebuild from the catalog; patching a broken index is
//! unsupported.

mod fts5;
pub mod query;

pub use fts5::FtsConfig;

use crate::catalog::Asset;
use crate::config::IndexConfig;
use crate::error::{AssetHubError, Result};
use chrono::Utc;
use fts5::FtsManager;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// A searchable projection of one asset.
///
/// Facet fields are stored lower-cased so filtering is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub id: String,
    pub name: String,
    pub description: String,
    pub file_type: String,
    pub file_format: String,
    pub source: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub updated_at: String,
}

impl IndexDocument {
    /// Project an asset and its relationships into a document.
    pub fn from_asset(asset: &Asset, tags: &[String], categories: &[String]) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            description: asset.description.clone(),
            file_type: asset.file_type.as_str().to_string(),
            file_format: asset.file_format.to_lowercase(),
            source: asset.source.to_lowercase(),
            tags: tags.iter().map(|t| t.to_lowercase()).collect(),
            categories: categories.iter().map(|c| c.to_lowercase()).collect(),
            updated_at: asset.updated_at.clone(),
        }
    }
}

/// Bookkeeping used for staleness and corruption checks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub path: PathBuf,
    pub schema_version: i64,
    pub last_full_rebuild: Option<String>,
    pub document_count: usize,
}

/// Exact-match facet constraints plus an optional match expression.
#[derive(Debug, Clone, Default)]
pub struct IndexQuery {
    pub match_expr: Option<String>,
    pub file_type: Option<String>,
    pub file_format: Option<String>,
    pub source: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// SQLite-backed search index with FTS5 text search.
#[derive(Debug)]
pub struct AssetIndex {
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    fts: FtsConfig,
}

impl AssetIndex {
    /// Create or open the index at the given path.
    ///
    /// Fails with `IndexCorrupt` when the file is unreadable as a database
    /// or carries a different schema version; callers recover via
    /// [`recreate`](Self::recreate) and a rebuild from the catalog.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AssetHubError::io_with_path(e, parent))?;
            }
        }

        let fts = FtsConfig::default();
        let conn = Connection::open(&db_path)?;
        Self::initialize(&conn, &fts).map_err(|reason| AssetHubError::IndexCorrupt {
            path: db_path.clone(),
            reason,
        })?;

        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
            fts,
        })
    }

    /// Delete the index file and start fresh. The mandatory follow-up is a
    /// full rebuild from the catalog.
    pub fn recreate(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        for suffix in ["", "-wal", "-shm"] {
            let mut os_path = db_path.clone().into_os_string();
            os_path.push(suffix);
            let path = PathBuf::from(os_path);
            if path.exists() {
                std::fs::remove_file(&path).map_err(|e| AssetHubError::io_with_path(e, &path))?;
            }
        }
        info!("Recreated search index at {}", db_path.display());
        Self::open(db_path)
    }

    /// Configure, create or validate the schema. Any failure here means the
    /// file is not usable as this index.
    fn initialize(conn: &Connection, fts: &FtsConfig) -> std::result::Result<(), String> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| e.to_string())?;

        let has_meta = Self::table_exists(conn, "index_meta").map_err(|e| e.to_string())?;
        let has_documents = Self::table_exists(conn, "documents").map_err(|e| e.to_string())?;

        if !has_meta {
            if has_documents {
                return Err("documents present without index metadata".to_string());
            }
            Self::create_schema(conn).map_err(|e| e.to_string())?;
        } else {
            let version: Option<String> = conn
                .query_row(
                    "SELECT value FROM index_meta WHERE key = 'schema_version'",
                    [],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| e.to_string())?;
            let version: i64 = version
                .ok_or_else(|| "missing schema version".to_string())?
                .parse()
                .map_err(|_| "unparseable schema version".to_string())?;
            if version != IndexConfig::SCHEMA_VERSION {
                return Err(format!(
                    "schema version {} does not match expected {}",
                    version,
                    IndexConfig::SCHEMA_VERSION
                ));
            }
        }

        FtsManager::new(fts)
            .ensure_setup(conn)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                file_type TEXT NOT NULL,
                file_format TEXT NOT NULL,
                source TEXT NOT NULL,
                tags_json TEXT NOT NULL,
                categories_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_type ON documents(file_type);
            CREATE INDEX IF NOT EXISTS idx_documents_format ON documents(file_format);
            CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(updated_at);

            CREATE TABLE IF NOT EXISTS document_tags (
                doc_id TEXT NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (doc_id, tag)
            );
            CREATE TABLE IF NOT EXISTS document_categories (
                doc_id TEXT NOT NULL,
                category TEXT NOT NULL,
                PRIMARY KEY (doc_id, category)
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('schema_version', ?1)",
            params![IndexConfig::SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AssetHubError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Get the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ========================================
    // Document Writes
    // ========================================

    /// Insert or replace a document, replacing any prior version by id.
    pub fn upsert_document(&self, doc: &IndexDocument) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        Self::write_document(&tx, doc)?;
        tx.commit()?;

        debug!("Indexed document {}", doc.id);
        Ok(())
    }

    /// Remove a document by id. No-op when absent.
    pub fn remove_document(&self, id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM document_tags WHERE doc_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM document_categories WHERE doc_id = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        tx.commit()?;

        if removed > 0 {
            debug!("Removed document {}", id);
        }
        Ok(())
    }

    /// Clear the index and repopulate it from scratch.
    ///
    /// Holds the connection for the whole operation: a rebuild never
    /// interleaves with document upserts.
    pub fn rebuild(&self, docs: &[IndexDocument]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM document_tags", [])?;
        tx.execute("DELETE FROM document_categories", [])?;
        tx.execute("DELETE FROM documents", [])?;
        for doc in docs {
            Self::write_document(&tx, doc)?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('last_full_rebuild', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        info!("Rebuilt search index with {} documents", docs.len());
        Ok(docs.len())
    }

    fn write_document(conn: &Connection, doc: &IndexDocument) -> Result<()> {
        let tags_json = serde_json::to_string(&doc.tags)?;
        let categories_json = serde_json::to_string(&doc.categories)?;

        conn.execute(
            "INSERT INTO documents (
                id, name, description, file_type, file_format, source,
                tags_json, categories_json, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name=excluded.name,
                description=excluded.description,
                file_type=excluded.file_type,
                file_format=excluded.file_format,
                source=excluded.source,
                tags_json=excluded.tags_json,
                categories_json=excluded.categories_json,
                updated_at=excluded.updated_at",
            params![
                doc.id,
                doc.name,
                doc.description,
                doc.file_type,
                doc.file_format,
                doc.source,
                tags_json,
                categories_json,
                doc.updated_at,
            ],
        )?;

        conn.execute("DELETE FROM document_tags WHERE doc_id = ?1", params![doc.id])?;
        for tag in &doc.tags {
            conn.execute(
                "INSERT OR IGNORE INTO document_tags (doc_id, tag) VALUES (?1, ?2)",
                params![doc.id, tag],
            )?;
        }
        conn.execute(
            "DELETE FROM document_categories WHERE doc_id = ?1",
            params![doc.id],
        )?;
        for category in &doc.categories {
            conn.execute(
                "INSERT OR IGNORE INTO document_categories (doc_id, category) VALUES (?1, ?2)",
                params![doc.id, category],
            )?;
        }
        Ok(())
    }

    // ========================================
    // Reads
    // ========================================

    /// Execute a query, returning matching document ids in rank order.
    ///
    /// With a match expression, order is relevance then recency; without,
    /// pure recency.
    pub fn search_ids(&self, query: &IndexQuery) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut where_parts: Vec<String> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref expr) = query.match_expr {
            where_parts.push(format!("{} MATCH ?", self.fts.table_name));
            params_vec.push(Box::new(expr.clone()));
        }
        for (column, value) in [
            ("file_type", &query.file_type),
            ("file_format", &query.file_format),
            ("source", &query.source),
        ] {
            if let Some(value) = value {
                where_parts.push(format!("d.{column} = ?"));
                params_vec.push(Box::new(value.clone()));
            }
        }
        if let Some(ref tag) = query.tag {
            where_parts
                .push("EXISTS (SELECT 1 FROM document_tags t WHERE t.doc_id = d.id AND t.tag = ?)".to_string());
            params_vec.push(Box::new(tag.clone()));
        }
        if let Some(ref category) = query.category {
            where_parts.push(
                "EXISTS (SELECT 1 FROM document_categories c WHERE c.doc_id = d.id AND c.category = ?)"
                    .to_string(),
            );
            params_vec.push(Box::new(category.clone()));
        }

        let where_clause = if where_parts.is_empty() {
            "1=1".to_string()
        } else {
            where_parts.join(" AND ")
        };

        let sql = if query.match_expr.is_some() {
            format!(
                "SELECT d.id FROM {fts} JOIN documents d ON d.id = {fts}.id \
                 WHERE {where_clause} ORDER BY rank, d.updated_at DESC \
                 LIMIT {limit} OFFSET {offset}",
                fts = self.fts.table_name,
                limit = query.limit,
                offset = query.offset,
            )
        } else {
            format!(
                "SELECT d.id FROM documents d WHERE {where_clause} \
                 ORDER BY d.updated_at DESC LIMIT {limit} OFFSET {offset}",
                limit = query.limit,
                offset = query.offset,
            )
        };

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Number of indexed documents.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: usize =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Index bookkeeping, used for staleness decisions.
    pub fn metadata(&self) -> Result<IndexMetadata> {
        let conn = self.conn()?;
        let last_full_rebuild: Option<String> = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'last_full_rebuild'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let document_count: usize =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        Ok(IndexMetadata {
            path: self.db_path.clone(),
            schema_version: IndexConfig::SCHEMA_VERSION,
            last_full_rebuild,
            document_count,
        })
    }

    // ========================================
    // Facet Enumeration
    // ========================================

    pub fn distinct_tags(&self) -> Result<Vec<String>> {
        self.distinct("SELECT DISTINCT tag FROM document_tags ORDER BY tag")
    }

    pub fn distinct_categories(&self) -> Result<Vec<String>> {
        self.distinct("SELECT DISTINCT category FROM document_categories ORDER BY category")
    }

    pub fn distinct_file_types(&self) -> Result<Vec<String>> {
        self.distinct("SELECT DISTINCT file_type FROM documents ORDER BY file_type")
    }

    pub fn distinct_file_formats(&self) -> Result<Vec<String>> {
        self.distinct("SELECT DISTINCT file_format FROM documents ORDER BY file_format")
    }

    pub fn distinct_sources(&self) -> Result<Vec<String>> {
        self.distinct("SELECT DISTINCT source FROM documents ORDER BY source")
    }

    fn distinct(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }
}
