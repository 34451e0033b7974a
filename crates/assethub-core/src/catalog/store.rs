//! SQLite-backed catalog store.

use crate::catalog::types::{Asset, AssetKind, Category, CategoryNode, Tag, UpsertOutcome};
use crate::error::{AssetHubError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Column list shared by every asset SELECT, in `row_to_asset` order.
const ASSET_COLUMNS: &str = "id, name, description, file_path, file_size, file_type, \
     file_format, created_at, updated_at, last_accessed, access_count, \
     source, source_url, source_id, vertex_count, face_count, material_count, \
     width, height, channels";

/// Durable storage for assets and their tag/category relationships.
///
/// One writer at a time per database file; writes touching a single asset are
/// additionally serialized through an advisory per-id lock so a rescan racing
/// an in-flight update of the same path cannot lose either write. Unrelated
/// ids never contend on those advisory locks.
pub struct CatalogStore {
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    locks: IdLocks,
}

impl CatalogStore {
    /// Create or open a catalog database at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AssetHubError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
            locks: IdLocks::default(),
        })
    }

    /// Configure connection with optimal settings.
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        Ok(())
    }

    /// Ensure the base schema exists.
    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                file_path TEXT NOT NULL UNIQUE,
                file_size INTEGER NOT NULL,
                file_type TEXT NOT NULL,
                file_format TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_accessed TEXT,
                access_count INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL DEFAULT 'local',
                source_url TEXT,
                source_id TEXT,
                vertex_count INTEGER,
                face_count INTEGER,
                material_count INTEGER,
                width INTEGER,
                height INTEGER,
                channels INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(file_type);
            CREATE INDEX IF NOT EXISTS idx_assets_updated ON assets(updated_at);

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE
            );
            CREATE TABLE IF NOT EXISTS asset_tags (
                asset_id TEXT NOT NULL REFERENCES assets(id),
                tag_id INTEGER NOT NULL REFERENCES tags(id),
                PRIMARY KEY (asset_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent_id INTEGER REFERENCES categories(id)
            );
            CREATE TABLE IF NOT EXISTS asset_categories (
                asset_id TEXT NOT NULL REFERENCES assets(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                PRIMARY KEY (asset_id, category_id)
            );
            ",
        )?;
        Ok(())
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
    // Asset Operations
    // ========================================

    /// Insert or update an asset, keyed by its unique file path.
    ///
    /// An update preserves the existing id, `created_at`, `last_accessed` and
    /// `access_count`, and refreshes `updated_at`. Returns the record as
    /// stored.
    pub fn upsert(&self, asset: &Asset) -> Result<(Asset, UpsertOutcome)> {
        let id_lock = self.locks.acquire(&asset.id);
        let _id_guard = id_lock.lock().unwrap_or_else(|e| e.into_inner());

        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;

        let existing: Option<(String, String, Option<String>, u64)> = conn
            .query_row(
                "SELECT id, created_at, last_accessed, access_count
                 FROM assets WHERE file_path = ?1",
                params![asset.file_path],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let (stored, outcome) = match existing {
            Some((id, created_at, last_accessed, access_count)) => {
                conn.execute(
                    "UPDATE assets SET
                        name = ?1, description = ?2, file_size = ?3, file_type = ?4,
                        file_format = ?5, updated_at = ?6, source = ?7, source_url = ?8,
                        source_id = ?9, vertex_count = ?10, face_count = ?11,
                        material_count = ?12, width = ?13, height = ?14, channels = ?15
                     WHERE id = ?16",
                    params![
                        asset.name,
                        asset.description,
                        asset.file_size,
                        asset.file_type.as_str(),
                        asset.file_format,
                        now,
                        asset.source,
                        asset.source_url,
                        asset.source_id,
                        asset.vertex_count,
                        asset.face_count,
                        asset.material_count,
                        asset.width,
                        asset.height,
                        asset.channels,
                        id,
                    ],
                )?;

                let stored = Asset {
                    id,
                    created_at,
                    updated_at: now,
                    last_accessed,
                    access_count,
                    ..asset.clone()
                };
                (stored, UpsertOutcome::Updated)
            }
            None => {
                conn.execute(
                    "INSERT INTO assets (
                        id, name, description, file_path, file_size, file_type,
                        file_format, created_at, updated_at, last_accessed, access_count,
                        source, source_url, source_id, vertex_count, face_count,
                        material_count, width, height, channels
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                               ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                    params![
                        asset.id,
                        asset.name,
                        asset.description,
                        asset.file_path,
                        asset.file_size,
                        asset.file_type.as_str(),
                        asset.file_format,
                        asset.created_at,
                        now,
                        Option::<String>::None,
                        0u64,
                        asset.source,
                        asset.source_url,
                        asset.source_id,
                        asset.vertex_count,
                        asset.face_count,
                        asset.material_count,
                        asset.width,
                        asset.height,
                        asset.channels,
                    ],
                )?;

                let stored = Asset {
                    updated_at: now,
                    last_accessed: None,
                    access_count: 0,
                    ..asset.clone()
                };
                (stored, UpsertOutcome::Inserted)
            }
        };

        debug!("Upserted asset {} ({:?})", stored.id, outcome);
        Ok((stored, outcome))
    }

    /// Get an asset by id.
    pub fn get(&self, id: &str) -> Result<Option<Asset>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?1");
        let result = conn
            .query_row(&sql, params![id], Self::row_to_asset)
            .optional()?;
        Ok(result)
    }

    /// Get an asset by its file path.
    pub fn get_by_path(&self, path: &str) -> Result<Option<Asset>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE file_path = ?1");
        let result = conn
            .query_row(&sql, params![path], Self::row_to_asset)
            .optional()?;
        Ok(result)
    }

    /// Delete an asset and its tag/category associations.
    ///
    /// Returns whether a row was removed. Removal from the search index is
    /// the caller's responsibility; the store has no index dependency.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let id_lock = self.locks.acquire(id);
        let _id_guard = id_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM asset_tags WHERE asset_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM asset_categories WHERE asset_id = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM assets WHERE id = ?1", params![id])?;
        tx.commit()?;

        if removed > 0 {
            debug!("Deleted asset {}", id);
        }
        Ok(removed > 0)
    }

    /// Record an access: bumps `access_count` and stamps `last_accessed`.
    pub fn record_access(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE assets SET access_count = access_count + 1, last_accessed = ?1
             WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(AssetHubError::AssetNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// All assets, ordered by id. Used for full index rebuilds.
    pub fn list_assets(&self) -> Result<Vec<Asset>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_asset)?;

        let mut assets = Vec::new();
        for row in rows {
            assets.push(row?);
        }
        Ok(assets)
    }

    /// All asset ids, ordered.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM assets ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Number of cataloged assets.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: usize = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================
    // Tag Operations
    // ========================================

    /// Associate tags with an asset, creating missing tags. Idempotent; tag
    /// names resolve case-insensitively.
    pub fn assign_tags(&self, asset_id: &str, names: &[String]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        Self::require_asset(&tx, asset_id)?;
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
            let tag_id: i64 = tx.query_row(
                "SELECT id FROM tags WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO asset_tags (asset_id, tag_id) VALUES (?1, ?2)",
                params![asset_id, tag_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Tag names associated with an asset, alphabetical.
    pub fn tags_for(&self, asset_id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN asset_tags at ON at.tag_id = t.id
             WHERE at.asset_id = ?1 ORDER BY t.name",
        )?;
        let rows = stmt.query_map(params![asset_id], |row| row.get(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// All tags, alphabetical.
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    // ========================================
    // Category Operations
    // ========================================

    /// Create a category, optionally under a parent.
    pub fn create_category(&self, name: &str, parent_id: Option<i64>) -> Result<Category> {
        let conn = self.conn()?;
        if let Some(parent) = parent_id {
            Self::require_category(&conn, parent)?;
        }
        conn.execute(
            "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
            params![name, parent_id],
        )?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            parent_id,
        })
    }

    /// Re-parent a category.
    ///
    /// Rejects an assignment that would create a cycle: the new parent must
    /// not be the category itself or any of its descendants. The check runs
    /// here, at write time; reads never repair the hierarchy.
    pub fn set_category_parent(&self, category_id: i64, parent_id: Option<i64>) -> Result<()> {
        let conn = self.conn()?;
        Self::require_category(&conn, category_id)?;

        if let Some(parent) = parent_id {
            Self::require_category(&conn, parent)?;

            // Walk up from the proposed parent; hitting the category itself
            // means the parent is in its subtree.
            let mut current = Some(parent);
            let mut steps: usize = 0;
            while let Some(node) = current {
                if node == category_id {
                    return Err(AssetHubError::CategoryCycle {
                        category_id,
                        parent_id: parent,
                    });
                }
                current = conn
                    .query_row(
                        "SELECT parent_id FROM categories WHERE id = ?1",
                        params![node],
                        |row| row.get::<_, Option<i64>>(0),
                    )
                    .optional()?
                    .flatten();
                steps += 1;
                if steps > 100_000 {
                    return Err(AssetHubError::CategoryCycle {
                        category_id,
                        parent_id: parent,
                    });
                }
            }
        }

        conn.execute(
            "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, category_id],
        )?;
        Ok(())
    }

    /// Associate categories with an asset. Idempotent.
    pub fn assign_categories(&self, asset_id: &str, category_ids: &[i64]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        Self::require_asset(&tx, asset_id)?;
        for &category_id in category_ids {
            Self::require_category(&tx, category_id)?;
            tx.execute(
                "INSERT OR IGNORE INTO asset_categories (asset_id, category_id) VALUES (?1, ?2)",
                params![asset_id, category_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Categories associated with an asset, alphabetical.
    pub fn categories_for(&self, asset_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.parent_id FROM categories c
             JOIN asset_categories ac ON ac.category_id = c.id
             WHERE ac.asset_id = ?1 ORDER BY c.name",
        )?;
        let rows = stmt.query_map(params![asset_id], Self::row_to_category)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// The full category hierarchy with children resolved, roots first,
    /// siblings alphabetical.
    ///
    /// Cycles are rejected when parents are written, so an invariant-breaking
    /// row here means outside interference with the database; it surfaces as
    /// `CategoryCycle` rather than an infinite walk.
    pub fn category_tree(&self) -> Result<Vec<CategoryNode>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, parent_id FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], Self::row_to_category)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        drop(stmt);
        drop(conn);

        let known: HashMap<i64, Option<i64>> =
            categories.iter().map(|c| (c.id, c.parent_id)).collect();

        // Verify every ancestor chain terminates before recursing.
        for category in &categories {
            let mut current = category.parent_id;
            let mut steps = 0usize;
            while let Some(node) = current {
                if node == category.id {
                    return Err(AssetHubError::CategoryCycle {
                        category_id: category.id,
                        parent_id: category.parent_id.unwrap_or(node),
                    });
                }
                current = known.get(&node).copied().flatten();
                steps += 1;
                if steps > categories.len() {
                    return Err(AssetHubError::CategoryCycle {
                        category_id: category.id,
                        parent_id: category.parent_id.unwrap_or(node),
                    });
                }
            }
        }

        let mut children: HashMap<Option<i64>, Vec<Category>> = HashMap::new();
        for category in categories {
            // A parent id pointing at a vanished row degrades to a root.
            let key = category.parent_id.filter(|p| known.contains_key(p));
            children.entry(key).or_default().push(category);
        }

        fn build(children: &HashMap<Option<i64>, Vec<Category>>, parent: Option<i64>) -> Vec<CategoryNode> {
            children
                .get(&parent)
                .map(|cats| {
                    cats.iter()
                        .map(|c| CategoryNode {
                            category: c.clone(),
                            children: build(children, Some(c.id)),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        Ok(build(&children, None))
    }

    // ========================================
    // Row Mapping
    // ========================================

    fn require_asset(conn: &Connection, asset_id: &str) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM assets WHERE id = ?1",
                params![asset_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AssetHubError::AssetNotFound {
                id: asset_id.to_string(),
            });
        }
        Ok(())
    }

    fn require_category(conn: &Connection, category_id: i64) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM categories WHERE id = ?1",
                params![category_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AssetHubError::CategoryNotFound { id: category_id });
        }
        Ok(())
    }

    fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            parent_id: row.get(2)?,
        })
    }

    fn row_to_asset(row: &Row) -> rusqlite::Result<Asset> {
        let kind_str: String = row.get(5)?;
        let file_type = AssetKind::from_str(&kind_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown file type: {kind_str}").into(),
            )
        })?;

        Ok(Asset {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            file_path: row.get(3)?,
            file_size: row.get(4)?,
            file_type,
            file_format: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            last_accessed: row.get(9)?,
            access_count: row.get(10)?,
            source: row.get(11)?,
            source_url: row.get(12)?,
            source_id: row.get(13)?,
            vertex_count: row.get(14)?,
            face_count: row.get(15)?,
            material_count: row.get(16)?,
            width: row.get(17)?,
            height: row.get(18)?,
            channels: row.get(19)?,
        })
    }
}

/// Advisory per-id write locks, handed out on demand.
#[derive(Default)]
struct IdLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdLocks {
    fn acquire(&self, id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(id.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::Asset;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_store() -> (CatalogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CatalogStore::open(temp_dir.path().join("catalog.db")).unwrap();
        (store, temp_dir)
    }

    fn test_asset(path: &str, kind: AssetKind, format: &str) -> Asset {
        Asset::local(&PathBuf::from(path), kind, format, 2048)
    }

    #[test]
    fn test_upsert_then_get() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        let (stored, outcome) = store.upsert(&asset).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let loaded = store.get(&stored.id).unwrap().unwrap();
        assert_eq!(loaded.name, "chair");
        assert_eq!(loaded.file_type, AssetKind::Model);
        assert_eq!(loaded.file_size, 2048);
    }

    #[test]
    fn test_upsert_same_path_updates_in_place() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        let (first, _) = store.upsert(&asset).unwrap();

        let mut rescan = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        rescan.file_size = 4096;
        rescan.vertex_count = Some(812);
        let (second, outcome) = store.upsert(&rescan).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.count().unwrap(), 1);

        let loaded = store.get(&first.id).unwrap().unwrap();
        assert_eq!(loaded.file_size, 4096);
        assert_eq!(loaded.vertex_count, Some(812));
    }

    #[test]
    fn test_upsert_preserves_access_count() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/wood.png", AssetKind::Texture, "png");
        let (stored, _) = store.upsert(&asset).unwrap();

        store.record_access(&stored.id).unwrap();
        store.record_access(&stored.id).unwrap();

        let (after, _) = store.upsert(&asset).unwrap();
        assert_eq!(after.access_count, 2);
        assert!(after.last_accessed.is_some());
    }

    #[test]
    fn test_record_access_missing_asset() {
        let (store, _temp) = create_test_store();
        let err = store.record_access("no-such-id").unwrap_err();
        assert!(matches!(err, AssetHubError::AssetNotFound { .. }));
    }

    #[test]
    fn test_delete_removes_associations() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        let (stored, _) = store.upsert(&asset).unwrap();
        store
            .assign_tags(&stored.id, &["wood".to_string(), "furniture".to_string()])
            .unwrap();

        assert!(store.delete(&stored.id).unwrap());
        assert!(store.get(&stored.id).unwrap().is_none());
        assert!(store.tags_for(&stored.id).unwrap().is_empty());

        // Second delete is a no-op.
        assert!(!store.delete(&stored.id).unwrap());
    }

    #[test]
    fn test_assign_tags_idempotent_case_insensitive() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        let (stored, _) = store.upsert(&asset).unwrap();

        store
            .assign_tags(&stored.id, &["Wood".to_string()])
            .unwrap();
        store
            .assign_tags(&stored.id, &["wood".to_string(), "WOOD".to_string()])
            .unwrap();

        assert_eq!(store.tags_for(&stored.id).unwrap(), vec!["Wood".to_string()]);
        assert_eq!(store.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_assign_tags_unknown_asset() {
        let (store, _temp) = create_test_store();
        let err = store
            .assign_tags("missing", &["wood".to_string()])
            .unwrap_err();
        assert!(matches!(err, AssetHubError::AssetNotFound { .. }));
    }

    #[test]
    fn test_category_tree() {
        let (store, _temp) = create_test_store();

        let furniture = store.create_category("furniture", None).unwrap();
        let chairs = store.create_category("chairs", Some(furniture.id)).unwrap();
        store.create_category("tables", Some(furniture.id)).unwrap();
        store.create_category("office", Some(chairs.id)).unwrap();

        let tree = store.category_tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.name, "furniture");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].category.name, "chairs");
        assert_eq!(tree[0].children[0].children[0].category.name, "office");
    }

    #[test]
    fn test_cycle_rejected_at_write_time() {
        let (store, _temp) = create_test_store();

        let a = store.create_category("a", None).unwrap();
        let b = store.create_category("b", Some(a.id)).unwrap();
        let c = store.create_category("c", Some(b.id)).unwrap();

        // a -> descendant of a
        let err = store.set_category_parent(a.id, Some(c.id)).unwrap_err();
        assert!(matches!(err, AssetHubError::CategoryCycle { .. }));

        // self-parent
        let err = store.set_category_parent(b.id, Some(b.id)).unwrap_err();
        assert!(matches!(err, AssetHubError::CategoryCycle { .. }));

        // Tree still resolves after the rejected writes.
        assert_eq!(store.category_tree().unwrap().len(), 1);

        // Legal re-parent still works.
        store.set_category_parent(c.id, Some(a.id)).unwrap();
    }

    #[test]
    fn test_tree_surfaces_tampered_cycle() {
        let (store, temp) = create_test_store();

        let a = store.create_category("a", None).unwrap();
        let b = store.create_category("b", Some(a.id)).unwrap();

        // A cycle can only appear through outside interference with the
        // database; simulate that with a second connection.
        let conn = Connection::open(temp.path().join("catalog.db")).unwrap();
        conn.execute(
            "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
            params![b.id, a.id],
        )
        .unwrap();

        let err = store.category_tree().unwrap_err();
        assert!(matches!(err, AssetHubError::CategoryCycle { .. }));
    }

    #[test]
    fn test_assign_categories() {
        let (store, _temp) = create_test_store();

        let asset = test_asset("/assets/chair.obj", AssetKind::Model, "obj");
        let (stored, _) = store.upsert(&asset).unwrap();
        let furniture = store.create_category("furniture", None).unwrap();

        store
            .assign_categories(&stored.id, &[furniture.id])
            .unwrap();
        store
            .assign_categories(&stored.id, &[furniture.id])
            .unwrap();

        let cats = store.categories_for(&stored.id).unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].name, "furniture");

        let err = store.assign_categories(&stored.id, &[9999]).unwrap_err();
        assert!(matches!(err, AssetHubError::CategoryNotFound { id: 9999 }));
    }
}
