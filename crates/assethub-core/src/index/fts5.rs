//! FTS5 virtual table setup for the search index.
//!
//! The `asset_search` table shadows `documents` through triggers, so text
//! search stays in sync with every document write without separate
//! bookkeeping. Ranking is configured once as a weighted bm25 over
//! (id, name, description, tags, categories).

use crate::config::IndexConfig;
use rusqlite::Connection;
use tracing::{debug, info};

/// Configuration for the FTS5 table.
#[derive(Debug, Clone)]
pub struct FtsConfig {
    /// Name of the FTS5 virtual table.
    pub table_name: String,
    /// Tokenizer configuration: case-folding, split on non-alphanumeric.
    pub tokenizer: String,
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            table_name: "asset_search".to_string(),
            tokenizer: "unicode61 remove_diacritics 1".to_string(),
        }
    }
}

/// Manager for FTS5 setup and maintenance.
pub struct FtsManager<'a> {
    config: &'a FtsConfig,
}

impl<'a> FtsManager<'a> {
    pub fn new(config: &'a FtsConfig) -> Self {
        Self { config }
    }

    /// Check if the FTS5 table exists.
    pub fn table_exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.config.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Ensure the FTS5 table, rank configuration and triggers exist.
    pub fn ensure_setup(&self, conn: &Connection) -> rusqlite::Result<()> {
        if !self.table_exists(conn)? {
            self.create_table(conn)?;
            self.populate_from_documents(conn)?;
        }
        self.create_triggers(conn)?;
        Ok(())
    }

    /// Create the FTS5 virtual table and persist the weighted rank function.
    pub fn create_table(&self, conn: &Connection) -> rusqlite::Result<()> {
        let sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
                id,
                name,
                description,
                tags,
                categories,
                tokenize='{}'
            )",
            self.config.table_name, self.config.tokenizer
        );
        conn.execute(&sql, [])?;

        let weights = IndexConfig::BM25_WEIGHTS
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!(
                "INSERT INTO {}({}, rank) VALUES('rank', ?1)",
                self.config.table_name, self.config.table_name
            ),
            [format!("bm25({weights})")],
        )?;

        info!("Created FTS5 table: {}", self.config.table_name);
        Ok(())
    }

    /// Create triggers to keep FTS5 in sync with the documents table.
    pub fn create_triggers(&self, conn: &Connection) -> rusqlite::Result<()> {
        let table = &self.config.table_name;

        let insert_trigger = format!(
            "CREATE TRIGGER IF NOT EXISTS {}_ai AFTER INSERT ON documents BEGIN
                INSERT INTO {} (id, name, description, tags, categories) VALUES (
                    NEW.id,
                    NEW.name,
                    NEW.description,
                    (SELECT GROUP_CONCAT(value, ' ') FROM json_each(NEW.tags_json)),
                    (SELECT GROUP_CONCAT(value, ' ') FROM json_each(NEW.categories_json))
                );
            END",
            table, table
        );
        conn.execute(&insert_trigger, [])?;

        let update_trigger = format!(
            "CREATE TRIGGER IF NOT EXISTS {}_au AFTER UPDATE ON documents BEGIN
                DELETE FROM {} WHERE id = OLD.id;
                INSERT INTO {} (id, name, description, tags, categories) VALUES (
                    NEW.id,
                    NEW.name,
                    NEW.description,
                    (SELECT GROUP_CONCAT(value, ' ') FROM json_each(NEW.tags_json)),
                    (SELECT GROUP_CONCAT(value, ' ') FROM json_each(NEW.categories_json))
                );
            END",
            table, table, table
        );
        conn.execute(&update_trigger, [])?;

        let delete_trigger = format!(
            "CREATE TRIGGER IF NOT EXISTS {}_ad AFTER DELETE ON documents BEGIN
                DELETE FROM {} WHERE id = OLD.id;
            END",
            table, table
        );
        conn.execute(&delete_trigger, [])?;

        debug!("Created FTS5 triggers for {}", table);
        Ok(())
    }

    /// Repopulate FTS5 from the documents table.
    pub fn populate_from_documents(&self, conn: &Connection) -> rusqlite::Result<()> {
        let table = &self.config.table_name;

        conn.execute_batch(&format!("DELETE FROM {};", table))?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, name, description, tags, categories)
                 SELECT
                     id,
                     name,
                     description,
                     (SELECT GROUP_CONCAT(value, ' ') FROM json_each(tags_json)),
                     (SELECT GROUP_CONCAT(value, ' ') FROM json_each(categories_json))
                 FROM documents",
                table
            ),
            [],
        )?;

        info!("Populated FTS5 table from documents");
        Ok(())
    }
}
