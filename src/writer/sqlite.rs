use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};
use std::path::Path;

use super::schema_gen::{generate_create_table, generate_indexes, quote};
use crate::schema::TableSchema;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn new(db_path: &Path) -> Result<Self> {
        // Remove existing database if present
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path)
            .context("Failed to create database")?;

        Self::configure(conn)
    }

    /// Writer over a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // Enable foreign keys and optimize for bulk insert
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;"
        )?;

        Ok(Self { conn })
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        tracing::debug!("Creating {} tables", schemas.len());

        for schema in schemas {
            let sql = generate_create_table(schema);
            self.conn.execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Open the single transaction an import runs in
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction()
            .context("Failed to begin transaction")
    }

    pub fn count_rows(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count as u64)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Finalize the database
    pub fn finalize(self) -> Result<()> {
        tracing::debug!("Finalizing database");
        self.conn.execute_batch("PRAGMA optimize;")?;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")?;
        Ok(())
    }
}

/// Insert one row through the connection's statement cache
pub fn insert_row(conn: &Connection, sql: &str, values: &[SqlValue]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;

    for (idx, value) in values.iter().enumerate() {
        value.bind_to(idx + 1, &mut stmt)?;
    }
    stmt.raw_execute()?;

    Ok(())
}

/// Delete a database file together with its WAL side files
pub fn remove_database(db_path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = db_path.as_os_str().to_owned();
        path.push(suffix);
        let path = Path::new(&path);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {:?}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{MAP, PLATFORM};
    use crate::writer::schema_gen::generate_insert;

    #[test]
    fn test_insert_and_count() {
        let mut writer = SqliteWriter::in_memory().unwrap();
        writer.create_tables(&[&PLATFORM, &MAP]).unwrap();

        let sql = generate_insert("platform", &["platform_id", "name"]);
        let tx = writer.transaction().unwrap();
        insert_row(&tx, &sql, &[SqlValue::Integer(1), SqlValue::Text("PC".into())]).unwrap();
        insert_row(&tx, &sql, &[SqlValue::Integer(2), SqlValue::Text("PS4".into())]).unwrap();
        tx.commit().unwrap();

        assert_eq!(writer.count_rows("platform").unwrap(), 2);
        assert_eq!(writer.count_rows("map").unwrap(), 0);
    }

    #[test]
    fn test_not_null_is_enforced() {
        let mut writer = SqliteWriter::in_memory().unwrap();
        writer.create_tables(&[&PLATFORM]).unwrap();

        let sql = generate_insert("platform", &["platform_id", "name"]);
        let tx = writer.transaction().unwrap();
        let result = insert_row(&tx, &sql, &[SqlValue::Integer(1), SqlValue::Null]);
        assert!(result.is_err());
    }

    #[test]
    fn test_uncommitted_transaction_leaves_nothing() {
        let mut writer = SqliteWriter::in_memory().unwrap();
        writer.create_tables(&[&PLATFORM]).unwrap();

        let sql = generate_insert("platform", &["platform_id", "name"]);
        {
            let tx = writer.transaction().unwrap();
            insert_row(&tx, &sql, &[SqlValue::Integer(1), SqlValue::Text("PC".into())]).unwrap();
        }

        assert_eq!(writer.count_rows("platform").unwrap(), 0);
    }
}
