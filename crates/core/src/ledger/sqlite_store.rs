//! SQLite-backed ledger store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{LedgerError, LedgerStore};

/// Stores the ledger as rows of `(position, item_id)`.
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Open (or create) the database file.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_entries (
                position INTEGER PRIMARY KEY,
                item_id TEXT NOT NULL UNIQUE
            );
            "#,
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<Option<Vec<String>>, LedgerError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let mut stmt = conn
            .prepare("SELECT item_id FROM ledger_entries ORDER BY position")
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| LedgerError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(Some(ids))
    }

    fn save(&self, ids: &[String]) -> Result<(), LedgerError> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let tx = conn
            .transaction()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        tx.execute("DELETE FROM ledger_entries", [])
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        {
            let mut insert = tx
                .prepare("INSERT INTO ledger_entries (position, item_id) VALUES (?, ?)")
                .map_err(|e| LedgerError::Database(e.to_string()))?;
            for (position, id) in ids.iter().enumerate() {
                insert
                    .execute(params![position as i64, id])
                    .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
        }
        tx.commit()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}
