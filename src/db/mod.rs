use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::sizing::TradeRecord;

/// Thread-safe SQLite trade journal (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `:memory:` gives a throwaway journal.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("trade journal connection poisoned"))
    }

    // ── Trades ────────────────────────────────────────────────────────────────

    /// Append a trade record to the journal
    pub fn insert_trade(&self, trade: &TradeRecord) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO trades (id, outcome, timestamp) VALUES (?1, ?2, ?3)",
            params![trade.id, trade.outcome, trade.timestamp],
        )?;
        Ok(())
    }

    /// All trades in insertion order
    pub fn list_trades(&self) -> Result<Vec<TradeRecord>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, outcome, timestamp FROM trades ORDER BY seq ASC")?;
        let trades = stmt
            .query_map([], map_trade)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(trades)
    }

    /// Delete one trade; returns whether it existed
    pub fn delete_trade(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM trades WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Delete every trade; returns how many were removed
    pub fn clear_trades(&self) -> Result<usize> {
        let removed = self.conn()?.execute("DELETE FROM trades", [])?;
        Ok(removed)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_trade(row: &rusqlite::Row) -> rusqlite::Result<TradeRecord> {
    Ok(TradeRecord {
        id: row.get(0)?,
        outcome: row.get(1)?,
        timestamp: row.get(2)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS trades (
    seq       INTEGER PRIMARY KEY AUTOINCREMENT,
    id        TEXT    NOT NULL UNIQUE,
    outcome   REAL    NOT NULL,
    timestamp TEXT    NOT NULL
);
"#;
