use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};

use super::{LicenseStore, StoreResult};
use crate::clock::{Clock, SystemClock};

pub type StorePool = Pool<SqliteConnectionManager>;

pub fn create_pool(database_path: &str) -> Result<StorePool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}

/// Initialize the key-value table.
pub fn init_store_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;

        -- Flat namespace: license records under PAKT-* keys,
        -- secondary indexes under email:* and device:*
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
}

/// SQLite-backed store. Each call is its own statement; no transaction spans
/// calls, so callers get exactly the per-key guarantees of `LicenseStore`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: StorePool,
    /// Stamps `updated_at`
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    pub fn new(pool: StorePool) -> StoreResult<Self> {
        {
            let conn = pool.get()?;
            init_store_schema(&conn)?;
        }
        Ok(Self {
            pool,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn open(database_path: &str) -> StoreResult<Self> {
        Self::new(create_pool(database_path)?)
    }
}

impl LicenseStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.pool.get()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, self.clock.now().timestamp()],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}
