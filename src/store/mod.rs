//! Key-value persistence for license records and their indexes.
//!
//! Consistency contract assumed by `LicenseService`:
//! - a single caller reads its own writes on the same key;
//! - nothing is atomic across keys;
//! - there is no compare-and-swap.
//!
//! License records and the `email:` / `device:` index entries share one flat
//! namespace.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StorePool, create_pool, init_store_schema};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt record under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait LicenseStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or overwrite.
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Every key in the namespace, index entries included.
    fn list(&self) -> StoreResult<Vec<String>>;
}
