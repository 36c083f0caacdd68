pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open local store")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("failed to set local store pragmas")?;

    let applied = migrations::run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(applied, path, "local store migrated");
    }

    Ok(conn)
}

pub type Store = Arc<Mutex<Connection>>;

/// Single execution context; a poisoned lock still holds a usable connection.
pub fn lock(store: &Store) -> MutexGuard<'_, Connection> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
