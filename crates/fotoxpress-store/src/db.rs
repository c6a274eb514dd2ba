use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;
use crate::schema;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (or create) the session database at `path` and run migrations.
pub fn open_pool(path: &Path) -> Result<DbPool> {
    log::info!("Database path: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(enable_foreign_keys);
    let pool = r2d2::Pool::new(manager)?;
    run_migrations(&pool.get()?)?;
    Ok(pool)
}

/// A private in-memory database.
///
/// Every SQLite memory connection is its own database, so the pool holds
/// exactly one connection and never recycles it.
pub fn open_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)?;
    run_migrations(&pool.get()?)?;
    Ok(pool)
}

fn enable_foreign_keys(connection: &mut Connection) -> rusqlite::Result<()> {
    // Cascading session deletes depend on this
    connection.execute_batch("PRAGMA foreign_keys = ON;")
}

fn run_migrations(connection: &DbConnection) -> Result<()> {
    let connection: &Connection = connection;

    log::debug!("Running database migrations...");
    connection.execute_batch(schema::MIGRATION_0001)?;
    Ok(())
}
