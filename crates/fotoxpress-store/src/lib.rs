//! FotoXpress Store - concrete gateways for the culling core
//!
//! - `sessions` - SQLite persistence through an r2d2 pool, with a live
//!   session list broadcast after every write
//! - `media` - the device photo library as a directory tree on disk
//! - `config` - database and media locations

pub mod config;
pub mod db;
pub mod error;
pub mod media;
mod schema;
pub mod sessions;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use media::FsMediaGateway;
pub use sessions::SqliteSessionStore;

use std::sync::Arc;

/// Open both gateways described by `config`.
pub fn open(config: &StoreConfig) -> Result<(Arc<SqliteSessionStore>, Arc<FsMediaGateway>)> {
    let sessions = SqliteSessionStore::open(config)?;
    let media = FsMediaGateway::from_config(config)?;
    Ok((Arc::new(sessions), Arc::new(media)))
}
