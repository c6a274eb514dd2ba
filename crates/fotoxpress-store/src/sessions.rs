//! SQLite-backed session persistence.
//!
//! Every write refreshes a `watch` channel holding the session list, so the
//! home screen stays current without polling.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use fotoxpress_core::model::SessionPhoto;
use fotoxpress_core::{
    Decision, GatewayError, PersistenceGateway, Photo, PhotoId, Session, SessionId,
    SessionProgress,
};
use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::db::{self, DbPool};
use crate::error::{Result, StoreError};

pub struct SqliteSessionStore {
    pool: DbPool,
    sessions_tx: watch::Sender<Vec<SessionProgress>>,
}

impl SqliteSessionStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        Self::open_path(&config.database_path)
    }

    pub fn open_path(path: &Path) -> Result<Self> {
        Self::from_pool(db::open_pool(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_pool(db::open_memory_pool()?)
    }

    fn from_pool(pool: DbPool) -> Result<Self> {
        let initial = query_progress(&pool)?;
        let (sessions_tx, _) = watch::channel(initial);
        Ok(Self { pool, sessions_tx })
    }

    /// Create a session and its photo rows in one transaction.
    pub fn insert_session(&self, name: &str, locators: &[String]) -> Result<SessionId> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO sessions (name, created_at, photo_count, finalized) VALUES (?1, ?2, ?3, 0)",
            params![name, Utc::now().timestamp_millis(), locators.len() as i64],
        )?;
        let session_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO session_photos (session_id, locator, rotation, decision, sequence)
                 VALUES (?1, ?2, 0.0, ?3, ?4)",
            )?;
            for (sequence, locator) in locators.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    locator,
                    Decision::Undecided.as_str(),
                    sequence as i64
                ])?;
            }
        }

        tx.commit()?;
        log::info!(
            "Inserted session {} \"{}\" with {} photos",
            session_id,
            name,
            locators.len()
        );
        Ok(session_id)
    }

    /// Full photo rows of a session, ordered by sequence.
    pub fn session_photos(&self, session_id: SessionId) -> Result<Vec<SessionPhoto>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, locator, rotation, decision, sequence
             FROM session_photos WHERE session_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt.query_map(params![session_id], session_photo_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_rotation(&self, photo_id: PhotoId, rotation: f64) -> Result<()> {
        self.update_photo(
            "UPDATE session_photos SET rotation = ?1 WHERE id = ?2",
            params![rotation, photo_id],
            photo_id,
        )
    }

    pub fn set_decision(&self, photo_id: PhotoId, decision: Decision) -> Result<()> {
        self.update_photo(
            "UPDATE session_photos SET decision = ?1 WHERE id = ?2",
            params![decision.as_str(), photo_id],
            photo_id,
        )
    }

    /// Delete a session; its photos go with it.
    pub fn remove_session(&self, session_id: SessionId) -> Result<()> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        log::info!("Deleted session {} ({} rows)", session_id, removed);
        Ok(())
    }

    pub fn progress(&self) -> Result<Vec<SessionProgress>> {
        query_progress(&self.pool)
    }

    pub fn locators_in_use(&self) -> Result<HashSet<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT DISTINCT locator FROM session_photos")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<HashSet<_>>>()?)
    }

    pub fn session(&self, session_id: SessionId) -> Result<Option<Session>> {
        let conn = self.pool.get()?;
        let session = conn
            .query_row(
                "SELECT id, name, created_at, photo_count, finalized FROM sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok(Session {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                        photo_count: row.get(3)?,
                        finalized: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    pub fn finalize(&self, session_id: SessionId) -> Result<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE sessions SET finalized = 1 WHERE id = ?1",
            params![session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("session {}", session_id)));
        }
        Ok(())
    }

    fn update_photo(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        photo_id: PhotoId,
    ) -> Result<()> {
        let conn = self.pool.get()?;
        if conn.execute(sql, params)? == 0 {
            return Err(StoreError::NotFound(format!("photo {}", photo_id)));
        }
        Ok(())
    }

    /// Push the current session list to watchers.
    fn refresh(&self) {
        match query_progress(&self.pool) {
            Ok(list) => {
                self.sessions_tx.send_replace(list);
            }
            Err(e) => log::warn!("Failed to refresh session list: {}", e),
        }
    }

    /// Run a write, then refresh watchers when it succeeded.
    fn write<T>(&self, op: impl FnOnce(&Self) -> Result<T>) -> std::result::Result<T, GatewayError> {
        let value = op(self)?;
        self.refresh();
        Ok(value)
    }
}

fn session_photo_from_row(row: &Row<'_>) -> rusqlite::Result<SessionPhoto> {
    let decision: String = row.get(4)?;
    Ok(SessionPhoto {
        id: row.get(0)?,
        session_id: row.get(1)?,
        locator: row.get(2)?,
        rotation: row.get(3)?,
        decision: Decision::from(decision.as_str()),
        sequence: row.get(5)?,
    })
}

fn query_progress(pool: &DbPool) -> Result<Vec<SessionProgress>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.created_at, s.finalized,
                (SELECT COUNT(*) FROM session_photos p WHERE p.session_id = s.id),
                (SELECT COUNT(*) FROM session_photos p
                  WHERE p.session_id = s.id AND p.decision != 'undecided')
         FROM sessions s
         ORDER BY s.created_at DESC, s.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SessionProgress {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
            finalized: row.get(3)?,
            total_count: row.get(4)?,
            edited_count: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

impl PersistenceGateway for SqliteSessionStore {
    fn create_session(
        &self,
        name: &str,
        locators: &[String],
    ) -> std::result::Result<SessionId, GatewayError> {
        self.write(|store| store.insert_session(name, locators))
    }

    fn load_session_photos(
        &self,
        session_id: SessionId,
    ) -> std::result::Result<Vec<Photo>, GatewayError> {
        let rows = self.session_photos(session_id)?;
        Ok(rows.iter().map(SessionPhoto::to_photo).collect())
    }

    fn update_photo_rotation(
        &self,
        photo_id: PhotoId,
        rotation: f64,
    ) -> std::result::Result<(), GatewayError> {
        self.write(|store| store.set_rotation(photo_id, rotation))
    }

    fn update_photo_decision(
        &self,
        photo_id: PhotoId,
        decision: Decision,
    ) -> std::result::Result<(), GatewayError> {
        self.write(|store| store.set_decision(photo_id, decision))
    }

    fn delete_session(&self, session_id: SessionId) -> std::result::Result<(), GatewayError> {
        self.write(|store| store.remove_session(session_id))
    }

    fn list_sessions_with_progress(
        &self,
    ) -> std::result::Result<Vec<SessionProgress>, GatewayError> {
        Ok(self.progress()?)
    }

    fn watch_sessions_with_progress(&self) -> watch::Receiver<Vec<SessionProgress>> {
        self.sessions_tx.subscribe()
    }

    fn used_locators(&self) -> std::result::Result<HashSet<String>, GatewayError> {
        Ok(self.locators_in_use()?)
    }

    fn find_session(
        &self,
        session_id: SessionId,
    ) -> std::result::Result<Option<Session>, GatewayError> {
        Ok(self.session(session_id)?)
    }

    fn mark_session_finalized(&self, session_id: SessionId) -> std::result::Result<(), GatewayError> {
        self.write(|store| store.finalize(session_id))
    }
}
