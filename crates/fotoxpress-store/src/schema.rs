/// MIGRATION 0001: sessions and their photos.
pub const MIGRATION_0001: &str = r#"
-- Sessions: one culling batch each.
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL, -- unix ms
    photo_count INTEGER NOT NULL DEFAULT 0,
    finalized INTEGER NOT NULL DEFAULT 0
);

-- Session photos: one row per selected photo, owned by its session.
CREATE TABLE IF NOT EXISTS session_photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    locator TEXT NOT NULL,
    rotation REAL NOT NULL DEFAULT 0,
    decision TEXT NOT NULL DEFAULT 'undecided', -- 'undecided' | 'keep' | 'discard'
    sequence INTEGER NOT NULL,
    FOREIGN KEY (session_id) REFERENCES sessions (id) ON DELETE CASCADE,
    UNIQUE (session_id, sequence)
);

CREATE INDEX IF NOT EXISTS idx_session_photos_session ON session_photos (session_id);
CREATE INDEX IF NOT EXISTS idx_session_photos_locator ON session_photos (locator);
CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions (created_at);
"#;
