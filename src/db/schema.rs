//! SQL DDL for all clipvault tables.
//!
//! Defines the `clips` table, the `clips_fts` (FTS5) index with its sync
//! triggers, the `clip_vectors` (vec0) table, tag/note/event tables, the
//! `settings` and `blocklist` tables, and `schema_meta`. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for clipvault's core tables.
const SCHEMA_SQL: &str = r#"
-- Captured clips. Content is immutable once created; only pin state, tag
-- membership, and notes are mutated afterwards.
CREATE TABLE IF NOT EXISTS clips (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    source_app TEXT NOT NULL DEFAULT 'unknown',
    window_title TEXT,
    title TEXT,
    content TEXT NOT NULL,
    hash TEXT NOT NULL UNIQUE,
    lang TEXT NOT NULL DEFAULT 'unk',
    pinned INTEGER NOT NULL DEFAULT 0,
    embedder TEXT NOT NULL DEFAULT 'hash',
    sightings INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_clips_created_at ON clips(created_at);
CREATE INDEX IF NOT EXISTS idx_clips_app ON clips(source_app);
CREATE INDEX IF NOT EXISTS idx_clips_pinned ON clips(pinned);

-- Keyword index (BM25), kept in sync by triggers so eviction and purge
-- cannot leave stale FTS rows behind.
CREATE VIRTUAL TABLE IF NOT EXISTS clips_fts USING fts5(
    content,
    content='clips',
    content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS clips_ai AFTER INSERT ON clips BEGIN
    INSERT INTO clips_fts(rowid, content) VALUES (new.id, new.content);
END;

CREATE TRIGGER IF NOT EXISTS clips_ad AFTER DELETE ON clips BEGIN
    INSERT INTO clips_fts(clips_fts, rowid, content) VALUES('delete', old.id, old.content);
END;

CREATE TRIGGER IF NOT EXISTS clips_au AFTER UPDATE OF content ON clips BEGIN
    INSERT INTO clips_fts(clips_fts, rowid, content) VALUES('delete', old.id, old.content);
    INSERT INTO clips_fts(rowid, content) VALUES (new.id, new.content);
END;

-- Tags (many-to-many)
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS clip_tags (
    clip_id INTEGER NOT NULL REFERENCES clips(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (clip_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_clip_tags_tag ON clip_tags(tag_id);

-- Append-only user annotations
CREATE TABLE IF NOT EXISTS clip_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    clip_id INTEGER NOT NULL REFERENCES clips(id) ON DELETE CASCADE,
    note TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clip_notes_clip ON clip_notes(clip_id);

-- Sighting history. Deliberately no foreign key: events are retained for
-- audit after the clip itself is deleted or evicted.
CREATE TABLE IF NOT EXISTS clip_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    clip_id INTEGER NOT NULL,
    seen_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_clip_events_clip ON clip_events(clip_id);

-- Runtime policy settings, read fresh before each policy decision
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Apps excluded from capture
CREATE TABLE IF NOT EXISTS blocklist (
    app TEXT PRIMARY KEY
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
/// One 128-dim vector per live clip; deleted alongside the clip row.
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS clip_vectors USING vec0(
    clip_id INTEGER PRIMARY KEY,
    embedding FLOAT[128]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for t in [
            "clips",
            "tags",
            "clip_tags",
            "clip_notes",
            "clip_events",
            "settings",
            "blocklist",
            "schema_meta",
        ] {
            assert!(tables.contains(&t.to_string()), "missing table {t}");
        }

        // Virtual tables respond to their extension entry points
        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn fts_triggers_track_insert_and_delete() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO clips (created_at, source_app, content, hash) VALUES ('2026-01-01T00:00:00Z', 'Terminal', 'trigger sync test', 'h1')",
            [],
        )
        .unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM clips_fts WHERE clips_fts MATCH 'trigger'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);

        conn.execute("DELETE FROM clips WHERE hash = 'h1'", []).unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM clips_fts WHERE clips_fts MATCH 'trigger'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hits, 0);
    }
}
