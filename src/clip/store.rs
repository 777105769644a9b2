//! Clip persistence: the transactional write path, sighting bookkeeping,
//! pin/note mutations, and deletion.
//!
//! Every persisted clip occupies three places at once — a `clips` row, a
//! `clips_fts` entry (via trigger), and a `clip_vectors` row — and all writes
//! that touch more than one happen inside a single transaction so the three
//! can never disagree.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use super::types::Clip;
use super::{embedding_to_bytes, ClipError, Result};
use crate::embedding::EMBEDDING_DIM;

/// SHA-256 hex digest of clip content. The dedup identity.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Look up a live clip by content hash.
pub fn find_by_hash(conn: &Connection, hash: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM clips WHERE hash = ?1", [hash], |r| r.get(0))
        .optional()?;
    Ok(id)
}

/// Fields for a new clip. Timestamps and hash are computed at insert.
#[derive(Debug, Clone)]
pub struct NewClip<'a> {
    pub content: &'a str,
    pub source_app: &'a str,
    pub window_title: Option<&'a str>,
    pub lang: &'a str,
    pub embedder: &'a str,
}

/// First line of content, truncated, as the display title.
pub fn derive_title(content: &str) -> String {
    let first = content.lines().next().unwrap_or("").trim();
    first.chars().take(120).collect()
}

/// Insert a new clip, its vector, and its first sighting event in one
/// transaction. The FTS row follows via trigger. Returns the new id, or
/// [`ClipError::DuplicateContent`] if the hash is already live.
pub fn insert_clip(conn: &mut Connection, new: &NewClip, embedding: &[f32]) -> Result<i64> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(ClipError::Embedding(format!(
            "expected {EMBEDDING_DIM} dimensions, got {}",
            embedding.len()
        )));
    }

    let hash = content_hash(new.content);
    if let Some(existing) = find_by_hash(conn, &hash)? {
        return Err(ClipError::DuplicateContent(existing));
    }

    let now = Utc::now().to_rfc3339();
    let title = derive_title(new.content);

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO clips (created_at, source_app, window_title, title, content, hash, lang, embedder)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            now,
            new.source_app,
            new.window_title,
            title,
            new.content,
            hash,
            new.lang,
            new.embedder
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO clip_vectors (clip_id, embedding) VALUES (?1, ?2)",
        params![id, embedding_to_bytes(embedding)],
    )?;

    tx.execute(
        "INSERT INTO clip_events (clip_id, seen_at) VALUES (?1, ?2)",
        params![id, now],
    )?;

    tx.commit()?;
    tracing::debug!(id, app = new.source_app, "clip stored");
    Ok(id)
}

/// Record another sighting of an existing clip: bump the counter and append
/// an event row. Content stays untouched.
pub fn record_sighting(conn: &Connection, id: i64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let updated = conn.execute(
        "UPDATE clips SET sightings = sightings + 1 WHERE id = ?1",
        [id],
    )?;
    if updated == 0 {
        return Err(ClipError::NotFound(id));
    }
    conn.execute(
        "INSERT INTO clip_events (clip_id, seen_at) VALUES (?1, ?2)",
        params![id, now],
    )?;
    Ok(())
}

/// Fetch a full clip by id, tags included.
pub fn fetch_clip(conn: &Connection, id: i64) -> Result<Clip> {
    let mut clip = conn
        .query_row(
            "SELECT id, created_at, source_app, window_title, title, content, hash, lang,
                    pinned, embedder, sightings
             FROM clips WHERE id = ?1",
            [id],
            |r| {
                Ok(Clip {
                    id: r.get(0)?,
                    created_at: r.get(1)?,
                    source_app: r.get(2)?,
                    window_title: r.get(3)?,
                    title: r.get(4)?,
                    content: r.get(5)?,
                    hash: r.get(6)?,
                    lang: r.get(7)?,
                    pinned: r.get::<_, i64>(8)? != 0,
                    embedder: r.get(9)?,
                    sightings: r.get(10)?,
                    tags: vec![],
                })
            },
        )
        .optional()?
        .ok_or(ClipError::NotFound(id))?;

    clip.tags = super::tags::tags_for_clip(conn, id)?;
    Ok(clip)
}

/// Pin or unpin a clip.
pub fn set_pinned(conn: &Connection, id: i64, pinned: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE clips SET pinned = ?1 WHERE id = ?2",
        params![pinned as i64, id],
    )?;
    if updated == 0 {
        return Err(ClipError::NotFound(id));
    }
    Ok(())
}

/// Append a free-text note to a clip.
pub fn append_note(conn: &Connection, id: i64, note: &str) -> Result<()> {
    if note.trim().is_empty() {
        return Err(ClipError::InvalidInput("note is empty".into()));
    }
    let exists: bool = conn
        .query_row("SELECT 1 FROM clips WHERE id = ?1", [id], |_| Ok(true))
        .optional()?
        .unwrap_or(false);
    if !exists {
        return Err(ClipError::NotFound(id));
    }
    conn.execute(
        "INSERT INTO clip_notes (clip_id, note, created_at) VALUES (?1, ?2, ?3)",
        params![id, note, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Notes for one clip, oldest first.
pub fn notes_for_clip(conn: &Connection, id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT note FROM clip_notes WHERE clip_id = ?1 ORDER BY created_at, id",
    )?;
    let notes = stmt
        .query_map([id], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(notes)
}

/// Sighting timestamps for a clip, newest first. Survives clip deletion, so
/// this accepts ids that no longer resolve to a live clip.
pub fn history(conn: &Connection, id: i64, limit: usize) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT seen_at FROM clip_events WHERE clip_id = ?1 ORDER BY seen_at DESC, id DESC LIMIT ?2",
    )?;
    let events = stmt
        .query_map(params![id, limit as i64], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Hard-delete one clip. Removes the vector row explicitly (vec0 tables have
/// no triggers), lets the FTS trigger and tag/note cascades handle the rest.
/// Sighting events are retained for audit.
pub fn delete_clip(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM clip_vectors WHERE clip_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM clips WHERE id = ?1", [id])?;
    tx.commit()?;
    if deleted == 0 {
        return Err(ClipError::NotFound(id));
    }
    tracing::debug!(id, "clip deleted");
    Ok(())
}

/// Delete a set of clips by id in one transaction. Returns the count removed.
pub fn delete_clips(conn: &mut Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    let mut removed = 0;
    for &id in ids {
        tx.execute("DELETE FROM clip_vectors WHERE clip_id = ?1", [id])?;
        removed += tx.execute("DELETE FROM clips WHERE id = ?1", [id])?;
    }
    tx.commit()?;
    Ok(removed)
}

/// Selection criteria for bulk purge. All set criteria must match.
#[derive(Debug, Clone, Default)]
pub struct PurgeFilter<'a> {
    pub app: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub older_than_days: Option<u32>,
    /// Keep the N most recent matching clips, purge the rest.
    pub keep_last: Option<u64>,
    /// Purge everything, including pins, and clear the event log.
    pub all: bool,
}

/// Bulk-delete clips matching the given criteria. Returns the number removed.
pub fn purge(conn: &mut Connection, filter: &PurgeFilter) -> Result<usize> {
    if filter.all {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM clip_vectors", [])?;
        let removed = tx.execute("DELETE FROM clips", [])?;
        tx.execute("DELETE FROM clip_events", [])?;
        tx.commit()?;
        tracing::info!(removed, "store purged");
        return Ok(removed);
    }

    let mut sql = String::from("SELECT c.id FROM clips c WHERE 1=1");
    let mut bindings: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(app) = filter.app {
        sql.push_str(" AND LOWER(c.source_app) = LOWER(?)");
        bindings.push(Box::new(app.to_string()));
    }
    if let Some(tag) = filter.tag {
        sql.push_str(
            " AND c.id IN (SELECT ct.clip_id FROM clip_tags ct
               JOIN tags t ON t.id = ct.tag_id WHERE t.name = LOWER(?))",
        );
        bindings.push(Box::new(tag.to_string()));
    }
    if let Some(days) = filter.older_than_days {
        let cutoff = (Utc::now() - chrono::Duration::days(days as i64)).to_rfc3339();
        sql.push_str(" AND c.created_at < ?");
        bindings.push(Box::new(cutoff));
    }

    sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

    let params: Vec<&dyn rusqlite::types::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut ids: Vec<i64> = stmt
        .query_map(params.as_slice(), |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    if let Some(keep) = filter.keep_last {
        // Ordering is newest-first, so the survivors are the head.
        ids = ids.split_off((keep as usize).min(ids.len()));
    }

    let removed = delete_clips(conn, &ids)?;
    if removed > 0 {
        tracing::info!(removed, "clips purged");
    }
    Ok(removed)
}

/// Total number of live clips.
pub fn clip_count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM clips", [], |r| r.get(0))?;
    Ok(n as u64)
}

/// On-disk database size in bytes. Zero for in-memory databases.
pub fn db_size_bytes(db_path: Option<&std::path::Path>) -> u64 {
    db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0)
}
