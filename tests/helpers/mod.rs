#![allow(dead_code)]

use clipvault::capture::{NullNotifier, RawEvent};
use clipvault::clip::store::{self, NewClip};
use clipvault::config::EmbeddingConfig;
use clipvault::db;
use clipvault::embedding::{ProviderRegistry, EMBEDDING_DIM};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// A registry whose model cache points nowhere, so the model provider always
/// falls back to the hash embedder.
pub fn hash_registry() -> ProviderRegistry {
    ProviderRegistry::new(EmbeddingConfig {
        model: "e5-small-v2".into(),
        cache_dir: "/nonexistent/model/dir".into(),
    })
}

/// Deterministic 128-dim embedding with a spike at position `seed`. Distinct
/// seeds give orthogonal vectors.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed as usize % EMBEDDING_DIM] = 1.0;
    v
}

/// Insert a clip directly via the store module, bypassing classification.
pub fn insert_clip(conn: &mut Connection, content: &str, app: &str, embedding: &[f32]) -> i64 {
    store::insert_clip(
        conn,
        &NewClip {
            content,
            source_app: app,
            window_title: None,
            lang: "unk",
            embedder: "hash",
        },
        embedding,
    )
    .unwrap()
}

/// A clipboard event for the capture pipeline.
pub fn event(content: &str, app: &str) -> RawEvent {
    RawEvent {
        content: content.into(),
        source_app: app.into(),
        window_title: None,
    }
}

/// Run one event through the full capture pipeline.
pub fn capture_one(
    conn: &mut Connection,
    registry: &ProviderRegistry,
    content: &str,
    app: &str,
) -> clipvault::clip::types::CaptureOutcome {
    clipvault::capture::capture(conn, registry, &event(content, app), None, &NullNotifier)
        .unwrap()
}
