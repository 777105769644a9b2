//! Vault status snapshot with backpressure warnings.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use super::{settings, store, Result};

/// Warn when the database reaches this fraction of its size cap.
const SIZE_WARN_FRACTION: f64 = 0.8;
/// Warn when the clip count reaches this fraction of the count cap.
const COUNT_WARN_FRACTION: f64 = 0.9;

/// Everything `status` reports, serializable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub paused: bool,
    pub clip_count: u64,
    pub pinned_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_capture: Option<String>,
    pub db_size_bytes: u64,
    pub max_db_mb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_cap: Option<u64>,
    pub evict_mode: String,
    pub embedder: String,
    pub allow_secrets: bool,
    pub notify: bool,
    pub blocklist_size: usize,
    /// Non-fatal conditions worth surfacing: nearing a cap, etc.
    pub warnings: Vec<String>,
}

/// Gather the current vault state and derive warnings. Reads live settings,
/// so it reflects any `set` that happened since startup.
pub fn status(conn: &Connection, db_path: Option<&std::path::Path>) -> Result<StatusSnapshot> {
    let clip_count = store::clip_count(conn)?;
    let pinned_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM clips WHERE pinned = 1", [], |r| r.get(0))?;
    let latest_capture: Option<String> = conn
        .query_row("SELECT MAX(created_at) FROM clips", [], |r| r.get(0))
        .optional()?
        .flatten();

    let db_size_bytes = store::db_size_bytes(db_path);
    let max_db_mb = settings::max_db_mb(conn)?;
    let count_cap = settings::count_cap(conn)?;

    let mut warnings = Vec::new();
    let cap_bytes = max_db_mb * 1024 * 1024;
    if cap_bytes > 0 && db_size_bytes as f64 >= cap_bytes as f64 * SIZE_WARN_FRACTION {
        warnings.push(format!(
            "database at {} of its {max_db_mb} MB cap; eviction will engage soon",
            human_fraction(db_size_bytes, cap_bytes)
        ));
    }
    if let Some(cap) = count_cap {
        if cap > 0 && clip_count as f64 >= cap as f64 * COUNT_WARN_FRACTION {
            warnings.push(format!(
                "clip count {clip_count} is at {} of the {cap} cap",
                human_fraction(clip_count, cap)
            ));
        }
    }

    Ok(StatusSnapshot {
        paused: settings::is_paused(conn)?,
        clip_count,
        pinned_count: pinned_count as u64,
        latest_capture,
        db_size_bytes,
        max_db_mb,
        count_cap,
        evict_mode: settings::evict_mode(conn)?.to_string(),
        embedder: settings::embedder_kind(conn)?.to_string(),
        allow_secrets: settings::allow_secrets(conn)?,
        notify: settings::notify_enabled(conn)?,
        blocklist_size: settings::blocklist(conn)?.len(),
        warnings,
    })
}

fn human_fraction(current: u64, cap: u64) -> String {
    format!("{:.0}%", current as f64 / cap as f64 * 100.0)
}
