//! Runtime policy settings stored in the database.
//!
//! Policy lives in the `settings` table (not the config file) so that `set`
//! commands take effect for an already-running watcher: every policy decision
//! reads the current values fresh rather than caching them at startup.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::types::EvictMode;
use super::Result;
use crate::embedding::EmbedderKind;

/// Default capture size limit in bytes.
pub const DEFAULT_MAX_BYTES: usize = 16384;
/// Default database size cap in megabytes.
pub const DEFAULT_MAX_DB_MB: u64 = 512;

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn delete_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
    Ok(())
}

/// All settings as key-value pairs, for `settings list`.
pub fn list_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn get_bool(conn: &Connection, key: &str, default: bool) -> Result<bool> {
    Ok(get_setting(conn, key)?
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default))
}

fn get_u64(conn: &Connection, key: &str, default: u64) -> Result<u64> {
    Ok(get_setting(conn, key)?
        .and_then(|v| v.parse().ok())
        .unwrap_or(default))
}

pub fn max_bytes(conn: &Connection) -> Result<usize> {
    Ok(get_u64(conn, "max_bytes", DEFAULT_MAX_BYTES as u64)? as usize)
}

pub fn max_db_mb(conn: &Connection) -> Result<u64> {
    get_u64(conn, "max_db_mb", DEFAULT_MAX_DB_MB)
}

/// Global count cap. `None` means unlimited.
pub fn count_cap(conn: &Connection) -> Result<Option<u64>> {
    Ok(get_setting(conn, "count_cap")?.and_then(|v| v.parse().ok()))
}

pub fn allow_secrets(conn: &Connection) -> Result<bool> {
    get_bool(conn, "allow_secrets", false)
}

pub fn notify_enabled(conn: &Connection) -> Result<bool> {
    get_bool(conn, "notify", false)
}

pub fn is_paused(conn: &Connection) -> Result<bool> {
    get_bool(conn, "paused", false)
}

pub fn set_paused(conn: &Connection, paused: bool) -> Result<()> {
    set_setting(conn, "paused", if paused { "1" } else { "0" })
}

pub fn evict_mode(conn: &Connection) -> Result<EvictMode> {
    Ok(get_setting(conn, "evict_mode")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(EvictMode::Fifo))
}

pub fn embedder_kind(conn: &Connection) -> Result<EmbedderKind> {
    Ok(get_setting(conn, "embedder")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(EmbedderKind::Hash))
}

/// Per-scope cap maps stored as JSON objects under one settings key each.
fn cap_map(conn: &Connection, key: &str) -> Result<HashMap<String, u64>> {
    match get_setting(conn, key)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(HashMap::new()),
    }
}

fn set_cap_map(conn: &Connection, key: &str, map: &HashMap<String, u64>) -> Result<()> {
    set_setting(conn, key, &serde_json::to_string(map)?)
}

pub fn app_caps(conn: &Connection) -> Result<HashMap<String, u64>> {
    cap_map(conn, "cap_by_app")
}

pub fn tag_caps(conn: &Connection) -> Result<HashMap<String, u64>> {
    cap_map(conn, "cap_by_tag")
}

/// Set or clear (cap = 0) a per-app cap. App names compare lowercase.
pub fn set_app_cap(conn: &Connection, app: &str, cap: u64) -> Result<()> {
    let mut caps = app_caps(conn)?;
    let app = app.to_lowercase();
    if cap == 0 {
        caps.remove(&app);
    } else {
        caps.insert(app, cap);
    }
    set_cap_map(conn, "cap_by_app", &caps)
}

/// Set or clear (cap = 0) a per-tag cap.
pub fn set_tag_cap(conn: &Connection, tag: &str, cap: u64) -> Result<()> {
    let mut caps = tag_caps(conn)?;
    let tag = tag.to_lowercase();
    if cap == 0 {
        caps.remove(&tag);
    } else {
        caps.insert(tag, cap);
    }
    set_cap_map(conn, "cap_by_tag", &caps)
}

pub fn blocklist(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT app FROM blocklist ORDER BY app")?;
    let apps = stmt
        .query_map([], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(apps)
}

pub fn blocklist_add(conn: &Connection, app: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO blocklist (app) VALUES (?1)",
        [app.to_lowercase()],
    )?;
    Ok(())
}

pub fn blocklist_remove(conn: &Connection, app: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM blocklist WHERE app = ?1",
        [app.to_lowercase()],
    )?;
    Ok(n > 0)
}

/// Snapshot of the capture gate inputs, loaded fresh per capture.
#[derive(Debug, Clone)]
pub struct CapturePolicy {
    pub max_bytes: usize,
    pub allow_secrets: bool,
    /// Lowercased app names excluded from capture.
    pub blocklist: Vec<String>,
}

impl CapturePolicy {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            max_bytes: max_bytes(conn)?,
            allow_secrets: allow_secrets(conn)?,
            blocklist: blocklist(conn)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn settings_round_trip() {
        let conn = open_memory_database().unwrap();
        assert_eq!(get_setting(&conn, "max_bytes").unwrap(), None);

        set_setting(&conn, "max_bytes", "4096").unwrap();
        assert_eq!(max_bytes(&conn).unwrap(), 4096);

        set_setting(&conn, "max_bytes", "8192").unwrap();
        assert_eq!(max_bytes(&conn).unwrap(), 8192);

        delete_setting(&conn, "max_bytes").unwrap();
        assert_eq!(max_bytes(&conn).unwrap(), DEFAULT_MAX_BYTES);
    }

    #[test]
    fn defaults_when_unset() {
        let conn = open_memory_database().unwrap();
        assert_eq!(max_db_mb(&conn).unwrap(), DEFAULT_MAX_DB_MB);
        assert_eq!(count_cap(&conn).unwrap(), None);
        assert!(!allow_secrets(&conn).unwrap());
        assert!(!is_paused(&conn).unwrap());
        assert_eq!(evict_mode(&conn).unwrap(), EvictMode::Fifo);
        assert_eq!(embedder_kind(&conn).unwrap(), EmbedderKind::Hash);
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "not-a-number").unwrap();
        assert_eq!(count_cap(&conn).unwrap(), None);
        set_setting(&conn, "evict_mode", "lru").unwrap();
        assert_eq!(evict_mode(&conn).unwrap(), EvictMode::Fifo);
    }

    #[test]
    fn pause_toggle() {
        let conn = open_memory_database().unwrap();
        set_paused(&conn, true).unwrap();
        assert!(is_paused(&conn).unwrap());
        set_paused(&conn, false).unwrap();
        assert!(!is_paused(&conn).unwrap());
    }

    #[test]
    fn cap_maps_store_and_clear() {
        let conn = open_memory_database().unwrap();
        set_app_cap(&conn, "Terminal", 50).unwrap();
        set_app_cap(&conn, "Safari", 100).unwrap();

        let caps = app_caps(&conn).unwrap();
        assert_eq!(caps.get("terminal"), Some(&50));
        assert_eq!(caps.get("safari"), Some(&100));

        set_app_cap(&conn, "terminal", 0).unwrap();
        assert!(!app_caps(&conn).unwrap().contains_key("terminal"));
    }

    #[test]
    fn blocklist_is_lowercased_and_deduped() {
        let conn = open_memory_database().unwrap();
        blocklist_add(&conn, "1Password").unwrap();
        blocklist_add(&conn, "1password").unwrap();
        assert_eq!(blocklist(&conn).unwrap(), vec!["1password".to_string()]);

        assert!(blocklist_remove(&conn, "1PASSWORD").unwrap());
        assert!(!blocklist_remove(&conn, "1password").unwrap());
        assert!(blocklist(&conn).unwrap().is_empty());
    }

    #[test]
    fn capture_policy_loads_current_values() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "max_bytes", "1000").unwrap();
        set_setting(&conn, "allow_secrets", "true").unwrap();
        blocklist_add(&conn, "KeePassXC").unwrap();

        let policy = CapturePolicy::load(&conn).unwrap();
        assert_eq!(policy.max_bytes, 1000);
        assert!(policy.allow_secrets);
        assert_eq!(policy.blocklist, vec!["keepassxc".to_string()]);
    }
}
