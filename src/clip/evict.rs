//! Cap enforcement and eviction.
//!
//! Four independent caps: global count, per-app count, per-tag count, and
//! total database size. Each enforcement pass is idempotent — running it
//! twice in a row removes nothing the second time. Victim order depends on
//! the configured [`EvictMode`]: fifo takes the oldest regardless of pins,
//! tiered takes the oldest non-pinned first and only falls back to pinned
//! clips when a scope is over cap with nothing else left to take.

use rusqlite::Connection;

use super::settings;
use super::store::delete_clips;
use super::types::EvictMode;
use super::Result;

/// How many clips to drop per size-cap pass, as a fraction of the total.
/// Deleting in batches avoids thrashing when the database hovers at the cap.
const SIZE_BATCH_FRACTION: f64 = 0.05;

/// Oldest victim ids for a scope, honoring the evict mode. `scope_sql` must
/// select candidate ids as `c.id` with its own WHERE conditions; pass "" for
/// the global scope.
fn pick_victims(
    conn: &Connection,
    mode: EvictMode,
    scope_sql: &str,
    scope_param: Option<&str>,
    excess: u64,
) -> Result<Vec<i64>> {
    let order_unpinned_first = match mode {
        EvictMode::Fifo => "",
        EvictMode::Tiered => "c.pinned ASC, ",
    };
    let sql = format!(
        "SELECT c.id FROM clips c WHERE 1=1 {scope_sql}
         ORDER BY {order_unpinned_first}c.created_at ASC, c.id ASC LIMIT ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let ids: Vec<i64> = match scope_param {
        Some(p) => stmt
            .query_map(rusqlite::params![p, excess as i64], |r| r.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map(rusqlite::params![excess as i64], |r| r.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    Ok(ids)
}

fn warn_if_pinned_evicted(conn: &Connection, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("SELECT COUNT(*) FROM clips WHERE pinned = 1 AND id IN ({placeholders})");
    let params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
    let pinned: i64 = conn.query_row(&sql, params.as_slice(), |r| r.get(0))?;
    if pinned > 0 {
        tracing::warn!(count = pinned, "evicting pinned clips to satisfy a cap");
    }
    Ok(())
}

/// Enforce the global count cap. Returns how many clips were evicted.
pub fn enforce_count_cap(conn: &mut Connection) -> Result<usize> {
    let Some(cap) = settings::count_cap(conn)? else {
        return Ok(0);
    };
    let count = super::store::clip_count(conn)?;
    if count <= cap {
        return Ok(0);
    }

    let mode = settings::evict_mode(conn)?;
    let victims = pick_victims(conn, mode, "", None, count - cap)?;
    warn_if_pinned_evicted(conn, &victims)?;
    let removed = delete_clips(conn, &victims)?;
    tracing::info!(removed, cap, "count cap enforced");
    Ok(removed)
}

/// Enforce the per-app cap for one app, if configured.
pub fn enforce_app_cap(conn: &mut Connection, app: &str) -> Result<usize> {
    let app = app.to_lowercase();
    let Some(&cap) = settings::app_caps(conn)?.get(&app) else {
        return Ok(0);
    };

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM clips WHERE LOWER(source_app) = ?1",
        [&app],
        |r| r.get(0),
    )?;
    if count as u64 <= cap {
        return Ok(0);
    }

    let mode = settings::evict_mode(conn)?;
    let victims = pick_victims(
        conn,
        mode,
        "AND LOWER(c.source_app) = ?",
        Some(&app),
        count as u64 - cap,
    )?;
    warn_if_pinned_evicted(conn, &victims)?;
    let removed = delete_clips(conn, &victims)?;
    tracing::info!(removed, app, cap, "app cap enforced");
    Ok(removed)
}

/// Enforce the per-tag cap for one tag, if configured.
pub fn enforce_tag_cap(conn: &mut Connection, tag: &str) -> Result<usize> {
    let tag = tag.to_lowercase();
    let Some(&cap) = settings::tag_caps(conn)?.get(&tag) else {
        return Ok(0);
    };

    let scope = "AND c.id IN (SELECT ct.clip_id FROM clip_tags ct
                  JOIN tags t ON t.id = ct.tag_id WHERE t.name = ?)";
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM clip_tags ct JOIN tags t ON t.id = ct.tag_id WHERE t.name = ?1",
        [&tag],
        |r| r.get(0),
    )?;
    if count as u64 <= cap {
        return Ok(0);
    }

    let mode = settings::evict_mode(conn)?;
    let victims = pick_victims(conn, mode, scope, Some(&tag), count as u64 - cap)?;
    warn_if_pinned_evicted(conn, &victims)?;
    let removed = delete_clips(conn, &victims)?;
    tracing::info!(removed, tag, cap, "tag cap enforced");
    Ok(removed)
}

/// Enforce the database size cap. Evicts in batches of 5% of the live count
/// per pass until under the cap, then VACUUMs once to return space to the
/// filesystem. No-op for in-memory databases (no path).
pub fn enforce_size_cap(conn: &mut Connection, db_path: Option<&std::path::Path>) -> Result<usize> {
    let Some(path) = db_path else {
        return Ok(0);
    };
    let cap_bytes = settings::max_db_mb(conn)? * 1024 * 1024;
    if super::store::db_size_bytes(Some(path)) <= cap_bytes {
        return Ok(0);
    }

    let mode = settings::evict_mode(conn)?;
    let mut removed = 0;
    loop {
        let count = super::store::clip_count(conn)?;
        if count == 0 {
            break;
        }
        let batch = ((count as f64 * SIZE_BATCH_FRACTION).ceil() as u64).max(1);
        let victims = pick_victims(conn, mode, "", None, batch)?;
        warn_if_pinned_evicted(conn, &victims)?;
        removed += delete_clips(conn, &victims)?;

        // Reclaim pages so the file size check sees the effect.
        conn.execute_batch("VACUUM")?;
        if super::store::db_size_bytes(Some(path)) <= cap_bytes {
            break;
        }
    }

    if removed > 0 {
        tracing::info!(removed, cap_mb = cap_bytes / (1024 * 1024), "size cap enforced");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::settings::{set_app_cap, set_setting, set_tag_cap};
    use crate::clip::store::tests::insert_test_clip;
    use crate::clip::{store, tags};
    use crate::db::open_memory_database;

    #[test]
    fn count_cap_keeps_newest() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "2").unwrap();

        let a = insert_test_clip(&mut conn, "a", "Terminal", 0);
        let b = insert_test_clip(&mut conn, "b", "Terminal", 1);
        let c = insert_test_clip(&mut conn, "c", "Terminal", 2);

        let removed = enforce_count_cap(&mut conn).unwrap();
        assert_eq!(removed, 1);
        assert!(store::fetch_clip(&conn, a).is_err());
        assert!(store::fetch_clip(&conn, b).is_ok());
        assert!(store::fetch_clip(&conn, c).is_ok());
    }

    #[test]
    fn count_cap_is_idempotent() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "1").unwrap();
        insert_test_clip(&mut conn, "a", "Terminal", 0);
        insert_test_clip(&mut conn, "b", "Terminal", 1);

        assert_eq!(enforce_count_cap(&mut conn).unwrap(), 1);
        assert_eq!(enforce_count_cap(&mut conn).unwrap(), 0);
    }

    #[test]
    fn no_cap_means_no_eviction() {
        let mut conn = open_memory_database().unwrap();
        insert_test_clip(&mut conn, "a", "Terminal", 0);
        assert_eq!(enforce_count_cap(&mut conn).unwrap(), 0);
    }

    #[test]
    fn fifo_evicts_pinned_clips_too() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "1").unwrap();
        set_setting(&conn, "evict_mode", "fifo").unwrap();

        let oldest = insert_test_clip(&mut conn, "pinned oldest", "Terminal", 0);
        store::set_pinned(&conn, oldest, true).unwrap();
        let newest = insert_test_clip(&mut conn, "newest", "Terminal", 1);

        enforce_count_cap(&mut conn).unwrap();
        assert!(store::fetch_clip(&conn, oldest).is_err());
        assert!(store::fetch_clip(&conn, newest).is_ok());
    }

    #[test]
    fn tiered_spares_pins_while_unpinned_remain() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "2").unwrap();
        set_setting(&conn, "evict_mode", "tiered").unwrap();

        let pinned = insert_test_clip(&mut conn, "pinned oldest", "Terminal", 0);
        store::set_pinned(&conn, pinned, true).unwrap();
        let unpinned = insert_test_clip(&mut conn, "unpinned middle", "Terminal", 1);
        let newest = insert_test_clip(&mut conn, "newest", "Terminal", 2);

        enforce_count_cap(&mut conn).unwrap();
        // the older pinned clip survives; the unpinned one goes
        assert!(store::fetch_clip(&conn, pinned).is_ok());
        assert!(store::fetch_clip(&conn, unpinned).is_err());
        assert!(store::fetch_clip(&conn, newest).is_ok());
    }

    #[test]
    fn tiered_falls_back_to_pins_when_nothing_else_left() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "1").unwrap();
        set_setting(&conn, "evict_mode", "tiered").unwrap();

        let old_pin = insert_test_clip(&mut conn, "old pin", "Terminal", 0);
        let new_pin = insert_test_clip(&mut conn, "new pin", "Terminal", 1);
        store::set_pinned(&conn, old_pin, true).unwrap();
        store::set_pinned(&conn, new_pin, true).unwrap();

        enforce_count_cap(&mut conn).unwrap();
        assert!(store::fetch_clip(&conn, old_pin).is_err());
        assert!(store::fetch_clip(&conn, new_pin).is_ok());
    }

    #[test]
    fn app_cap_only_touches_that_app() {
        let mut conn = open_memory_database().unwrap();
        set_app_cap(&conn, "Terminal", 1).unwrap();

        let t1 = insert_test_clip(&mut conn, "t1", "Terminal", 0);
        let t2 = insert_test_clip(&mut conn, "t2", "Terminal", 1);
        let s1 = insert_test_clip(&mut conn, "s1", "Safari", 2);

        let removed = enforce_app_cap(&mut conn, "terminal").unwrap();
        assert_eq!(removed, 1);
        assert!(store::fetch_clip(&conn, t1).is_err());
        assert!(store::fetch_clip(&conn, t2).is_ok());
        assert!(store::fetch_clip(&conn, s1).is_ok());
    }

    #[test]
    fn tag_cap_only_touches_that_tag() {
        let mut conn = open_memory_database().unwrap();
        set_tag_cap(&conn, "scratch", 1).unwrap();

        let a = insert_test_clip(&mut conn, "a", "Terminal", 0);
        let b = insert_test_clip(&mut conn, "b", "Terminal", 1);
        let other = insert_test_clip(&mut conn, "c", "Terminal", 2);
        tags::assign_tag(&conn, a, "scratch").unwrap();
        tags::assign_tag(&conn, b, "scratch").unwrap();

        let removed = enforce_tag_cap(&mut conn, "scratch").unwrap();
        assert_eq!(removed, 1);
        assert!(store::fetch_clip(&conn, a).is_err());
        assert!(store::fetch_clip(&conn, b).is_ok());
        assert!(store::fetch_clip(&conn, other).is_ok());
    }

    #[test]
    fn eviction_cleans_up_vectors() {
        let mut conn = open_memory_database().unwrap();
        set_setting(&conn, "count_cap", "1").unwrap();
        insert_test_clip(&mut conn, "a", "Terminal", 0);
        insert_test_clip(&mut conn, "b", "Terminal", 1);

        enforce_count_cap(&mut conn).unwrap();
        let vecs: i64 = conn
            .query_row("SELECT COUNT(*) FROM clip_vectors", [], |r| r.get(0))
            .unwrap();
        assert_eq!(vecs, 1);
    }
}
