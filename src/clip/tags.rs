//! Tag management. Tag names are lowercased on the way in so `Rust` and
//! `rust` are one tag.

use rusqlite::{params, Connection, OptionalExtension};

use super::{ClipError, Result};

fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(ClipError::InvalidInput("tag name is empty".into()));
    }
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [&name])?;
    let id = conn.query_row("SELECT id FROM tags WHERE name = ?1", [&name], |r| r.get(0))?;
    Ok(id)
}

/// Attach a tag to a clip. Idempotent: returns false if already tagged.
pub fn assign_tag(conn: &Connection, clip_id: i64, tag: &str) -> Result<bool> {
    let exists: bool = conn
        .query_row("SELECT 1 FROM clips WHERE id = ?1", [clip_id], |_| Ok(true))
        .optional()?
        .unwrap_or(false);
    if !exists {
        return Err(ClipError::NotFound(clip_id));
    }
    let tag_id = get_or_create_tag(conn, tag)?;
    let n = conn.execute(
        "INSERT OR IGNORE INTO clip_tags (clip_id, tag_id) VALUES (?1, ?2)",
        params![clip_id, tag_id],
    )?;
    Ok(n > 0)
}

/// Attach a tag and enforce that tag's cap. A new member can push the tag
/// over its configured cap, so every mutation path that adds members goes
/// through here rather than calling [`assign_tag`] directly.
pub fn assign_tag_capped(conn: &mut Connection, clip_id: i64, tag: &str) -> Result<bool> {
    let attached = assign_tag(conn, clip_id, tag)?;
    if attached {
        super::evict::enforce_tag_cap(conn, tag)?;
    }
    Ok(attached)
}

/// Detach a tag from a clip. Returns false if it was not attached.
pub fn remove_tag(conn: &Connection, clip_id: i64, tag: &str) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM clip_tags WHERE clip_id = ?1
         AND tag_id = (SELECT id FROM tags WHERE name = ?2)",
        params![clip_id, tag.trim().to_lowercase()],
    )?;
    Ok(n > 0)
}

/// Tags attached to one clip, alphabetical.
pub fn tags_for_clip(conn: &Connection, clip_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM tags t
         JOIN clip_tags ct ON ct.tag_id = t.id
         WHERE ct.clip_id = ?1 ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map([clip_id], |r| r.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// All tags with their live clip counts, most used first.
pub fn list_tags(conn: &Connection) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT t.name, COUNT(ct.clip_id) AS n FROM tags t
         LEFT JOIN clip_tags ct ON ct.tag_id = t.id
         GROUP BY t.id ORDER BY n DESC, t.name",
    )?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as u64)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::store::tests::insert_test_clip;
    use crate::db::open_memory_database;

    #[test]
    fn assign_is_idempotent_and_case_folded() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_test_clip(&mut conn, "tagged", "Terminal", 0);

        assert!(assign_tag(&conn, id, "Rust").unwrap());
        assert!(!assign_tag(&conn, id, "rust").unwrap());
        assert_eq!(tags_for_clip(&conn, id).unwrap(), vec!["rust"]);
    }

    #[test]
    fn assign_to_missing_clip_errors() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            assign_tag(&conn, 42, "rust").unwrap_err(),
            ClipError::NotFound(42)
        ));
    }

    #[test]
    fn remove_reports_whether_attached() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_test_clip(&mut conn, "tagged", "Terminal", 0);
        assign_tag(&conn, id, "snippet").unwrap();

        assert!(remove_tag(&conn, id, "SNIPPET").unwrap());
        assert!(!remove_tag(&conn, id, "snippet").unwrap());
        assert!(tags_for_clip(&conn, id).unwrap().is_empty());
    }

    #[test]
    fn list_counts_live_clips_per_tag() {
        let mut conn = open_memory_database().unwrap();
        let a = insert_test_clip(&mut conn, "one", "Terminal", 0);
        let b = insert_test_clip(&mut conn, "two", "Terminal", 1);
        assign_tag(&conn, a, "code").unwrap();
        assign_tag(&conn, b, "code").unwrap();
        assign_tag(&conn, a, "todo").unwrap();

        let tags = list_tags(&conn).unwrap();
        assert_eq!(tags[0], ("code".to_string(), 2));
        assert_eq!(tags[1], ("todo".to_string(), 1));
    }

    #[test]
    fn capped_assign_keeps_the_tag_within_cap() {
        let mut conn = open_memory_database().unwrap();
        crate::clip::settings::set_tag_cap(&conn, "scratch", 1).unwrap();
        let a = insert_test_clip(&mut conn, "a", "Terminal", 0);
        let b = insert_test_clip(&mut conn, "b", "Terminal", 1);

        assign_tag_capped(&mut conn, a, "scratch").unwrap();
        assign_tag_capped(&mut conn, b, "scratch").unwrap();

        // the oldest member was evicted to make room
        assert!(crate::clip::store::fetch_clip(&conn, a).is_err());
        assert!(crate::clip::store::fetch_clip(&conn, b).is_ok());
    }

    #[test]
    fn empty_tag_name_is_invalid() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_test_clip(&mut conn, "x", "Terminal", 0);
        assert!(matches!(
            assign_tag(&conn, id, "   ").unwrap_err(),
            ClipError::InvalidInput(_)
        ));
    }
}
