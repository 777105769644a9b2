//! Retrieval: keyword search over FTS5, semantic search over vec0, related
//! lookup, and recency listing.
//!
//! Keyword queries pass through to FTS5 unescaped, so boolean operators,
//! quoted phrases, and `prefix*` syntax all work. Semantic search runs a KNN
//! over a candidate pool wider than the requested limit, then applies the
//! structured filters to the pool; vectors only compare within the provider
//! that produced them.

use rusqlite::Connection;

use super::types::{truncate_preview, ClipSummary, SearchFilter};
use super::{bytes_to_embedding, cosine_from_l2, embedding_to_bytes, ClipError, Result};

/// Display width for content previews.
const PREVIEW_CHARS: usize = 120;

pub(crate) type Binding = Box<dyn rusqlite::types::ToSql>;

/// Render `filter` as `AND ...` clauses against a `clips` alias `c`.
pub(crate) fn append_filter_clauses(
    filter: &SearchFilter,
    sql: &mut String,
    bindings: &mut Vec<Binding>,
) {
    if let Some(app) = &filter.app {
        sql.push_str(" AND LOWER(c.source_app) = LOWER(?)");
        bindings.push(Box::new(app.clone()));
    }
    if let Some(tag) = &filter.tag {
        sql.push_str(
            " AND c.id IN (SELECT ct.clip_id FROM clip_tags ct
               JOIN tags t ON t.id = ct.tag_id WHERE t.name = LOWER(?))",
        );
        bindings.push(Box::new(tag.clone()));
    }
    if let Some(since) = &filter.since {
        sql.push_str(" AND c.created_at >= ?");
        bindings.push(Box::new(since.clone()));
    }
    if let Some(until) = &filter.until {
        sql.push_str(" AND c.created_at < ?");
        bindings.push(Box::new(until.clone()));
    }
    if filter.pins_only {
        sql.push_str(" AND c.pinned = 1");
    }
}

fn summary_from_row(row: &rusqlite::Row, score: Option<f64>) -> rusqlite::Result<ClipSummary> {
    Ok(ClipSummary {
        id: row.get(0)?,
        created_at: row.get(1)?,
        source_app: row.get(2)?,
        title: row.get(3)?,
        preview: truncate_preview(&row.get::<_, String>(4)?, PREVIEW_CHARS),
        pinned: row.get::<_, i64>(5)? != 0,
        score,
        tags: vec![],
    })
}

fn attach_tags(conn: &Connection, summaries: &mut [ClipSummary]) -> Result<()> {
    for s in summaries.iter_mut() {
        s.tags = super::tags::tags_for_clip(conn, s.id)?;
    }
    Ok(())
}

/// Keyword search. The query is raw FTS5 MATCH syntax; bm25 rank orders the
/// results (ties broken by recency) and is surfaced negated so that higher
/// scores are better.
pub fn keyword_search(
    conn: &Connection,
    query: &str,
    filter: &SearchFilter,
    limit: usize,
) -> Result<Vec<ClipSummary>> {
    if query.trim().is_empty() {
        return Err(ClipError::InvalidInput("search query is empty".into()));
    }

    let mut sql = String::from(
        "SELECT c.id, c.created_at, c.source_app, c.title, c.content, c.pinned, clips_fts.rank
         FROM clips_fts
         JOIN clips c ON c.id = clips_fts.rowid
         WHERE clips_fts MATCH ?",
    );
    let mut bindings: Vec<Binding> = vec![Box::new(query.to_string())];
    append_filter_clauses(filter, &mut sql, &mut bindings);
    sql.push_str(" ORDER BY clips_fts.rank, c.created_at DESC LIMIT ?");
    bindings.push(Box::new(limit as i64));

    let params: Vec<&dyn rusqlite::types::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut results = stmt
        .query_map(params.as_slice(), |row| {
            let rank: f64 = row.get(6)?;
            summary_from_row(row, Some(-rank))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    attach_tags(conn, &mut results)?;
    Ok(results)
}

/// Semantic search. KNN over `pool` candidates, post-filtered to clips whose
/// stored vector came from `embedder_name` and which match the structured
/// filters; scores are cosine similarity, ties broken by recency.
pub fn semantic_search(
    conn: &Connection,
    query_embedding: &[f32],
    embedder_name: &str,
    filter: &SearchFilter,
    limit: usize,
    pool: usize,
) -> Result<Vec<ClipSummary>> {
    let pool = pool.max(limit);

    let mut stmt = conn.prepare(
        "SELECT clip_id, distance FROM clip_vectors
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let candidates: Vec<(i64, f64)> = stmt
        .query_map(
            rusqlite::params![embedding_to_bytes(query_embedding), pool as i64],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    rank_candidates(conn, candidates, embedder_name, filter, limit, None)
}

/// Clips similar to an existing clip, by its stored vector. The seed itself
/// is excluded, and comparison stays within the seed's embedding provider.
pub fn related(conn: &Connection, id: i64, limit: usize, pool: usize) -> Result<Vec<ClipSummary>> {
    let embedder: String = conn
        .query_row("SELECT embedder FROM clips WHERE id = ?1", [id], |r| r.get(0))
        .map_err(|_| ClipError::NotFound(id))?;
    let blob: Vec<u8> = conn.query_row(
        "SELECT embedding FROM clip_vectors WHERE clip_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    let seed = bytes_to_embedding(&blob);

    // +1 because the seed is its own nearest neighbor
    let pool = pool.max(limit) + 1;
    let mut stmt = conn.prepare(
        "SELECT clip_id, distance FROM clip_vectors
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let candidates: Vec<(i64, f64)> = stmt
        .query_map(
            rusqlite::params![embedding_to_bytes(&seed), pool as i64],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    rank_candidates(
        conn,
        candidates,
        &embedder,
        &SearchFilter::default(),
        limit,
        Some(id),
    )
}

/// Apply filters to the KNN pool, convert distances to cosine scores, and
/// take the top `limit`.
fn rank_candidates(
    conn: &Connection,
    candidates: Vec<(i64, f64)>,
    embedder_name: &str,
    filter: &SearchFilter,
    limit: usize,
    exclude: Option<i64>,
) -> Result<Vec<ClipSummary>> {
    let mut results = Vec::new();

    for (clip_id, distance) in candidates {
        if exclude == Some(clip_id) {
            continue;
        }

        let mut sql = String::from(
            "SELECT c.id, c.created_at, c.source_app, c.title, c.content, c.pinned
             FROM clips c WHERE c.id = ? AND c.embedder = ?",
        );
        let mut bindings: Vec<Binding> =
            vec![Box::new(clip_id), Box::new(embedder_name.to_string())];
        append_filter_clauses(filter, &mut sql, &mut bindings);

        let params: Vec<&dyn rusqlite::types::ToSql> =
            bindings.iter().map(|b| b.as_ref()).collect();
        let row = conn
            .query_row(&sql, params.as_slice(), |row| {
                summary_from_row(row, Some(cosine_from_l2(distance)))
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        if let Some(summary) = row {
            results.push(summary);
        }
    }

    // KNN pool is distance-ordered already; re-sort to break ties by recency.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    results.truncate(limit);

    attach_tags(conn, &mut results)?;
    Ok(results)
}

/// Most recent clips, newest first, with optional filters and a substring
/// match on content.
pub fn recent(
    conn: &Connection,
    filter: &SearchFilter,
    contains: Option<&str>,
    limit: usize,
) -> Result<Vec<ClipSummary>> {
    let mut sql = String::from(
        "SELECT c.id, c.created_at, c.source_app, c.title, c.content, c.pinned
         FROM clips c WHERE 1=1",
    );
    let mut bindings: Vec<Binding> = Vec::new();
    append_filter_clauses(filter, &mut sql, &mut bindings);
    if let Some(needle) = contains {
        sql.push_str(" AND c.content LIKE '%' || ? || '%'");
        bindings.push(Box::new(needle.to_string()));
    }
    sql.push_str(" ORDER BY c.created_at DESC, c.id DESC LIMIT ?");
    bindings.push(Box::new(limit as i64));

    let params: Vec<&dyn rusqlite::types::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut results = stmt
        .query_map(params.as_slice(), |row| summary_from_row(row, None))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    attach_tags(conn, &mut results)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::store::tests::{insert_test_clip, unit_vec};
    use crate::clip::{store, tags};
    use crate::db::open_memory_database;
    use crate::embedding::{EmbeddingProvider, hash::HashEmbedder};

    #[test]
    fn keyword_search_matches_and_ranks() {
        let mut conn = open_memory_database().unwrap();
        insert_test_clip(&mut conn, "rust borrow checker error", "Terminal", 0);
        insert_test_clip(&mut conn, "grocery list: milk, eggs", "Notes", 1);

        let hits = keyword_search(&conn, "borrow", &SearchFilter::default(), 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].preview.contains("borrow"));
        assert!(hits[0].score.is_some());
    }

    #[test]
    fn keyword_search_supports_fts_syntax() {
        let mut conn = open_memory_database().unwrap();
        insert_test_clip(&mut conn, "tokio spawn blocking", "Terminal", 0);
        insert_test_clip(&mut conn, "tokio select macro", "Terminal", 1);

        let hits =
            keyword_search(&conn, "tokio AND spawn", &SearchFilter::default(), 10).unwrap();
        assert_eq!(hits.len(), 1);

        let hits = keyword_search(&conn, "tok*", &SearchFilter::default(), 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn keyword_search_rejects_empty_query() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            keyword_search(&conn, "  ", &SearchFilter::default(), 10).unwrap_err(),
            ClipError::InvalidInput(_)
        ));
    }

    #[test]
    fn keyword_filter_by_app_and_pins() {
        let mut conn = open_memory_database().unwrap();
        let a = insert_test_clip(&mut conn, "shared keyword alpha", "Terminal", 0);
        insert_test_clip(&mut conn, "shared keyword beta", "Safari", 1);
        store::set_pinned(&conn, a, true).unwrap();

        let filter = SearchFilter {
            app: Some("terminal".into()),
            ..Default::default()
        };
        let hits = keyword_search(&conn, "keyword", &filter, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, a);

        let filter = SearchFilter {
            pins_only: true,
            ..Default::default()
        };
        let hits = keyword_search(&conn, "keyword", &filter, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, a);
    }

    fn insert_with_embedding(conn: &mut rusqlite::Connection, content: &str) -> i64 {
        let emb = HashEmbedder.embed(content).unwrap();
        store::insert_clip(
            conn,
            &store::NewClip {
                content,
                source_app: "Terminal",
                window_title: None,
                lang: "unk",
                embedder: "hash",
            },
            &emb,
        )
        .unwrap()
    }

    #[test]
    fn semantic_search_ranks_exact_match_first() {
        let mut conn = open_memory_database().unwrap();
        let exact = insert_with_embedding(&mut conn, "rust async runtime internals");
        insert_with_embedding(&mut conn, "quarterly sales figures for q3");

        let query = HashEmbedder.embed("rust async runtime internals").unwrap();
        let hits =
            semantic_search(&conn, &query, "hash", &SearchFilter::default(), 5, 50).unwrap();

        assert_eq!(hits[0].id, exact);
        assert!((hits[0].score.unwrap() - 1.0).abs() < 1e-4);
        if hits.len() > 1 {
            assert!(hits[1].score.unwrap() < hits[0].score.unwrap());
        }
    }

    #[test]
    fn semantic_search_skips_other_embedders() {
        let mut conn = open_memory_database().unwrap();
        // stored under a different provider name than the query's
        store::insert_clip(
            &mut conn,
            &store::NewClip {
                content: "model encoded clip",
                source_app: "Terminal",
                window_title: None,
                lang: "unk",
                embedder: "e5-small",
            },
            &unit_vec(0),
        )
        .unwrap();

        let hits =
            semantic_search(&conn, &unit_vec(0), "hash", &SearchFilter::default(), 5, 50)
                .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn related_excludes_seed_and_finds_neighbors() {
        let mut conn = open_memory_database().unwrap();
        let seed = insert_with_embedding(&mut conn, "rust borrow checker fight");
        let close = insert_with_embedding(&mut conn, "rust borrow checker fights");
        insert_with_embedding(&mut conn, "completely unrelated pasta recipe");

        let hits = related(&conn, seed, 2, 50).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.id != seed));
        assert_eq!(hits[0].id, close);
    }

    #[test]
    fn related_missing_clip_errors() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            related(&conn, 404, 5, 50).unwrap_err(),
            ClipError::NotFound(404)
        ));
    }

    #[test]
    fn recent_lists_newest_first_with_contains() {
        let mut conn = open_memory_database().unwrap();
        insert_test_clip(&mut conn, "older entry", "Terminal", 0);
        let newer = insert_test_clip(&mut conn, "newer entry", "Terminal", 1);

        let all = recent(&conn, &SearchFilter::default(), None, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer);

        let filtered = recent(&conn, &SearchFilter::default(), Some("newer"), 10).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, newer);
    }

    #[test]
    fn recent_tag_filter() {
        let mut conn = open_memory_database().unwrap();
        let a = insert_test_clip(&mut conn, "tagged one", "Terminal", 0);
        insert_test_clip(&mut conn, "untagged", "Terminal", 1);
        tags::assign_tag(&conn, a, "keep").unwrap();

        let filter = SearchFilter {
            tag: Some("keep".into()),
            ..Default::default()
        };
        let hits = recent(&conn, &filter, None, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, a);
        assert_eq!(hits[0].tags, vec!["keep"]);
    }
}
