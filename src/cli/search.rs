use anyhow::Result;

use crate::clip::search::{keyword_search, related, semantic_search};
use crate::clip::settings;
use crate::clip::types::SearchFilter;
use crate::config::ClipvaultConfig;
use crate::embedding::ProviderRegistry;

/// Search from the terminal: keyword FTS5 by default, embedding similarity
/// with `--semantic`.
#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &ClipvaultConfig,
    query: &str,
    semantic: bool,
    app: Option<String>,
    tag: Option<String>,
    since: Option<String>,
    until: Option<String>,
    pinned: bool,
    limit: Option<usize>,
    pool: Option<usize>,
) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let filter = SearchFilter {
        app,
        tag,
        since,
        until,
        pins_only: pinned,
    };
    let limit = limit.unwrap_or(config.retrieval.default_limit);
    let pool = pool.unwrap_or(config.retrieval.semantic_pool);

    let results = if semantic {
        let registry = ProviderRegistry::new(config.embedding.clone());
        let kind = settings::embedder_kind(&conn)?;
        let provider = registry.provider(kind);
        let embedding = provider.embed(query)?;
        semantic_search(&conn, &embedding, provider.name(), &filter, limit, pool)?
    } else {
        keyword_search(&conn, query, &filter, limit)?
    };

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    println!("Found {} result(s)\n", results.len());
    super::print_summaries(&results);
    Ok(())
}

/// Show clips similar to an existing clip.
pub fn run_related(
    config: &ClipvaultConfig,
    id: i64,
    limit: Option<usize>,
    pool: Option<usize>,
) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let limit = limit.unwrap_or(config.retrieval.default_limit);
    let pool = pool.unwrap_or(config.retrieval.semantic_pool);

    let results = related(&conn, id, limit, pool)?;
    if results.is_empty() {
        println!("No related clips.");
        return Ok(());
    }
    super::print_summaries(&results);
    Ok(())
}
