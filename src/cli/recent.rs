use anyhow::Result;

use crate::clip::search::recent;
use crate::clip::types::SearchFilter;
use crate::config::ClipvaultConfig;

/// List the most recent clips, newest first.
pub fn run(
    config: &ClipvaultConfig,
    app: Option<String>,
    tag: Option<String>,
    contains: Option<String>,
    pinned: bool,
    limit: Option<usize>,
) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let filter = SearchFilter {
        app,
        tag,
        since: None,
        until: None,
        pins_only: pinned,
    };
    let limit = limit.unwrap_or(config.retrieval.default_limit);

    let results = recent(&conn, &filter, contains.as_deref(), limit)?;
    if results.is_empty() {
        println!("No clips.");
        return Ok(());
    }
    super::print_summaries(&results);
    Ok(())
}
