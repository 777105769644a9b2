use anyhow::Result;

use crate::clip::federation::export_clips;
use crate::clip::types::SearchFilter;
use crate::config::ClipvaultConfig;

/// Export clips as JSON to stdout, with optional filters and redaction.
pub fn run(
    config: &ClipvaultConfig,
    app: Option<String>,
    tag: Option<String>,
    since: Option<String>,
    limit: Option<usize>,
    redact: bool,
) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let filter = SearchFilter {
        app,
        tag,
        since,
        until: None,
        pins_only: false,
    };

    let exports = export_clips(&conn, &filter, limit, redact)?;
    let json = serde_json::to_string_pretty(&exports)?;
    println!("{json}");

    eprintln!("Exported {} clip(s).", exports.len());
    Ok(())
}
