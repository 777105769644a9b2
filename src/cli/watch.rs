use anyhow::Result;

use crate::capture::{run_watch_loop, SystemClipboard};
use crate::config::ClipvaultConfig;
use crate::embedding::ProviderRegistry;

/// Run the clipboard watch loop in the foreground until interrupted.
pub fn watch(config: &ClipvaultConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = crate::db::open_database(&db_path)?;
    let registry = ProviderRegistry::new(config.embedding.clone());
    let mut source = SystemClipboard;

    let interval = std::time::Duration::from_secs_f64(config.capture.interval_secs);
    println!(
        "Watching the clipboard every {:.1}s (db: {}). Ctrl-C to stop.",
        config.capture.interval_secs,
        db_path.display()
    );

    run_watch_loop(&mut conn, &registry, &mut source, Some(&db_path), interval)?;
    Ok(())
}
