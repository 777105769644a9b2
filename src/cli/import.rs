use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::clip::federation::{import_merge, ClipExport};
use crate::clip::settings;
use crate::config::ClipvaultConfig;
use crate::embedding::ProviderRegistry;

/// Merge an exported JSON file (or stdin with `-`) into this vault.
pub fn run(config: &ClipvaultConfig, path: &Path) -> Result<()> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    let items: Vec<ClipExport> =
        serde_json::from_str(&json).context("failed to parse export JSON")?;

    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = crate::db::open_database(&db_path)?;

    let registry = ProviderRegistry::new(config.embedding.clone());
    let kind = settings::embedder_kind(&conn)?;
    let provider = registry.provider(kind);

    let report = import_merge(
        &mut conn,
        provider.as_ref(),
        provider.name(),
        &items,
        Some(&db_path),
    )?;
    println!(
        "Import complete: {} added, {} already present, {} failed.",
        report.added, report.skipped, report.failed
    );
    Ok(())
}
