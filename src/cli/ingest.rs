use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::capture::{capture, file_is_ingestible, NullNotifier, RawEvent};
use crate::clip::tags;
use crate::clip::types::CaptureOutcome;
use crate::config::ClipvaultConfig;
use crate::embedding::ProviderRegistry;

/// Store text from an argument or stdin through the capture pipeline.
pub fn run(
    config: &ClipvaultConfig,
    text: Option<String>,
    source: Option<String>,
    tag_list: Vec<String>,
) -> Result<()> {
    let content = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = crate::db::open_database(&db_path)?;
    let registry = ProviderRegistry::new(config.embedding.clone());

    let event = RawEvent {
        content,
        source_app: source.unwrap_or_else(|| "ingest".into()),
        window_title: None,
    };

    let outcome = capture(&mut conn, &registry, &event, Some(&db_path), &NullNotifier)?;
    match outcome {
        CaptureOutcome::Persisted { id } => {
            for tag in &tag_list {
                tags::assign_tag_capped(&mut conn, id, tag)?;
            }
            println!("Stored clip #{id}");
        }
        CaptureOutcome::Deduplicated { id } => {
            println!("Already stored as clip #{id}; recorded a sighting.")
        }
        CaptureOutcome::Rejected { reason } => {
            anyhow::bail!("rejected: {reason}");
        }
    }
    Ok(())
}

/// Ingest a text file through the capture pipeline. The file name becomes
/// the window title and the source app is "inbox", so an `inbox` app cap
/// governs file drops separately from live captures.
pub fn run_file(config: &ClipvaultConfig, path: &Path, tag_list: Vec<String>) -> Result<()> {
    anyhow::ensure!(path.is_file(), "{} is not a file", path.display());
    anyhow::ensure!(
        file_is_ingestible(path),
        "{} has an extension outside the text allowlist",
        path.display()
    );

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let db_path = config.resolved_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = crate::db::open_database(&db_path)?;
    let registry = ProviderRegistry::new(config.embedding.clone());

    let event = RawEvent {
        content,
        source_app: "inbox".into(),
        window_title: file_name,
    };

    let outcome = capture(&mut conn, &registry, &event, Some(&db_path), &NullNotifier)?;
    match outcome {
        CaptureOutcome::Persisted { id } => {
            for tag in &tag_list {
                tags::assign_tag_capped(&mut conn, id, tag)?;
            }
            println!("Ingested {} as clip #{id}", path.display());
        }
        CaptureOutcome::Deduplicated { id } => {
            println!("Content of {} already stored as clip #{id}.", path.display())
        }
        CaptureOutcome::Rejected { reason } => {
            anyhow::bail!("rejected: {reason}");
        }
    }
    Ok(())
}
