//! CLI `re-embed` command — regenerate all vectors with the active provider.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::clip::{embedding_to_bytes, settings};
use crate::config::ClipvaultConfig;
use crate::db;
use crate::embedding::ProviderRegistry;

/// Re-embed every clip with the provider named by the `embedder` setting and
/// stamp each row with the provider that produced its new vector. Useful
/// after switching providers, since search only compares vectors from one.
pub async fn re_embed(config: &ClipvaultConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path).context("failed to open database")?;

    let registry = ProviderRegistry::new(config.embedding.clone());
    let kind = settings::embedder_kind(&conn)?;
    let provider = registry.provider(kind);

    let clips: Vec<(i64, String)> = {
        let mut stmt = conn.prepare("SELECT id, content FROM clips ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let total = clips.len();
    if total == 0 {
        println!("No clips to re-embed.");
        return Ok(());
    }

    println!("Re-embedding {total} clips with '{}'...", provider.name());

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    const BATCH_SIZE: usize = 32;
    for chunk in clips.chunks(BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|(_, content)| content.clone()).collect();
        let batch_provider = Arc::clone(&provider);

        let embeddings = tokio::task::spawn_blocking(move || {
            let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
            batch_provider.embed_batch(&text_refs)
        })
        .await?
        .context("embedding batch failed")?;

        for ((id, _), emb) in chunk.iter().zip(embeddings.iter()) {
            let bytes = embedding_to_bytes(emb);
            conn.execute("DELETE FROM clip_vectors WHERE clip_id = ?1", [id])?;
            conn.execute(
                "INSERT INTO clip_vectors (clip_id, embedding) VALUES (?1, ?2)",
                rusqlite::params![id, bytes],
            )?;
            conn.execute(
                "UPDATE clips SET embedder = ?1 WHERE id = ?2",
                rusqlite::params![provider.name(), id],
            )?;
        }

        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    println!("Re-embedded {total} clips with '{}'.", provider.name());
    Ok(())
}
