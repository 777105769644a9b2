//! Single-clip management commands: pin, tag, note, show, delete, purge,
//! history.

use anyhow::Result;

use crate::clip::store::{self, PurgeFilter};
use crate::clip::tags;
use crate::config::ClipvaultConfig;

pub fn pin(config: &ClipvaultConfig, id: i64, pinned: bool) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    store::set_pinned(&conn, id, pinned)?;
    println!("Clip #{id} {}", if pinned { "pinned" } else { "unpinned" });
    Ok(())
}

pub fn tag(config: &ClipvaultConfig, id: i64, name: &str, remove: bool) -> Result<()> {
    let mut conn = crate::db::open_database(&config.resolved_db_path())?;
    if remove {
        if tags::remove_tag(&conn, id, name)? {
            println!("Removed tag '{name}' from clip #{id}");
        } else {
            println!("Clip #{id} did not have tag '{name}'");
        }
    } else {
        tags::assign_tag_capped(&mut conn, id, name)?;
        println!("Tagged clip #{id} with '{name}'");
    }
    Ok(())
}

pub fn list_tags(config: &ClipvaultConfig) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let all = tags::list_tags(&conn)?;
    if all.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    for (name, count) in all {
        println!("{count:>6}  {name}");
    }
    Ok(())
}

pub fn note(config: &ClipvaultConfig, id: i64, text: &str) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    store::append_note(&conn, id, text)?;
    println!("Note added to clip #{id}");
    Ok(())
}

pub fn show(config: &ClipvaultConfig, id: i64) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let clip = store::fetch_clip(&conn, id)?;

    println!("Clip #{}", clip.id);
    println!("  created:   {}", clip.created_at);
    println!("  app:       {}", clip.source_app);
    if let Some(title) = &clip.window_title {
        println!("  window:    {title}");
    }
    println!("  lang:      {}", clip.lang);
    println!("  embedder:  {}", clip.embedder);
    println!("  sightings: {}", clip.sightings);
    println!("  pinned:    {}", clip.pinned);
    if !clip.tags.is_empty() {
        println!("  tags:      {}", clip.tags.join(", "));
    }
    let notes = store::notes_for_clip(&conn, id)?;
    for n in &notes {
        println!("  note:      {n}");
    }
    println!("\n{}", clip.content);
    Ok(())
}

pub fn delete(config: &ClipvaultConfig, id: i64) -> Result<()> {
    let mut conn = crate::db::open_database(&config.resolved_db_path())?;
    store::delete_clip(&mut conn, id)?;
    println!("Deleted clip #{id}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn purge(
    config: &ClipvaultConfig,
    app: Option<String>,
    tag: Option<String>,
    older_than_days: Option<u32>,
    keep_last: Option<u64>,
    all: bool,
    yes: bool,
) -> Result<()> {
    if all && !yes {
        anyhow::bail!("`purge --all` wipes every clip including pins; pass --yes to confirm");
    }
    if !all && app.is_none() && tag.is_none() && older_than_days.is_none() && keep_last.is_none() {
        anyhow::bail!("purge needs at least one of --app, --tag, --older-than-days, --keep-last, or --all");
    }

    let mut conn = crate::db::open_database(&config.resolved_db_path())?;
    let removed = store::purge(
        &mut conn,
        &PurgeFilter {
            app: app.as_deref(),
            tag: tag.as_deref(),
            older_than_days,
            keep_last,
            all,
        },
    )?;
    println!("Purged {removed} clip(s)");
    Ok(())
}

pub fn history(config: &ClipvaultConfig, id: i64, limit: Option<usize>) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let events = store::history(&conn, id, limit.unwrap_or(20))?;
    if events.is_empty() {
        println!("No sightings recorded for clip #{id}.");
        return Ok(());
    }
    println!("Sightings of clip #{id} (newest first):");
    for seen_at in events {
        println!("  {seen_at}");
    }
    Ok(())
}
