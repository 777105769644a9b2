//! Vault status, pause/resume, settings, and blocklist commands.

use anyhow::Result;

use crate::clip::settings;
use crate::clip::status::status;
use crate::config::ClipvaultConfig;

pub fn run(config: &ClipvaultConfig, json: bool) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    let snap = status(&conn, Some(&db_path))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    println!("clipvault status");
    println!("  capture:    {}", if snap.paused { "paused" } else { "active" });
    println!("  clips:      {} ({} pinned)", snap.clip_count, snap.pinned_count);
    if let Some(latest) = &snap.latest_capture {
        println!("  latest:     {latest}");
    }
    println!(
        "  db size:    {:.1} MB (cap {} MB)",
        snap.db_size_bytes as f64 / (1024.0 * 1024.0),
        snap.max_db_mb
    );
    match snap.count_cap {
        Some(cap) => println!("  count cap:  {cap}"),
        None => println!("  count cap:  unlimited"),
    }
    println!("  eviction:   {}", snap.evict_mode);
    println!("  embedder:   {}", snap.embedder);
    println!("  secrets:    {}", if snap.allow_secrets { "allowed" } else { "filtered" });
    println!("  blocklist:  {} app(s)", snap.blocklist_size);
    for w in &snap.warnings {
        println!("  warning:    {w}");
    }
    Ok(())
}

pub fn pause(config: &ClipvaultConfig, paused: bool) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::set_paused(&conn, paused)?;
    println!("Capture {}", if paused { "paused" } else { "resumed" });
    Ok(())
}

/// `settings list` / `set KEY VALUE` / `unset KEY`.
pub fn set(config: &ClipvaultConfig, key: &str, value: &str) -> Result<()> {
    // Validate the enum-like keys up front so a typo doesn't silently fall
    // back to defaults later.
    match key {
        "evict_mode" => {
            value.parse::<crate::clip::types::EvictMode>().map_err(anyhow::Error::msg)?;
        }
        "embedder" => {
            value.parse::<crate::embedding::EmbedderKind>().map_err(anyhow::Error::msg)?;
        }
        "max_bytes" | "max_db_mb" | "count_cap" => {
            value.parse::<u64>().map_err(|_| anyhow::anyhow!("{key} must be a number"))?;
        }
        _ => {}
    }

    let conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::set_setting(&conn, key, value)?;
    println!("{key} = {value}");
    Ok(())
}

pub fn unset(config: &ClipvaultConfig, key: &str) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::delete_setting(&conn, key)?;
    println!("{key} reset to default");
    Ok(())
}

pub fn list(config: &ClipvaultConfig) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let all = settings::list_settings(&conn)?;
    if all.is_empty() {
        println!("No settings overridden; all defaults.");
        return Ok(());
    }
    for (key, value) in all {
        println!("{key} = {value}");
    }
    Ok(())
}

pub fn cap_app(config: &ClipvaultConfig, app: &str, cap: u64) -> Result<()> {
    let mut conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::set_app_cap(&conn, app, cap)?;
    if cap == 0 {
        println!("Removed cap for app '{app}'");
    } else {
        crate::clip::evict::enforce_app_cap(&mut conn, app)?;
        println!("Cap for app '{app}' set to {cap}");
    }
    Ok(())
}

pub fn cap_tag(config: &ClipvaultConfig, tag: &str, cap: u64) -> Result<()> {
    let mut conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::set_tag_cap(&conn, tag, cap)?;
    if cap == 0 {
        println!("Removed cap for tag '{tag}'");
    } else {
        crate::clip::evict::enforce_tag_cap(&mut conn, tag)?;
        println!("Cap for tag '{tag}' set to {cap}");
    }
    Ok(())
}

pub fn blocklist_list(config: &ClipvaultConfig) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    let apps = settings::blocklist(&conn)?;
    if apps.is_empty() {
        println!("Blocklist is empty.");
        return Ok(());
    }
    for app in apps {
        println!("{app}");
    }
    Ok(())
}

pub fn blocklist_add(config: &ClipvaultConfig, app: &str) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    settings::blocklist_add(&conn, app)?;
    println!("'{}' will no longer be captured", app.to_lowercase());
    Ok(())
}

pub fn blocklist_remove(config: &ClipvaultConfig, app: &str) -> Result<()> {
    let conn = crate::db::open_database(&config.resolved_db_path())?;
    if settings::blocklist_remove(&conn, app)? {
        println!("'{}' removed from the blocklist", app.to_lowercase());
    } else {
        println!("'{}' was not on the blocklist", app.to_lowercase());
    }
    Ok(())
}
