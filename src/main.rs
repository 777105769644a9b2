mod capture;
mod cli;
mod clip;
mod config;
mod db;
mod embedding;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clipvault", version, about = "Local clipboard long-term memory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the clipboard and capture every distinct clip
    Watch,
    /// List the most recent clips
    Recent {
        /// Filter by source application
        #[arg(long)]
        app: Option<String>,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
        /// Only clips whose content contains this substring
        #[arg(long)]
        contains: Option<String>,
        /// Only pinned clips
        #[arg(long)]
        pinned: bool,
        /// Maximum results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Search clips by keyword (FTS5 syntax) or meaning
    Search {
        /// The query; keyword mode supports AND/OR, "phrases", prefix*
        query: String,
        /// Rank by embedding similarity instead of keyword match
        #[arg(long)]
        semantic: bool,
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Only clips created at or after this ISO 8601 timestamp
        #[arg(long)]
        since: Option<String>,
        /// Only clips created before this ISO 8601 timestamp
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        pinned: bool,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Semantic candidate pool size (larger improves neighbor quality)
        #[arg(long)]
        pool: Option<usize>,
    },
    /// Show clips similar to an existing clip
    Related {
        id: i64,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        pool: Option<usize>,
    },
    /// Store text from an argument, stdin, or a file
    Ingest {
        /// Text to store; reads stdin when omitted (unless --file is given)
        text: Option<String>,
        /// Ingest a text file instead (source app "inbox")
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Source label (default "ingest")
        #[arg(long)]
        source: Option<String>,
        /// Tags to attach
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show a clip in full
    Show { id: i64 },
    /// Pin a clip (protects it from tiered eviction)
    Pin { id: i64 },
    /// Unpin a clip
    Unpin { id: i64 },
    /// Attach or remove a tag
    Tag {
        id: i64,
        name: String,
        /// Remove the tag instead of attaching it
        #[arg(long)]
        remove: bool,
    },
    /// List all tags with their clip counts
    Tags,
    /// Append a note to a clip
    Note { id: i64, text: String },
    /// Delete one clip
    Delete { id: i64 },
    /// Bulk-delete clips by app, tag, or age
    Purge {
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Only clips older than this many days
        #[arg(long)]
        older_than_days: Option<u32>,
        /// Keep the N newest matching clips
        #[arg(long)]
        keep_last: Option<u64>,
        /// Wipe everything, pins included, and clear the event log
        #[arg(long)]
        all: bool,
        /// Skip the confirmation for --all
        #[arg(long)]
        yes: bool,
    },
    /// Show the sighting history of a clip
    History {
        id: i64,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show vault status, caps, and warnings
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Pause capture without stopping the watcher
    Pause,
    /// Resume capture
    Resume,
    /// Override a runtime setting (max_bytes, max_db_mb, count_cap,
    /// evict_mode, embedder, allow_secrets, notify)
    Set { key: String, value: String },
    /// Reset a setting to its default
    Unset { key: String },
    /// List overridden settings
    Settings,
    /// Set per-scope clip caps
    Cap {
        #[command(subcommand)]
        scope: CapScope,
    },
    /// Manage the capture blocklist
    Blocklist {
        #[command(subcommand)]
        action: BlocklistAction,
    },
    /// Export clips as JSON to stdout
    Export {
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Mask credential-looking spans in exported content
        #[arg(long)]
        redact: bool,
    },
    /// Merge an exported JSON file into this vault ("-" for stdin)
    Import { path: PathBuf },
    /// Regenerate all vectors with the active embedding provider
    ReEmbed,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Start the MCP server
    Serve {
        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,
    },
}

#[derive(Subcommand)]
enum CapScope {
    /// Cap the number of clips kept per source app (0 removes the cap)
    App { app: String, cap: u64 },
    /// Cap the number of clips kept per tag (0 removes the cap)
    Tag { tag: String, cap: u64 },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.clipvault/models/
    Download,
}

#[derive(Subcommand)]
enum BlocklistAction {
    /// List blocklisted apps
    List,
    /// Stop capturing from an app
    Add { app: String },
    /// Allow an app again
    Remove { app: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::ClipvaultConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC and JSON exports.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Watch => {
            // The watch loop is blocking by design; hand it a dedicated thread.
            tokio::task::spawn_blocking(move || cli::watch::watch(&config)).await??;
        }
        Command::Recent {
            app,
            tag,
            contains,
            pinned,
            limit,
        } => cli::recent::run(&config, app, tag, contains, pinned, limit)?,
        Command::Search {
            query,
            semantic,
            app,
            tag,
            since,
            until,
            pinned,
            limit,
            pool,
        } => cli::search::run(
            &config, &query, semantic, app, tag, since, until, pinned, limit, pool,
        )?,
        Command::Related { id, limit, pool } => {
            cli::search::run_related(&config, id, limit, pool)?
        }
        Command::Ingest {
            text,
            file,
            source,
            tags,
        } => match file {
            Some(path) => cli::ingest::run_file(&config, &path, tags)?,
            None => cli::ingest::run(&config, text, source, tags)?,
        },
        Command::Show { id } => cli::manage::show(&config, id)?,
        Command::Pin { id } => cli::manage::pin(&config, id, true)?,
        Command::Unpin { id } => cli::manage::pin(&config, id, false)?,
        Command::Tag { id, name, remove } => cli::manage::tag(&config, id, &name, remove)?,
        Command::Tags => cli::manage::list_tags(&config)?,
        Command::Note { id, text } => cli::manage::note(&config, id, &text)?,
        Command::Delete { id } => cli::manage::delete(&config, id)?,
        Command::Purge {
            app,
            tag,
            older_than_days,
            keep_last,
            all,
            yes,
        } => cli::manage::purge(&config, app, tag, older_than_days, keep_last, all, yes)?,
        Command::History { id, limit } => cli::manage::history(&config, id, limit)?,
        Command::Status { json } => cli::status::run(&config, json)?,
        Command::Pause => cli::status::pause(&config, true)?,
        Command::Resume => cli::status::pause(&config, false)?,
        Command::Set { key, value } => cli::status::set(&config, &key, &value)?,
        Command::Unset { key } => cli::status::unset(&config, &key)?,
        Command::Settings => cli::status::list(&config)?,
        Command::Cap { scope } => match scope {
            CapScope::App { app, cap } => cli::status::cap_app(&config, &app, cap)?,
            CapScope::Tag { tag, cap } => cli::status::cap_tag(&config, &tag, cap)?,
        },
        Command::Blocklist { action } => match action {
            BlocklistAction::List => cli::status::blocklist_list(&config)?,
            BlocklistAction::Add { app } => cli::status::blocklist_add(&config, &app)?,
            BlocklistAction::Remove { app } => cli::status::blocklist_remove(&config, &app)?,
        },
        Command::Export {
            app,
            tag,
            since,
            limit,
            redact,
        } => cli::export::run(&config, app, tag, since, limit, redact)?,
        Command::Import { path } => cli::import::run(&config, &path)?,
        Command::ReEmbed => cli::re_embed::re_embed(&config).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Serve { http } => {
            if http {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
    }

    Ok(())
}
