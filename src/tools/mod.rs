pub mod clip_status;
pub mod ingest_text;
pub mod recent_clips;
pub mod search_clips;

use clip_status::ClipStatusParams;
use ingest_text::IngestTextParams;
use recent_clips::RecentClipsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use search_clips::SearchClipsParams;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::capture::{self, RawEvent};
use crate::clip::types::SearchFilter;
use crate::clip::{search, settings, status, tags};
use crate::config::ClipvaultConfig;
use crate::embedding::ProviderRegistry;

/// The clipvault MCP tool handler. Holds shared state (db connection,
/// embedding registry, config) and exposes all MCP tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct ClipvaultTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    registry: Arc<ProviderRegistry>,
    config: Arc<ClipvaultConfig>,
    db_path: Arc<Option<PathBuf>>,
}

#[tool_router]
impl ClipvaultTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        registry: Arc<ProviderRegistry>,
        config: Arc<ClipvaultConfig>,
        db_path: Option<PathBuf>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            registry,
            config,
            db_path: Arc::new(db_path),
        }
    }

    fn filter_from(
        app: Option<String>,
        tag: Option<String>,
        since: Option<String>,
        until: Option<String>,
        pinned: Option<bool>,
    ) -> SearchFilter {
        SearchFilter {
            app,
            tag,
            since,
            until,
            pins_only: pinned.unwrap_or(false),
        }
    }

    /// Search stored clips by keyword or embedding similarity.
    #[tool(description = "Search clipboard history. Keyword mode (default) uses FTS5 syntax; set semantic=true for embedding similarity ranking.")]
    async fn search_clips(
        &self,
        Parameters(params): Parameters<SearchClipsParams>,
    ) -> Result<String, String> {
        if params.query.trim().is_empty() {
            return Err("query must not be empty".into());
        }
        let limit = params
            .limit
            .unwrap_or(self.config.retrieval.default_limit)
            .clamp(1, 100);
        let semantic = params.semantic.unwrap_or(false);
        let filter = Self::filter_from(
            params.app,
            params.tag,
            params.since,
            params.until,
            params.pinned,
        );

        tracing::info!(query = %params.query, semantic, limit, "search_clips called");

        let db = Arc::clone(&self.db);
        let pool = self.config.retrieval.semantic_pool;

        let results = if semantic {
            // Embed with the active provider (CPU-heavy → spawn_blocking)
            let registry = Arc::clone(&self.registry);
            let query = params.query.clone();
            tokio::task::spawn_blocking(move || {
                let conn = db
                    .lock()
                    .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
                let kind = settings::embedder_kind(&conn)?;
                let provider = registry.provider(kind);
                let embedding = provider
                    .embed(&query)
                    .map_err(|e| crate::clip::ClipError::Embedding(e.to_string()))?;
                let hits =
                    search::semantic_search(&conn, &embedding, provider.name(), &filter, limit, pool)?;
                Ok::<_, anyhow::Error>(hits)
            })
            .await
            .map_err(|e| format!("search task failed: {e}"))?
            .map_err(|e| format!("search failed: {e}"))?
        } else {
            let query = params.query.clone();
            tokio::task::spawn_blocking(move || {
                let conn = db
                    .lock()
                    .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
                let hits = search::keyword_search(&conn, &query, &filter, limit)?;
                Ok::<_, anyhow::Error>(hits)
            })
            .await
            .map_err(|e| format!("search task failed: {e}"))?
            .map_err(|e| format!("search failed: {e}"))?
        };

        let total = results.len();
        serde_json::to_string(&serde_json::json!({
            "clips": results,
            "total": total,
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// List the most recent clips.
    #[tool(description = "List the most recent clipboard captures, newest first, with optional app/tag/substring filters.")]
    async fn recent_clips(
        &self,
        Parameters(params): Parameters<RecentClipsParams>,
    ) -> Result<String, String> {
        let limit = params
            .limit
            .unwrap_or(self.config.retrieval.default_limit)
            .clamp(1, 100);
        let filter = Self::filter_from(params.app, params.tag, None, None, params.pinned);

        let db = Arc::clone(&self.db);
        let contains = params.contains;
        let results = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            let hits = search::recent(&conn, &filter, contains.as_deref(), limit)?;
            Ok::<_, anyhow::Error>(hits)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("listing failed: {e}"))?;

        let total = results.len();
        serde_json::to_string(&serde_json::json!({
            "clips": results,
            "total": total,
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Store a piece of text as if it were captured from the clipboard.
    #[tool(description = "Store text in the vault. Goes through the same classification, secret filtering, and dedup as clipboard captures.")]
    async fn ingest_text(
        &self,
        Parameters(params): Parameters<IngestTextParams>,
    ) -> Result<String, String> {
        if params.content.is_empty() {
            return Err("content must not be empty".into());
        }

        tracing::info!(content_len = params.content.len(), "ingest_text called");

        let db = Arc::clone(&self.db);
        let registry = Arc::clone(&self.registry);
        let db_path = Arc::clone(&self.db_path);
        let event = RawEvent {
            content: params.content,
            source_app: params.source.unwrap_or_else(|| "mcp".into()),
            window_title: None,
        };
        let tag_list = params.tags.unwrap_or_default();

        let outcome = tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            let outcome = capture::capture(
                &mut conn,
                &registry,
                &event,
                db_path.as_deref(),
                &capture::NullNotifier,
            )?;
            if let crate::clip::types::CaptureOutcome::Persisted { id } = &outcome {
                for tag in &tag_list {
                    tags::assign_tag_capped(&mut conn, *id, tag)?;
                }
            }
            Ok::<_, anyhow::Error>(outcome)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("ingest failed: {e}"))?;

        serde_json::to_string(&outcome).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Report vault status: counts, caps, active policy, warnings.
    #[tool(description = "Get vault status: clip counts, database size, caps, active embedder, eviction mode, and backpressure warnings.")]
    async fn clip_status(
        &self,
        Parameters(_params): Parameters<ClipStatusParams>,
    ) -> Result<String, String> {
        let db = Arc::clone(&self.db);
        let db_path = Arc::clone(&self.db_path);
        let snapshot = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            let snap = status::status(&conn, db_path.as_deref())?;
            Ok::<_, anyhow::Error>(snap)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("status failed: {e}"))?;

        serde_json::to_string(&snapshot).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for ClipvaultTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "clipvault is a local clipboard memory. Use search_clips to find past \
                 clips by keyword or meaning, recent_clips to list the latest captures, \
                 ingest_text to store text directly, and clip_status for vault health."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
