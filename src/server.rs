//! MCP server initialization for stdio and streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! database, embedding registry, and MCP tool handler into a running server.

use crate::config::ClipvaultConfig;
use crate::db;
use crate::embedding::ProviderRegistry;
use crate::tools::ClipvaultTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared setup: open DB and build the embedding registry. Returns the
/// pieces wrapped in Arc for sharing across sessions.
fn setup_shared_state(
    config: ClipvaultConfig,
) -> Result<(
    Arc<Mutex<rusqlite::Connection>>,
    Arc<ProviderRegistry>,
    Arc<ClipvaultConfig>,
    PathBuf,
)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let db = Arc::new(Mutex::new(conn));
    let registry = Arc::new(ProviderRegistry::new(config.embedding.clone()));
    let config = Arc::new(config);

    Ok((db, registry, config, db_path))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: ClipvaultConfig) -> Result<()> {
    tracing::info!("starting clipvault MCP server on stdio");

    let (db, registry, config, db_path) = setup_shared_state(config)?;

    let tools = ClipvaultTools::new(db, registry, config, Some(db_path));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over streamable HTTP transport.
pub async fn serve_http(config: ClipvaultConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting clipvault MCP server on HTTP");

    let (db, registry, config, db_path) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || {
            Ok(ClipvaultTools::new(
                db.clone(),
                registry.clone(),
                config.clone(),
                Some(db_path.clone()),
            ))
        },
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
