//! Local clipboard long-term memory.
//!
//! clipvault watches the clipboard (and accepts text and file drops), stores every
//! distinct snippet in a single SQLite file, and makes the archive searchable
//! by keyword and by meaning. Identical content is never stored twice — a
//! repeat capture records a sighting on the existing clip instead. Caps on
//! count and database size are enforced after every insert with a FIFO or
//! pin-aware tiered eviction policy.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with FTS5 for keyword search and
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for vector search
//! - **Embeddings**: a deterministic hash embedder (always available) or a
//!   local ONNX model (e5-small-v2), both 128 dimensions, L2-normalized
//! - **Capture**: a 1-second polling loop that classifies, deduplicates,
//!   embeds, and stores each observed clip as one atomic transaction
//! - **Transport**: CLI, plus MCP over stdio or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`embedding`] — Text-to-vector providers (hash and ONNX) behind one trait
//! - [`clip`] — Core engine: classify, store, search, evict, federate
//! - [`capture`] — The capture pipeline and the polling watch loop

pub mod capture;
pub mod clip;
pub mod config;
pub mod db;
pub mod embedding;
