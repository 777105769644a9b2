//! Core clip type definitions.
//!
//! Defines [`Clip`] (a full record), [`ClipSummary`] (search/list results),
//! [`CaptureOutcome`] and [`RejectReason`] (pipeline terminal states),
//! [`EvictMode`], and [`SearchFilter`].

use serde::{Deserialize, Serialize};

/// A captured clip, matching the `clips` table schema. Content is immutable
/// once created; only pin state, tags, and notes change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// SQLite rowid primary key.
    pub id: i64,
    /// ISO 8601 creation timestamp (UTC).
    pub created_at: String,
    /// Frontmost application at capture time, or the ingestion source.
    pub source_app: String,
    /// Window title at capture time, if known.
    pub window_title: Option<String>,
    /// Short display title (first line by default).
    pub title: Option<String>,
    /// The full captured text.
    pub content: String,
    /// SHA-256 hex digest of the content; unique among live clips.
    pub hash: String,
    /// Detected language code, or `"unk"`.
    pub lang: String,
    /// Pinned clips are protected from tiered eviction.
    pub pinned: bool,
    /// Which embedding provider produced this clip's vector.
    pub embedder: String,
    /// How many times this exact content has been observed.
    pub sightings: u32,
    /// Tag names attached to this clip.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A compact result row returned by search and listing operations.
#[derive(Debug, Clone, Serialize)]
pub struct ClipSummary {
    pub id: i64,
    pub created_at: String,
    pub source_app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Content truncated for display.
    pub preview: String,
    pub pinned: bool,
    /// Relevance score: cosine similarity for semantic results, negated
    /// bm25 rank for keyword results. `None` for plain listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Terminal state of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// The classifier refused the content; nothing was persisted.
    Rejected { reason: RejectReason },
    /// Identical content was already live; a sighting was recorded.
    Deduplicated { id: i64 },
    /// A new clip, vector, and index row were stored atomically.
    Persisted { id: i64 },
}

/// Why the classifier refused a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Content was empty or whitespace-only.
    Empty,
    /// Content exceeded the configured `max_bytes`.
    TooLarge { bytes: usize, max: usize },
    /// Content matched a credential pattern and `allow_secrets` is off.
    SecretLike,
    /// The source application is on the blocklist.
    Blocklisted,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty content"),
            Self::TooLarge { bytes, max } => write!(f, "too large ({bytes} bytes > max {max})"),
            Self::SecretLike => write!(f, "looks like a secret (pattern match)"),
            Self::Blocklisted => write!(f, "source app is blocklisted"),
        }
    }
}

/// Eviction strategy applied when a scope exceeds its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictMode {
    /// Remove oldest-by-timestamp entries, pinned or not.
    Fifo,
    /// Remove oldest non-pinned entries first. CAUTION: if a scope is over
    /// cap and holds only pinned entries, the oldest pinned entries are
    /// evicted anyway — pins delay eviction, they do not make data immortal.
    Tiered,
}

impl EvictMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Tiered => "tiered",
        }
    }
}

impl std::fmt::Display for EvictMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EvictMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "tiered" => Ok(Self::Tiered),
            other => Err(format!("unknown evict mode: {other}. Supported: fifo, tiered")),
        }
    }
}

/// Filters shared by keyword search, semantic search, listing, and export.
/// Time bounds are ISO 8601 strings compared as `[since, until)`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub app: Option<String>,
    pub tag: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub pins_only: bool,
}

/// Truncate content to `max_chars`, appending "..." if truncated.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    let flat = content.replace('\n', "\\n");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
