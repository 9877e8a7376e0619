//! Core data models for consilia.
//!
//! These types are shared across all consilia crates and represent the
//! conversation corpus domain: cleaned conversation records, their persisted
//! form, search hits, synthesized guidance, and the stats/health surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// CATEGORY
// =============================================================================

/// Topic category assigned to a conversation pair.
///
/// A closed set; every conversation carries exactly one value. `General` is
/// the fallback when no category keyword matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Depression,
    Anxiety,
    Relationships,
    Trauma,
    SelfEsteem,
    Therapy,
    #[default]
    General,
}

impl Category {
    /// All categories, keyword-bearing ones first in their fixed priority
    /// order, `General` last.
    pub const ALL: [Category; 7] = [
        Category::Depression,
        Category::Anxiety,
        Category::Relationships,
        Category::Trauma,
        Category::SelfEsteem,
        Category::Therapy,
        Category::General,
    ];

    /// Wire/storage name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Depression => "depression",
            Self::Anxiety => "anxiety",
            Self::Relationships => "relationships",
            Self::Trauma => "trauma",
            Self::SelfEsteem => "self_esteem",
            Self::Therapy => "therapy",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "depression" => Ok(Self::Depression),
            "anxiety" => Ok(Self::Anxiety),
            "relationships" => Ok(Self::Relationships),
            "trauma" => Ok(Self::Trauma),
            "self_esteem" => Ok(Self::SelfEsteem),
            "therapy" => Ok(Self::Therapy),
            "general" => Ok(Self::General),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

// =============================================================================
// CONVERSATION TYPES
// =============================================================================

/// A cleaned conversation pair with derived fields, produced by the offline
/// transform. Immutable once emitted; an embedding is attached at ingest.
///
/// Serde names match the tabular column order the transform emits:
/// `id, Context, Response, category, quality_score, context_length,
/// response_length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Sequential 1-based id assigned at transform time.
    pub id: i64,
    /// Cleaned patient-situation text, > 20 chars.
    #[serde(rename = "Context")]
    pub context: String,
    /// Cleaned therapeutic reply text, > 10 chars.
    #[serde(rename = "Response")]
    pub response: String,
    pub category: Category,
    /// Heuristic usefulness score in [0, 100].
    pub quality_score: f64,
    /// Character count (Unicode scalars) of the cleaned context.
    pub context_length: i32,
    /// Character count (Unicode scalars) of the cleaned response.
    pub response_length: i32,
}

impl ConversationRecord {
    /// Text submitted to the embedding provider for this record.
    pub fn combined_text(&self) -> String {
        format!("Context: {} Response: {}", self.context, self.response)
    }
}

/// A persisted conversation as returned from the store (metadata view; the
/// embedding vector itself is never read back).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConversation {
    /// Opaque store identifier, assigned at ingest.
    pub id: Uuid,
    pub context: String,
    pub response: String,
    pub category: Category,
    pub quality_score: f64,
    pub context_length: i32,
    pub response_length: i32,
    /// Provenance blob: transform-time id and the combined embed text.
    pub extra_data: JsonValue,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// EMBEDDING TYPES
// =============================================================================

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

// =============================================================================
// SEARCH & GUIDANCE TYPES
// =============================================================================

/// A similarity search result. Ephemeral, produced per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Cosine similarity to the query, in [0, 1].
    pub similarity: f64,
    pub conversation: StoredConversation,
}

/// Structured advisory output synthesized from retrieved cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceResult {
    /// Composed guidance text, or the fixed fallback when no cases matched.
    pub guidance: String,
    /// Trust measure in [0, 0.95]; exactly 0.0 when no cases were retrieved.
    pub confidence_score: f64,
    pub similar_cases: Vec<SearchHit>,
    /// Risk warnings extracted from the patient context, `WARNING:`/`OK:`
    /// prefixed.
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Result of a full-replace corpus ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Conversations persisted.
    pub stored: usize,
    /// Batches embedded and written.
    pub batches: usize,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

// =============================================================================
// STATS & HEALTH TYPES
// =============================================================================

/// Whether the store answered the stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    /// Store reachable; aggregates are live values.
    Loaded,
    /// Store unreachable; aggregates are zeroed and `error` carries the cause.
    Error,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Raw per-corpus aggregates as computed by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusAggregates {
    pub total: i64,
    /// Distinct non-null categories present, storage names.
    pub categories: Vec<String>,
    pub avg_context_length: f64,
    pub avg_response_length: f64,
    pub avg_quality_score: f64,
}

/// Corpus statistics surface. On store failure this is a degraded value, not
/// an error: `status` flips to `Error` and `error` carries the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub status: StoreStatus,
    pub total_conversations: i64,
    pub embedding_dimension: usize,
    pub embedding_model: String,
    pub categories: Vec<String>,
    pub avg_context_length: f64,
    pub avg_response_length: f64,
    pub avg_quality_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SystemStats {
    /// Live stats from store aggregates.
    pub fn loaded(aggregates: CorpusAggregates, model: &str, dimension: usize) -> Self {
        Self {
            status: StoreStatus::Loaded,
            total_conversations: aggregates.total,
            embedding_dimension: dimension,
            embedding_model: model.to_string(),
            categories: aggregates.categories,
            avg_context_length: aggregates.avg_context_length,
            avg_response_length: aggregates.avg_response_length,
            avg_quality_score: aggregates.avg_quality_score,
            error: None,
        }
    }

    /// Degraded stats when the store is unreachable.
    pub fn degraded(message: String, model: &str, dimension: usize) -> Self {
        Self {
            status: StoreStatus::Error,
            total_conversations: 0,
            embedding_dimension: dimension,
            embedding_model: model.to_string(),
            categories: Vec::new(),
            avg_context_length: 0.0,
            avg_response_length: 0.0,
            avg_quality_score: 0.0,
            error: Some(message),
        }
    }
}

/// Service health state derived on demand from [`SystemStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Store reachable and the corpus holds at least one conversation.
    Healthy,
    /// Store reachable but no conversations have been ingested yet.
    NotLoaded,
    /// Store unreachable.
    Error,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::NotLoaded => write!(f, "not_loaded"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time service health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub embeddings_loaded: bool,
    pub total_cases: i64,
    pub timestamp: DateTime<Utc>,
}
