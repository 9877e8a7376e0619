//! Core traits for consilia abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable embedding backends and testable storage.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONVERSATION REPOSITORY
// =============================================================================

/// Request for persisting one embedded conversation.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub context: String,
    pub response: String,
    pub category: Category,
    pub quality_score: f64,
    pub context_length: i32,
    pub response_length: i32,
    /// Embedding of the record's combined text, store-dimension vector.
    pub embedding: Vector,
    /// Provenance blob: transform-time id and the combined embed text.
    pub extra_data: JsonValue,
}

impl NewConversation {
    /// Build a persistence request from a transform record and its embedding.
    pub fn from_record(record: &ConversationRecord, embedding: Vector) -> Self {
        let extra_data = serde_json::json!({
            "original_id": record.id,
            "combined_text": record.combined_text(),
        });
        Self {
            context: record.context.clone(),
            response: record.response.clone(),
            category: record.category,
            quality_score: record.quality_score,
            context_length: record.context_length,
            response_length: record.response_length,
            embedding,
            extra_data,
        }
    }
}

/// Repository for the persisted conversation corpus.
///
/// One table, replaced wholesale at ingest time; searches are read-only and
/// safe to run concurrently.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Delete every persisted conversation. Returns the number removed.
    async fn clear(&self) -> Result<u64>;

    /// Persist a batch of embedded conversations in a single transaction.
    async fn insert_batch(&self, batch: Vec<NewConversation>) -> Result<()>;

    /// Nearest-neighbor search by cosine distance.
    ///
    /// Returns at most `top_k` hits with `similarity > min_similarity`
    /// (strict), optionally restricted to one category, ordered by descending
    /// similarity. Exact similarity ties follow the store's natural order.
    async fn search(
        &self,
        query_embedding: &Vector,
        top_k: i64,
        min_similarity: f64,
        category: Option<Category>,
    ) -> Result<Vec<SearchHit>>;

    /// Corpus-wide aggregates for the stats surface.
    async fn aggregate_stats(&self) -> Result<CorpusAggregates>;

    /// Number of persisted conversations.
    async fn count(&self) -> Result<i64>;
}

// =============================================================================
// SEARCH PARAMETERS
// =============================================================================

/// Parameters for a similarity search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub top_k: i64,
    /// Strict lower bound on similarity, in [0, 1].
    pub min_similarity: f64,
    pub category: Option<Category>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: crate::defaults::SEARCH_TOP_K,
            min_similarity: crate::defaults::SEARCH_MIN_SIMILARITY,
            category: None,
        }
    }
}

// =============================================================================
// EMBEDDING BACKEND
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts in one provider call.
    ///
    /// Returns one vector per input text, in input order. An empty input is a
    /// legal no-op returning an empty vector without a provider call.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
