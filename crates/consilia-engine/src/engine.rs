//! The guidance engine: ingest, retrieval, and synthesis orchestration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use consilia_core::defaults::{GUIDANCE_MIN_SIMILARITY, INGEST_BATCH_SIZE};
use consilia_core::{
    ConversationRecord, ConversationRepository, EmbeddingBackend, Error, GuidanceResult,
    HealthState, HealthStatus, IngestReport, NewConversation, Result, SearchHit, SearchParams,
    SystemStats,
};

use crate::guidance;

/// Retrieval-augmented guidance engine.
///
/// Owns a conversation repository and an embedding backend and orchestrates
/// the three main flows: full-replace corpus ingest, similarity search over
/// the stored conversations, and deterministic guidance synthesis.
pub struct GuidanceEngine {
    repo: Arc<dyn ConversationRepository>,
    backend: Arc<dyn EmbeddingBackend>,
}

impl GuidanceEngine {
    pub fn new(repo: Arc<dyn ConversationRepository>, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { repo, backend }
    }

    /// Full-replace ingest: clear the corpus, then embed and persist the
    /// records in batches of [`INGEST_BATCH_SIZE`].
    ///
    /// An empty input is a legal wipe. A batch failure aborts the run with
    /// [`Error::IngestAborted`] naming the failed batch; already-persisted
    /// batches stay in place and the caller is expected to re-run.
    pub async fn ingest(&self, records: Vec<ConversationRecord>) -> Result<IngestReport> {
        let deleted = self.repo.clear().await?;
        info!(
            subsystem = "engine",
            op = "ingest",
            deleted,
            records = records.len(),
            "Cleared corpus for full-replace ingest"
        );

        let batch_count = records.chunks(INGEST_BATCH_SIZE).len();
        let mut stored = 0usize;

        for (index, chunk) in records.chunks(INGEST_BATCH_SIZE).enumerate() {
            let batch_no = index + 1;

            let texts: Vec<String> = chunk.iter().map(|record| record.combined_text()).collect();
            let embeddings = self.backend.embed_texts(&texts).await.map_err(|e| {
                Error::IngestAborted(format!(
                    "embedding batch {}/{}: {}",
                    batch_no, batch_count, e
                ))
            })?;

            let batch: Vec<NewConversation> = chunk
                .iter()
                .zip(embeddings)
                .map(|(record, embedding)| NewConversation::from_record(record, embedding))
                .collect();

            self.repo.insert_batch(batch).await.map_err(|e| {
                Error::IngestAborted(format!("storing batch {}/{}: {}", batch_no, batch_count, e))
            })?;

            stored += chunk.len();
            info!(
                subsystem = "engine",
                op = "ingest",
                batch = batch_no,
                batches = batch_count,
                stored,
                "Ingested batch"
            );
        }

        Ok(IngestReport {
            stored,
            batches: batch_count,
            embedding_model: self.backend.model_name().to_string(),
            embedding_dimension: self.backend.dimension(),
        })
    }

    /// Embed the query text and run a nearest-neighbor search.
    ///
    /// Parameters are validated before any provider call is made.
    pub async fn search(&self, params: SearchParams) -> Result<Vec<SearchHit>> {
        let SearchParams {
            query,
            top_k,
            min_similarity,
            category,
        } = params;

        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be blank".to_string()));
        }
        if top_k < 1 {
            return Err(Error::InvalidInput("top_k must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(Error::InvalidInput(
                "min_similarity must be between 0.0 and 1.0".to_string(),
            ));
        }

        let embeddings = self.backend.embed_texts(&[query]).await?;
        let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
            Error::Embedding("Provider returned no embedding for query".to_string())
        })?;

        let hits = self
            .repo
            .search(&query_embedding, top_k, min_similarity, category)
            .await?;

        debug!(
            subsystem = "engine",
            op = "search",
            top_k,
            min_similarity,
            hits = hits.len(),
            "Similarity search complete"
        );

        Ok(hits)
    }

    /// Retrieve similar cases and synthesize advisory guidance.
    ///
    /// The retrieval query is the patient context and therapist question
    /// joined with a single space. Retrieval always uses the fixed
    /// [`GUIDANCE_MIN_SIMILARITY`] floor; caller thresholds do not apply here.
    pub async fn generate_guidance(
        &self,
        patient_context: &str,
        therapist_question: &str,
        top_k: i64,
    ) -> Result<GuidanceResult> {
        if patient_context.trim().is_empty() {
            return Err(Error::InvalidInput(
                "patient_context must not be blank".to_string(),
            ));
        }
        if therapist_question.trim().is_empty() {
            return Err(Error::InvalidInput(
                "therapist_question must not be blank".to_string(),
            ));
        }

        let params = SearchParams {
            query: format!("{} {}", patient_context, therapist_question),
            top_k,
            min_similarity: GUIDANCE_MIN_SIMILARITY,
            category: None,
        };
        let similar_cases = self.search(params).await?;

        let result = GuidanceResult {
            guidance: guidance::compose_guidance(&similar_cases),
            confidence_score: guidance::confidence(&similar_cases),
            warnings: guidance::extract_warnings(patient_context),
            recommendations: guidance::build_recommendations(&similar_cases),
            similar_cases,
        };

        info!(
            subsystem = "engine",
            op = "guidance",
            cases = result.similar_cases.len(),
            confidence = result.confidence_score,
            "Synthesized guidance"
        );

        Ok(result)
    }

    /// Corpus statistics. A store failure degrades the result instead of
    /// erroring, so status surfaces stay serveable.
    pub async fn stats(&self) -> SystemStats {
        match self.repo.aggregate_stats().await {
            Ok(aggregates) => SystemStats::loaded(
                aggregates,
                self.backend.model_name(),
                self.backend.dimension(),
            ),
            Err(e) => {
                warn!(subsystem = "engine", op = "stats", error = %e, "Stats query failed");
                SystemStats::degraded(
                    e.to_string(),
                    self.backend.model_name(),
                    self.backend.dimension(),
                )
            }
        }
    }

    /// Point-in-time health: `healthy` when the store is reachable and holds
    /// at least one conversation, `not_loaded` when reachable but empty,
    /// `error` when unreachable.
    pub async fn health(&self) -> HealthStatus {
        match self.repo.count().await {
            Ok(total) => {
                let loaded = total > 0;
                HealthStatus {
                    status: if loaded {
                        HealthState::Healthy
                    } else {
                        HealthState::NotLoaded
                    },
                    embeddings_loaded: loaded,
                    total_cases: total,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                warn!(subsystem = "engine", op = "health", error = %e, "Health check failed");
                HealthStatus {
                    status: HealthState::Error,
                    embeddings_loaded: false,
                    total_cases: 0,
                    timestamp: Utc::now(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use consilia_core::{Category, CorpusAggregates, StoredConversation, StoreStatus, Vector};
    use consilia_inference::mock::MockEmbeddingBackend;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct RecordedSearch {
        top_k: i64,
        min_similarity: f64,
        category: Option<Category>,
    }

    #[derive(Default)]
    struct StubRepository {
        hits: Vec<SearchHit>,
        aggregates: Option<CorpusAggregates>,
        total: i64,
        unreachable: bool,
        fail_insert: bool,
        cleared: Mutex<u32>,
        batches: Mutex<Vec<usize>>,
        searches: Mutex<Vec<RecordedSearch>>,
    }

    impl StubRepository {
        fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                ..Default::default()
            }
        }

        fn with_total(total: i64) -> Self {
            Self {
                total,
                ..Default::default()
            }
        }

        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl ConversationRepository for StubRepository {
        async fn clear(&self) -> Result<u64> {
            if self.unreachable {
                return Err(Error::Internal("store unreachable".to_string()));
            }
            *self.cleared.lock().unwrap() += 1;
            Ok(self.total as u64)
        }

        async fn insert_batch(&self, batch: Vec<NewConversation>) -> Result<()> {
            if self.unreachable || self.fail_insert {
                return Err(Error::Internal("store unreachable".to_string()));
            }
            self.batches.lock().unwrap().push(batch.len());
            Ok(())
        }

        async fn search(
            &self,
            _query_embedding: &Vector,
            top_k: i64,
            min_similarity: f64,
            category: Option<Category>,
        ) -> Result<Vec<SearchHit>> {
            if self.unreachable {
                return Err(Error::Internal("store unreachable".to_string()));
            }
            self.searches.lock().unwrap().push(RecordedSearch {
                top_k,
                min_similarity,
                category,
            });
            Ok(self.hits.clone())
        }

        async fn aggregate_stats(&self) -> Result<CorpusAggregates> {
            if self.unreachable {
                return Err(Error::Internal("store unreachable".to_string()));
            }
            Ok(self.aggregates.clone().unwrap_or_default())
        }

        async fn count(&self) -> Result<i64> {
            if self.unreachable {
                return Err(Error::Internal("store unreachable".to_string()));
            }
            Ok(self.total)
        }
    }

    fn engine_with(
        repo: StubRepository,
        backend: MockEmbeddingBackend,
    ) -> (GuidanceEngine, Arc<StubRepository>) {
        let repo = Arc::new(repo);
        let engine = GuidanceEngine::new(repo.clone(), Arc::new(backend));
        (engine, repo)
    }

    fn record(id: i64) -> ConversationRecord {
        ConversationRecord {
            id,
            context: format!("patient context number {}", id),
            response: format!("therapeutic response number {}", id),
            category: Category::General,
            quality_score: 75.0,
            context_length: 26,
            response_length: 31,
        }
    }

    fn stored_hit(response: &str, category: Category, similarity: f64) -> SearchHit {
        SearchHit {
            similarity,
            conversation: StoredConversation {
                id: Uuid::new_v4(),
                context: "a stored patient context".to_string(),
                response: response.to_string(),
                category,
                quality_score: 80.0,
                context_length: 24,
                response_length: response.chars().count() as i32,
                extra_data: serde_json::Value::Null,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_ingest_batches_and_report() {
        let backend = MockEmbeddingBackend::new();
        let (engine, repo) = engine_with(StubRepository::default(), backend.clone());

        let records: Vec<ConversationRecord> = (1..=250).map(record).collect();
        let first_text = records[0].combined_text();

        let report = engine.ingest(records).await.unwrap();

        assert_eq!(report.stored, 250);
        assert_eq!(report.batches, 3);
        assert_eq!(report.embedding_model, "mock-embed");
        assert_eq!(report.embedding_dimension, 384);

        assert_eq!(*repo.cleared.lock().unwrap(), 1);
        assert_eq!(
            *repo.batches.lock().unwrap(),
            vec![INGEST_BATCH_SIZE, INGEST_BATCH_SIZE, 50]
        );
        assert_eq!(backend.embed_count(), 250);
        assert_eq!(backend.embedded_texts()[0], first_text);
    }

    #[tokio::test]
    async fn test_ingest_empty_input_still_clears() {
        let backend = MockEmbeddingBackend::new();
        let (engine, repo) = engine_with(StubRepository::default(), backend.clone());

        let report = engine.ingest(Vec::new()).await.unwrap();

        assert_eq!(report.stored, 0);
        assert_eq!(report.batches, 0);
        assert_eq!(*repo.cleared.lock().unwrap(), 1);
        assert_eq!(backend.embed_count(), 0);
    }

    #[tokio::test]
    async fn test_ingest_aborts_on_embedding_failure() {
        let backend = MockEmbeddingBackend::new().with_failure_rate(1.0);
        let (engine, repo) = engine_with(StubRepository::default(), backend);

        let records: Vec<ConversationRecord> = (1..=5).map(record).collect();
        let err = engine.ingest(records).await.unwrap_err();

        match err {
            Error::IngestAborted(msg) => {
                assert!(msg.contains("embedding batch 1/1"), "got: {}", msg);
            }
            other => panic!("expected IngestAborted, got {:?}", other),
        }
        assert!(repo.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_aborts_when_store_rejects_batch() {
        let repo = StubRepository {
            fail_insert: true,
            ..Default::default()
        };
        let (engine, _repo) = engine_with(repo, MockEmbeddingBackend::new());

        let records: Vec<ConversationRecord> = (1..=3).map(record).collect();
        let err = engine.ingest(records).await.unwrap_err();

        match err {
            Error::IngestAborted(msg) => {
                assert!(msg.contains("storing batch 1/1"), "got: {}", msg);
            }
            other => panic!("expected IngestAborted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_validates_before_embedding() {
        let backend = MockEmbeddingBackend::new();
        let (engine, _repo) = engine_with(StubRepository::default(), backend.clone());

        let blank = SearchParams {
            query: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            engine.search(blank).await,
            Err(Error::InvalidInput(_))
        ));

        let zero_k = SearchParams {
            query: "a valid query".to_string(),
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            engine.search(zero_k).await,
            Err(Error::InvalidInput(_))
        ));

        let negative_floor = SearchParams {
            query: "a valid query".to_string(),
            min_similarity: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            engine.search(negative_floor).await,
            Err(Error::InvalidInput(_))
        ));

        let high_floor = SearchParams {
            query: "a valid query".to_string(),
            min_similarity: 1.1,
            ..Default::default()
        };
        assert!(matches!(
            engine.search(high_floor).await,
            Err(Error::InvalidInput(_))
        ));

        // None of the rejected calls reached the provider.
        assert_eq!(backend.embed_count(), 0);
    }

    #[tokio::test]
    async fn test_search_embeds_query_and_passes_params() {
        let hits = vec![stored_hit("a response", Category::Anxiety, 0.88)];
        let backend = MockEmbeddingBackend::new();
        let (engine, repo) = engine_with(StubRepository::with_hits(hits), backend.clone());

        let params = SearchParams {
            query: "feeling very anxious lately".to_string(),
            top_k: 7,
            min_similarity: 0.25,
            category: Some(Category::Anxiety),
        };
        let results = engine.search(params).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(backend.embedded_texts(), vec!["feeling very anxious lately"]);

        let searches = repo.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].top_k, 7);
        assert!((searches[0].min_similarity - 0.25).abs() < 1e-9);
        assert_eq!(searches[0].category, Some(Category::Anxiety));
    }

    #[tokio::test]
    async fn test_search_surfaces_store_errors() {
        let (engine, _repo) = engine_with(StubRepository::unreachable(), MockEmbeddingBackend::new());

        let params = SearchParams {
            query: "a valid query".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            engine.search(params).await,
            Err(Error::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_guidance_query_joins_context_and_question() {
        let backend = MockEmbeddingBackend::new();
        let (engine, repo) = engine_with(StubRepository::default(), backend.clone());

        engine
            .generate_guidance(
                "patient reports constant worry and restlessness",
                "how should I approach treatment",
                3,
            )
            .await
            .unwrap();

        assert_eq!(
            backend.embedded_texts(),
            vec!["patient reports constant worry and restlessness how should I approach treatment"]
        );

        let searches = repo.searches.lock().unwrap();
        assert_eq!(searches[0].top_k, 3);
        assert!((searches[0].min_similarity - GUIDANCE_MIN_SIMILARITY).abs() < 1e-9);
        assert_eq!(searches[0].category, None);
    }

    #[tokio::test]
    async fn test_guidance_result_composition() {
        let hits = vec![
            stored_hit(
                "cognitive restructuring helped in this case",
                Category::Depression,
                0.9,
            ),
            stored_hit("lean on a support network", Category::General, 0.7),
        ];
        let (engine, _repo) = engine_with(StubRepository::with_hits(hits), MockEmbeddingBackend::new());

        let result = engine
            .generate_guidance(
                "patient reports low mood for several months",
                "what should I focus on first",
                3,
            )
            .await
            .unwrap();

        assert!(result
            .guidance
            .starts_with("Based on 2 similar cases in our database"));
        assert_eq!(result.similar_cases.len(), 2);
        // 0.8 mean similarity scaled by 2 of 5 saturation cases.
        assert!((result.confidence_score - 0.32).abs() < 1e-9);
        assert_eq!(
            result.warnings,
            vec!["OK: No immediate risk indicators detected in provided context"]
        );
        assert!(result.recommendations.contains(
            &"Consider depression-specific interventions (CBT, behavioral activation)".to_string()
        ));
    }

    #[tokio::test]
    async fn test_guidance_empty_retrieval_fallback() {
        let (engine, _repo) = engine_with(StubRepository::default(), MockEmbeddingBackend::new());

        let result = engine
            .generate_guidance(
                "patient mentions recurring nightmares lately",
                "is trauma work indicated",
                3,
            )
            .await
            .unwrap();

        assert!(result.guidance.starts_with("No similar cases found"));
        assert_eq!(result.confidence_score, 0.0);
        assert!(result.similar_cases.is_empty());
        assert_eq!(result.recommendations.len(), 4);
    }

    #[tokio::test]
    async fn test_guidance_validates_inputs() {
        let backend = MockEmbeddingBackend::new();
        let (engine, _repo) = engine_with(StubRepository::default(), backend.clone());

        assert!(matches!(
            engine.generate_guidance("  ", "a question", 3).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine.generate_guidance("a long enough context", "", 3).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            engine
                .generate_guidance("a long enough context", "a question", 0)
                .await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(backend.embed_count(), 0);
    }

    #[tokio::test]
    async fn test_stats_loaded() {
        let repo = StubRepository {
            aggregates: Some(CorpusAggregates {
                total: 7,
                categories: vec!["anxiety".to_string(), "depression".to_string()],
                avg_context_length: 120.0,
                avg_response_length: 88.5,
                avg_quality_score: 76.25,
            }),
            ..Default::default()
        };
        let (engine, _repo) = engine_with(repo, MockEmbeddingBackend::new());

        let stats = engine.stats().await;
        assert_eq!(stats.status, StoreStatus::Loaded);
        assert_eq!(stats.total_conversations, 7);
        assert_eq!(stats.embedding_model, "mock-embed");
        assert_eq!(stats.embedding_dimension, 384);
        assert_eq!(stats.categories, vec!["anxiety", "depression"]);
        assert!(stats.error.is_none());
    }

    #[tokio::test]
    async fn test_stats_degraded_on_store_failure() {
        let (engine, _repo) = engine_with(StubRepository::unreachable(), MockEmbeddingBackend::new());

        let stats = engine.stats().await;
        assert_eq!(stats.status, StoreStatus::Error);
        assert_eq!(stats.total_conversations, 0);
        assert!(stats
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("store unreachable"));
    }

    #[tokio::test]
    async fn test_health_reflects_corpus_state() {
        let (engine, _repo) = engine_with(StubRepository::with_total(5), MockEmbeddingBackend::new());
        let health = engine.health().await;
        assert_eq!(health.status, HealthState::Healthy);
        assert!(health.embeddings_loaded);
        assert_eq!(health.total_cases, 5);

        let (engine, _repo) = engine_with(StubRepository::default(), MockEmbeddingBackend::new());
        let health = engine.health().await;
        assert_eq!(health.status, HealthState::NotLoaded);
        assert!(!health.embeddings_loaded);
        assert_eq!(health.total_cases, 0);

        let (engine, _repo) = engine_with(StubRepository::unreachable(), MockEmbeddingBackend::new());
        let health = engine.health().await;
        assert_eq!(health.status, HealthState::Error);
        assert!(!health.embeddings_loaded);
        assert_eq!(health.total_cases, 0);
    }
}
