//! consilia-api - HTTP API server for consilia

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use consilia_core::defaults::{
    self, GUIDANCE_TOP_K, GUIDANCE_TOP_K_MAX, MAX_BODY_SIZE_BYTES, PATIENT_CONTEXT_MIN_CHARS,
    QUERY_MIN_CHARS, QUESTION_MIN_CHARS, REQUEST_MIN_SIMILARITY, SEARCH_TOP_K, SEARCH_TOP_K_MAX,
    SERVER_HOST,
};
use consilia_core::{Category, EmbeddingBackend, SearchHit, SearchParams, StoreStatus};
use consilia_db::Database;
use consilia_engine::GuidanceEngine;
use consilia_inference::OpenAIBackend;

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<GuidanceEngine>,
}

// =============================================================================
// CORS
// =============================================================================

/// Build the CORS layer from the environment.
///
/// `CORS_ORIGIN` takes a comma-separated origin whitelist; unset or empty
/// allows any origin.
fn cors_layer() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let origins = std::env::var("CORS_ORIGIN").unwrap_or_default();
    if origins.trim().is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   RUST_LOG    - standard env filter (default: "consilia_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "consilia_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| SERVER_HOST.to_string());
    let port = defaults::server_port_from_env();

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize the embedding backend
    let backend = OpenAIBackend::from_env()?;
    info!(
        model = backend.model_name(),
        dimension = backend.dimension(),
        "Embedding backend initialized"
    );

    let engine = Arc::new(GuidanceEngine::new(
        Arc::new(db.conversations),
        Arc::new(backend),
    ));
    let state = AppState { engine };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/stats", get(get_stats))
        .route("/api/v1/search", post(search_cases))
        .route("/api/v1/guidance", post(guidance))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/sample-queries", get(sample_queries))
        .route("/api/v1/info", get(api_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE_BYTES))
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// HEALTH & STATS HANDLERS
// =============================================================================

/// Always 200; the status field carries healthy/not_loaded/error.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.health().await)
}

async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.engine.stats().await;
    if stats.status != StoreStatus::Loaded {
        return Err(ApiError::Unavailable(
            "System not properly loaded".to_string(),
        ));
    }
    Ok(Json(stats))
}

// =============================================================================
// SEARCH HANDLER
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchBody {
    query: String,
    top_k: Option<i64>,
    min_similarity: Option<f64>,
    category: Option<String>,
}

impl SearchBody {
    /// Validate request bounds and build engine parameters.
    fn into_params(self) -> Result<SearchParams, ApiError> {
        if self.query.chars().count() < QUERY_MIN_CHARS {
            return Err(ApiError::BadRequest(format!(
                "query must be at least {} characters",
                QUERY_MIN_CHARS
            )));
        }

        let top_k = self.top_k.unwrap_or(SEARCH_TOP_K);
        if !(1..=SEARCH_TOP_K_MAX).contains(&top_k) {
            return Err(ApiError::BadRequest(format!(
                "top_k must be between 1 and {}",
                SEARCH_TOP_K_MAX
            )));
        }

        let min_similarity = self.min_similarity.unwrap_or(REQUEST_MIN_SIMILARITY);
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(ApiError::BadRequest(
                "min_similarity must be between 0.0 and 1.0".to_string(),
            ));
        }

        let category = match self.category.as_deref() {
            Some(raw) => Some(raw.parse::<Category>().map_err(ApiError::BadRequest)?),
            None => None,
        };

        Ok(SearchParams {
            query: self.query,
            top_k,
            min_similarity,
            category,
        })
    }
}

/// Wire view of a search hit, flattened for API consumers.
#[derive(Debug, Serialize)]
struct CaseResult {
    similarity: f64,
    context: String,
    response: String,
    category: Category,
    quality_score: f64,
    context_length: i32,
    response_length: i32,
}

impl From<SearchHit> for CaseResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            similarity: hit.similarity,
            context: hit.conversation.context,
            response: hit.conversation.response,
            category: hit.conversation.category,
            quality_score: hit.conversation.quality_score,
            context_length: hit.conversation.context_length,
            response_length: hit.conversation.response_length,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<CaseResult>,
    total_found: usize,
    query: String,
}

async fn search_cases(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body.into_params()?;
    let query = params.query.clone();

    let hits = state.engine.search(params).await?;
    let results: Vec<CaseResult> = hits.into_iter().map(CaseResult::from).collect();

    Ok(Json(SearchResponse {
        total_found: results.len(),
        results,
        query,
    }))
}

// =============================================================================
// GUIDANCE HANDLER
// =============================================================================

#[derive(Debug, Deserialize)]
struct GuidanceBody {
    patient_context: String,
    therapist_question: String,
    top_k: Option<i64>,
}

impl GuidanceBody {
    /// Validate request bounds; returns the effective top_k.
    fn validate(&self) -> Result<i64, ApiError> {
        if self.patient_context.chars().count() < PATIENT_CONTEXT_MIN_CHARS {
            return Err(ApiError::BadRequest(format!(
                "patient_context must be at least {} characters",
                PATIENT_CONTEXT_MIN_CHARS
            )));
        }
        if self.therapist_question.chars().count() < QUESTION_MIN_CHARS {
            return Err(ApiError::BadRequest(format!(
                "therapist_question must be at least {} characters",
                QUESTION_MIN_CHARS
            )));
        }

        let top_k = self.top_k.unwrap_or(GUIDANCE_TOP_K);
        if !(1..=GUIDANCE_TOP_K_MAX).contains(&top_k) {
            return Err(ApiError::BadRequest(format!(
                "top_k must be between 1 and {}",
                GUIDANCE_TOP_K_MAX
            )));
        }

        Ok(top_k)
    }
}

#[derive(Debug, Serialize)]
struct GuidanceResponse {
    guidance: String,
    confidence_score: f64,
    similar_cases: Vec<CaseResult>,
    warnings: Vec<String>,
    recommendations: Vec<String>,
}

async fn guidance(
    State(state): State<AppState>,
    Json(body): Json<GuidanceBody>,
) -> Result<impl IntoResponse, ApiError> {
    let top_k = body.validate()?;

    let result = state
        .engine
        .generate_guidance(&body.patient_context, &body.therapist_question, top_k)
        .await?;

    Ok(Json(GuidanceResponse {
        guidance: result.guidance,
        confidence_score: result.confidence_score,
        similar_cases: result
            .similar_cases
            .into_iter()
            .map(CaseResult::from)
            .collect(),
        warnings: result.warnings,
        recommendations: result.recommendations,
    }))
}

// =============================================================================
// METADATA HANDLERS
// =============================================================================

async fn list_categories() -> impl IntoResponse {
    let categories: Vec<&'static str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    Json(serde_json::json!({ "categories": categories }))
}

async fn sample_queries() -> impl IntoResponse {
    Json(serde_json::json!({
        "sample_queries": [
            "Patient feeling depressed and having trouble sleeping",
            "Anxiety and panic attacks in social situations",
            "Relationship problems and communication issues",
            "Low self-esteem and feelings of worthlessness",
            "Trauma recovery and PTSD symptoms",
            "Teenage depression and family conflicts",
        ]
    }))
}

async fn api_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Consilia API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented guidance over a corpus of therapeutic conversations",
        "endpoints": {
            "GET /health": "Health check",
            "GET /api/v1/stats": "Corpus statistics",
            "POST /api/v1/search": "Search similar cases",
            "POST /api/v1/guidance": "Generate therapeutic guidance",
            "GET /api/v1/categories": "Available categories",
            "GET /api/v1/sample-queries": "Sample queries for testing",
        }
    }))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Embedding provider failure, surfaced as 502.
    Upstream(String),
    /// Store unreachable, surfaced as 503.
    Unavailable(String),
    Internal(consilia_core::Error),
}

impl From<consilia_core::Error> for ApiError {
    fn from(err: consilia_core::Error) -> Self {
        match &err {
            consilia_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            consilia_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            consilia_core::Error::Embedding(_) | consilia_core::Error::Request(_) => {
                ApiError::Upstream(err.to_string())
            }
            consilia_core::Error::Database(_) => ApiError::Unavailable(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
