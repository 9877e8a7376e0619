//! Conversation repository backed by PostgreSQL + pgvector.
//!
//! Similarity is cosine: pgvector's `<=>` operator yields cosine distance,
//! and `1 - distance` is reported as the similarity score. The floor is
//! strict; hits at exactly `min_similarity` are excluded.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use consilia_core::{
    Category, ConversationRepository, CorpusAggregates, Error, NewConversation, Result, SearchHit,
    StoredConversation,
};

/// PostgreSQL implementation of [`ConversationRepository`].
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conversation_from_row(row: &PgRow) -> Result<StoredConversation> {
    let category = match row.get::<Option<String>, _>("category") {
        Some(name) => name.parse::<Category>().map_err(Error::Internal)?,
        None => Category::General,
    };

    Ok(StoredConversation {
        id: row.get("id"),
        context: row.get("context"),
        response: row.get("response"),
        category,
        quality_score: row.get("quality_score"),
        context_length: row.get("context_length"),
        response_length: row.get("response_length"),
        extra_data: row
            .get::<Option<serde_json::Value>, _>("extra_data")
            .unwrap_or(serde_json::Value::Null),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM conversations")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "conversations",
            op = "clear",
            deleted = result.rows_affected(),
            "Cleared conversation store"
        );
        Ok(result.rows_affected())
    }

    async fn insert_batch(&self, batch: Vec<NewConversation>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for item in &batch {
            sqlx::query(
                r#"
                INSERT INTO conversations
                    (context, response, category, quality_score, context_length,
                     response_length, embedding, extra_data)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&item.context)
            .bind(&item.response)
            .bind(item.category.as_str())
            .bind(item.quality_score)
            .bind(item.context_length)
            .bind(item.response_length)
            .bind(&item.embedding)
            .bind(&item.extra_data)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "conversations",
            op = "insert_batch",
            count = batch.len(),
            "Inserted conversation batch"
        );
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &Vector,
        top_k: i64,
        min_similarity: f64,
        category: Option<Category>,
    ) -> Result<Vec<SearchHit>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(
                    r#"
                    SELECT id, context, response, category, quality_score,
                           context_length, response_length, extra_data, created_at,
                           1 - (embedding <=> $1::vector) AS similarity
                    FROM conversations
                    WHERE embedding IS NOT NULL
                      AND 1 - (embedding <=> $1::vector) > $2
                      AND category = $3
                    ORDER BY embedding <=> $1::vector
                    LIMIT $4
                    "#,
                )
                .bind(query_embedding)
                .bind(min_similarity)
                .bind(category.as_str())
                .bind(top_k)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, context, response, category, quality_score,
                           context_length, response_length, extra_data, created_at,
                           1 - (embedding <=> $1::vector) AS similarity
                    FROM conversations
                    WHERE embedding IS NOT NULL
                      AND 1 - (embedding <=> $1::vector) > $2
                    ORDER BY embedding <=> $1::vector
                    LIMIT $3
                    "#,
                )
                .bind(query_embedding)
                .bind(min_similarity)
                .bind(top_k)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            hits.push(SearchHit {
                similarity: row.get("similarity"),
                conversation: conversation_from_row(row)?,
            });
        }

        debug!(
            subsystem = "database",
            component = "conversations",
            op = "search",
            result_count = hits.len(),
            min_similarity = min_similarity,
            "Vector search complete"
        );
        Ok(hits)
    }

    async fn aggregate_stats(&self) -> Result<CorpusAggregates> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   AVG(context_length)::float8 AS avg_context_length,
                   AVG(response_length)::float8 AS avg_response_length,
                   AVG(quality_score) AS avg_quality_score
            FROM conversations
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM conversations WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(CorpusAggregates {
            total: row.get("total"),
            categories,
            avg_context_length: row
                .get::<Option<f64>, _>("avg_context_length")
                .unwrap_or(0.0),
            avg_response_length: row
                .get::<Option<f64>, _>("avg_response_length")
                .unwrap_or(0.0),
            avg_quality_score: row
                .get::<Option<f64>, _>("avg_quality_score")
                .unwrap_or(0.0),
        })
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
