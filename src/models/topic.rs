use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

use crate::error::{AppError, AppResult};

/// Title given to the summary row when aggregation first creates it.
pub const DEFAULT_TOPIC_TITLE: &str = "Weibo topic overview";

/// Summary row derived from the comments table. Only the first row (lowest
/// id) is ever read.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    pub avg_sentiment_score: f64,
    pub created_at: Option<NaiveDateTime>,
}

/// Aggregated fields written into the summary row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TopicCounts {
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    pub avg_sentiment_score: f64,
}

impl Topic {
    pub async fn first(conn: &mut SqliteConnection) -> AppResult<Option<Topic>> {
        sqlx::query_as::<_, Topic>(
            "SELECT id, title, content, positive_count, negative_count, neutral_count, \
             avg_sentiment_score, created_at FROM topics ORDER BY id LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get topic: {}", e)))
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        title: &str,
        counts: TopicCounts,
    ) -> AppResult<Topic> {
        sqlx::query_as::<_, Topic>(
            "INSERT INTO topics (title, positive_count, negative_count, neutral_count, \
             avg_sentiment_score, created_at) VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, title, content, positive_count, negative_count, neutral_count, \
             avg_sentiment_score, created_at",
        )
        .bind(title)
        .bind(counts.positive_count)
        .bind(counts.negative_count)
        .bind(counts.neutral_count)
        .bind(counts.avg_sentiment_score)
        .bind(super::comment::local_now())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create topic: {}", e)))
    }

    pub async fn overwrite_counts(
        conn: &mut SqliteConnection,
        id: i64,
        counts: TopicCounts,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE topics SET positive_count = ?, negative_count = ?, neutral_count = ?, \
             avg_sentiment_score = ? WHERE id = ?",
        )
        .bind(counts.positive_count)
        .bind(counts.negative_count)
        .bind(counts.neutral_count)
        .bind(counts.avg_sentiment_score)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update topic {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Topic {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete_all(conn: &mut SqliteConnection) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM topics")
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete topics: {}", e)))?;
        Ok(result.rows_affected())
    }

    pub fn counts(&self) -> TopicCounts {
        TopicCounts {
            positive_count: self.positive_count,
            negative_count: self.negative_count,
            neutral_count: self.neutral_count,
            avg_sentiment_score: self.avg_sentiment_score,
        }
    }
}
