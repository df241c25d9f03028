// Topic aggregation - recomputes the summary row by full scan of comments

use futures::TryStreamExt;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::{Sentiment, Topic, TopicCounts, DEFAULT_TOPIC_TITLE};

/// Running per-label counts and score sum over a set of comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentTally {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub total: i64,
    pub score_sum: f64,
}

impl SentimentTally {
    /// Labels outside the known three still contribute to the mean.
    pub fn record(&mut self, label: &str, score: f64) {
        match Sentiment::parse(label) {
            Some(Sentiment::Positive) => self.positive += 1,
            Some(Sentiment::Negative) => self.negative += 1,
            Some(Sentiment::Neutral) => self.neutral += 1,
            None => {}
        }
        self.total += 1;
        self.score_sum += score;
    }

    /// `None` when nothing was recorded.
    pub fn counts(&self) -> Option<TopicCounts> {
        if self.total == 0 {
            return None;
        }
        Some(TopicCounts {
            positive_count: self.positive,
            negative_count: self.negative,
            neutral_count: self.neutral,
            avg_sentiment_score: self.score_sum / self.total as f64,
        })
    }
}

/// Recompute the topic summary from every stored comment.
///
/// With no comments this does nothing and an existing topic keeps its
/// previous values. Runs on the caller's connection so it can follow a write
/// in the same session.
pub async fn recompute_topic(conn: &mut SqliteConnection) -> AppResult<Option<TopicCounts>> {
    let mut tally = SentimentTally::default();
    {
        let mut rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT sentiment, sentiment_score FROM comments",
        )
        .fetch(&mut *conn);
        while let Some((sentiment, score)) = rows
            .try_next()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to scan comments: {}", e)))?
        {
            tally.record(&sentiment, score);
        }
    }

    let Some(counts) = tally.counts() else {
        debug!("No comments stored, leaving topic unchanged");
        return Ok(None);
    };

    match Topic::first(conn).await? {
        Some(topic) => Topic::overwrite_counts(conn, topic.id, counts).await?,
        None => {
            Topic::insert(conn, DEFAULT_TOPIC_TITLE, counts).await?;
        }
    }

    info!(
        positive = counts.positive_count,
        negative = counts.negative_count,
        neutral = counts.neutral_count,
        avg_score = counts.avg_sentiment_score,
        "Topic statistics updated"
    );
    Ok(Some(counts))
}
