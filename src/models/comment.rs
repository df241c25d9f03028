use chrono::{Local, NaiveDateTime, SubsecRound, Timelike};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::sentiment::Sentiment;
use crate::error::{AppError, AppResult};

// Rows per multi-value INSERT; 4 binds each keeps well under SQLite's variable limit.
const INSERT_CHUNK: usize = 200;

/// A stored comment. `sentiment` is kept as text because the API stores
/// whatever label the client sent.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub timestamp: Option<NaiveDateTime>,
}

/// JSON shape of a comment in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub sentiment: String,
    pub sentiment_score: f64,
    pub timestamp: NaiveDateTime,
}

/// Current local time at microsecond precision.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// ISO-8601 with a `T` separator; microseconds only when non-zero.
fn iso_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

impl NewComment {
    /// Comment stamped with the current local time, scored from its label.
    pub fn new(content: impl Into<String>, sentiment: impl Into<String>) -> Self {
        let sentiment = sentiment.into();
        Self {
            content: content.into(),
            sentiment_score: Sentiment::score_for(&sentiment),
            sentiment,
            timestamp: local_now(),
        }
    }
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content.clone(),
            sentiment: comment.sentiment.clone(),
            sentiment_score: comment.sentiment_score,
            timestamp: comment.timestamp.as_ref().map(iso_timestamp),
        }
    }
}

impl Comment {
    pub async fn find(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, content, sentiment, sentiment_score, timestamp FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get comment {}: {}", id, e)))
    }

    pub async fn count(conn: &mut SqliteConnection, filter: Option<Sentiment>) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments");
        if let Some(sentiment) = filter {
            qb.push(" WHERE sentiment = ");
            qb.push_bind(sentiment.as_str());
        }

        let (count,): (i64,) = qb
            .build_query_as::<(i64,)>()
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count comments: {}", e)))?;
        Ok(count)
    }

    /// One page of comments in id order, optionally restricted to one label.
    pub async fn list(
        conn: &mut SqliteConnection,
        filter: Option<Sentiment>,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<Comment>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, content, sentiment, sentiment_score, timestamp FROM comments",
        );
        if let Some(sentiment) = filter {
            qb.push(" WHERE sentiment = ");
            qb.push_bind(sentiment.as_str());
        }
        qb.push(" ORDER BY id LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(skip);

        qb.build_query_as::<Comment>()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list comments: {}", e)))
    }

    pub async fn insert(conn: &mut SqliteConnection, new: &NewComment) -> AppResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (content, sentiment, sentiment_score, timestamp) VALUES (?, ?, ?, ?) \
             RETURNING id, content, sentiment, sentiment_score, timestamp",
        )
        .bind(&new.content)
        .bind(&new.sentiment)
        .bind(new.sentiment_score)
        .bind(new.timestamp)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert comment: {}", e)))
    }

    /// Multi-row insert; returns the number of rows written.
    pub async fn insert_batch(conn: &mut SqliteConnection, rows: &[NewComment]) -> AppResult<u64> {
        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "INSERT INTO comments (content, sentiment, sentiment_score, timestamp) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.content.as_str())
                    .push_bind(row.sentiment.as_str())
                    .push_bind(row.sentiment_score)
                    .push_bind(row.timestamp);
            });

            let result = qb.build().execute(&mut *conn).await.map_err(|e| {
                AppError::DatabaseError(format!("Failed to insert comment batch: {}", e))
            })?;
            written += result.rows_affected();
        }
        Ok(written)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete comment {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all(conn: &mut SqliteConnection) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM comments")
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete comments: {}", e)))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::SentimentDatabase;

    async fn setup() -> (tempfile::TempDir, SentimentDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default().database;
        config.url = format!("sqlite:{}", dir.path().join("comments.db").display());
        let db = SentimentDatabase::connect(&config).await.unwrap();
        db.init().await.unwrap();
        (dir, db)
    }

    #[test]
    fn test_new_comment_scores_from_label() {
        assert_eq!(NewComment::new("a", "positive").sentiment_score, 0.8);
        assert_eq!(NewComment::new("a", "negative").sentiment_score, 0.2);
        let odd = NewComment::new("a", "meh");
        assert_eq!(odd.sentiment, "meh");
        assert_eq!(odd.sentiment_score, 0.5);
    }

    #[test]
    fn test_view_formats_iso_timestamp() {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 08:30:15", "%Y-%m-%d %H:%M:%S").unwrap();
        let comment = Comment {
            id: 7,
            content: "hi".to_string(),
            sentiment: "neutral".to_string(),
            sentiment_score: 0.5,
            timestamp: Some(ts),
        };
        let view = CommentView::from(&comment);
        assert_eq!(view.timestamp.as_deref(), Some("2024-05-01T08:30:15"));

        let bare = Comment { timestamp: None, ..comment };
        assert_eq!(CommentView::from(&bare).timestamp, None);
    }

    #[test]
    fn test_view_prints_six_fraction_digits() {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 08:30:15.123456789", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        let comment = Comment {
            id: 1,
            content: "hi".to_string(),
            sentiment: "neutral".to_string(),
            sentiment_score: 0.5,
            timestamp: Some(ts),
        };
        assert_eq!(
            CommentView::from(&comment).timestamp.as_deref(),
            Some("2024-05-01T08:30:15.123456")
        );

        let half = Comment {
            timestamp: Some(ts.with_nanosecond(500_000_000).unwrap()),
            ..comment
        };
        assert_eq!(
            CommentView::from(&half).timestamp.as_deref(),
            Some("2024-05-01T08:30:15.500000")
        );
    }

    #[test]
    fn test_local_now_has_microsecond_precision() {
        assert_eq!(local_now().nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn test_insert_find_delete() {
        let (_dir, db) = setup().await;
        let mut conn = db.session().await.unwrap();

        let created = Comment::insert(&mut conn, &NewComment::new("great", "positive"))
            .await
            .unwrap();
        assert_eq!(created.sentiment_score, 0.8);

        let found = Comment::find(&mut conn, created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        assert!(Comment::delete(&mut conn, created.id).await.unwrap());
        assert!(!Comment::delete(&mut conn, created.id).await.unwrap());
        assert!(Comment::find(&mut conn, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_insert_spans_chunks_and_filters() {
        let (_dir, db) = setup().await;
        let mut conn = db.session().await.unwrap();

        let rows: Vec<NewComment> = (0..450)
            .map(|i| {
                let label = if i % 3 == 0 { "positive" } else { "negative" };
                NewComment::new(format!("comment {i}"), label)
            })
            .collect();
        assert_eq!(Comment::insert_batch(&mut conn, &rows).await.unwrap(), 450);

        assert_eq!(Comment::count(&mut conn, None).await.unwrap(), 450);
        assert_eq!(Comment::count(&mut conn, Some(Sentiment::Positive)).await.unwrap(), 150);
        assert_eq!(Comment::count(&mut conn, Some(Sentiment::Neutral)).await.unwrap(), 0);

        let page = Comment::list(&mut conn, Some(Sentiment::Positive), 10, 5).await.unwrap();
        assert_eq!(page.len(), 5);
        assert!(page.iter().all(|c| c.sentiment == "positive"));
        assert!(page.windows(2).all(|w| w[0].id < w[1].id));

        assert_eq!(Comment::delete_all(&mut conn).await.unwrap(), 450);
        assert_eq!(Comment::count(&mut conn, None).await.unwrap(), 0);
    }
}
