// HTTP API - JSON endpoints over the comment store
//
// Every handler works on its own pooled session; comment mutations refresh
// the topic on that same session before responding.

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    aggregator::recompute_topic,
    app_state::AppState,
    error::{AppError, AppResult},
    extract::{ApiPath, ApiQuery},
    importer,
    models::{Comment, CommentView, NewComment, Sentiment, Topic},
};

const DEFAULT_PAGE_SIZE: i64 = 50;

// HTTP Request/Response types
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_size")]
    pub limit: i64,
    pub sentiment: Option<String>,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentQuery {
    pub content: String,
    pub sentiment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentPage {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub data: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    pub total_comments: i64,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    pub avg_sentiment_score: f64,
    pub sentiment_ratio: SentimentRatio,
}

/// Percent of all counted comments per label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SentimentRatio {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl StatsResponse {
    /// All zeros when no topic exists yet. Otherwise the total is clamped to
    /// at least 1, both as reported and as the percentage divisor.
    pub fn from_topic(topic: Option<&Topic>) -> Self {
        let Some(topic) = topic else {
            return Self {
                total_comments: 0,
                positive_count: 0,
                negative_count: 0,
                neutral_count: 0,
                avg_sentiment_score: 0.0,
                sentiment_ratio: SentimentRatio::default(),
            };
        };

        let total = (topic.positive_count + topic.negative_count + topic.neutral_count).max(1);
        let percent = |count: i64| round2(count as f64 / total as f64 * 100.0);

        Self {
            total_comments: total,
            positive_count: topic.positive_count,
            negative_count: topic.negative_count,
            neutral_count: topic.neutral_count,
            avg_sentiment_score: round2(topic.avg_sentiment_score),
            sentiment_ratio: SentimentRatio {
                positive: percent(topic.positive_count),
                negative: percent(topic.negative_count),
                neutral: percent(topic.neutral_count),
            },
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}

// HTTP Handlers

pub async fn index_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("Welcome to {}", state.config.app.name),
        "api_list": [
            "GET /api/stats - sentiment statistics",
            "GET /api/comments - list comments",
            "GET /api/comments/{id} - get one comment",
            "POST /api/comments - add a comment",
            "DELETE /api/comments/{id} - delete a comment",
            "POST /api/reload - reload data from the spreadsheet",
            "DELETE /api/all - delete all data"
        ]
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let mut conn = state.db.session().await?;
    let topic = Topic::first(&mut conn).await?;
    Ok(Json(StatsResponse::from_topic(topic.as_ref())))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListCommentsQuery>,
) -> AppResult<Json<CommentPage>> {
    // Unknown labels mean "no filter"
    let filter = params.sentiment.as_deref().and_then(Sentiment::parse);
    // Passed through as given: SQLite reads a negative LIMIT as unbounded
    // and a negative OFFSET as 0.
    let (skip, limit) = (params.skip, params.limit);

    let mut conn = state.db.session().await?;
    let total = Comment::count(&mut conn, filter).await?;
    let comments = Comment::list(&mut conn, filter, skip, limit).await?;

    Ok(Json(CommentPage {
        total,
        skip,
        limit,
        data: comments.iter().map(CommentView::from).collect(),
    }))
}

pub async fn get_comment_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<CommentView>> {
    let mut conn = state.db.session().await?;
    match Comment::find(&mut conn, id).await? {
        Some(comment) => Ok(Json(CommentView::from(&comment))),
        None => Err(comment_not_found()),
    }
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CreateCommentQuery>,
) -> AppResult<Json<Value>> {
    let sentiment = params
        .sentiment
        .unwrap_or_else(|| Sentiment::Neutral.as_str().to_string());

    let mut conn = state.db.session().await?;
    let comment = Comment::insert(&mut conn, &NewComment::new(params.content, sentiment)).await?;
    recompute_topic(&mut conn).await?;

    info!(id = comment.id, sentiment = %comment.sentiment, "Comment created");
    Ok(Json(json!({
        "id": comment.id,
        "content": comment.content,
        "sentiment": comment.sentiment,
        "sentiment_score": comment.sentiment_score,
        "message": "Comment created"
    })))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.session().await?;
    if !Comment::delete(&mut conn, id).await? {
        return Err(comment_not_found());
    }
    recompute_topic(&mut conn).await?;

    info!(id, "Comment deleted");
    Ok(Json(json!({"message": "Comment deleted"})))
}

pub async fn reload_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let path = PathBuf::from(&state.config.data.file_path);
    if !path.exists() {
        return Err(AppError::BadRequest(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    let mut tx = state.db.begin().await?;
    Comment::delete_all(&mut tx).await?;
    Topic::delete_all(&mut tx).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to clear data: {}", e)))?;

    match importer::load_from_file(&state.db, &path).await {
        Ok(report) => Ok(Json(json!({
            "message": "Data reloaded",
            "file": path.display().to_string(),
            "report": report
        }))),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Reload failed");
            Err(AppError::ImportError(e.to_string()))
        }
    }
}

pub async fn delete_all_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let mut tx = state.db.begin().await?;
    let deleted = Comment::delete_all(&mut tx).await?;
    Topic::delete_all(&mut tx).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to delete data: {}", e)))?;

    info!(deleted, "All data deleted");
    Ok(Json(json!({
        "message": "All data deleted",
        "deleted_comments": deleted
    })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/stats", get(stats_handler))
        .route(
            "/api/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route(
            "/api/comments/{id}",
            get(get_comment_handler).delete(delete_comment_handler),
        )
        .route("/api/reload", post(reload_handler))
        .route("/api/all", delete(delete_all_handler))
        .with_state(state)
}

/// Router plus the service-wide middleware stack.
pub fn create_app(state: AppState) -> Router {
    let api = state.config.api.clone();
    create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(Duration::from_secs(api.timeout_secs)))
            .layer(DefaultBodyLimit::max(api.max_request_size)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(positive: i64, negative: i64, neutral: i64, avg: f64) -> Topic {
        Topic {
            id: 1,
            title: "t".to_string(),
            content: None,
            positive_count: positive,
            negative_count: negative,
            neutral_count: neutral,
            avg_sentiment_score: avg,
            created_at: None,
        }
    }

    #[test]
    fn test_stats_without_topic_are_zero() {
        let stats = StatsResponse::from_topic(None);
        assert_eq!(stats.total_comments, 0);
        assert_eq!(stats.avg_sentiment_score, 0.0);
        assert_eq!(stats.sentiment_ratio, SentimentRatio::default());
    }

    #[test]
    fn test_stats_percentages_are_rounded() {
        let stats = StatsResponse::from_topic(Some(&topic(1, 1, 1, 0.5)));
        assert_eq!(stats.total_comments, 3);
        assert_eq!(stats.sentiment_ratio.positive, 33.33);
        assert_eq!(stats.sentiment_ratio.negative, 33.33);
        assert_eq!(stats.sentiment_ratio.neutral, 33.33);

        let stats = StatsResponse::from_topic(Some(&topic(2, 1, 0, 0.6)));
        assert_eq!(stats.sentiment_ratio.positive, 66.67);
        assert_eq!(stats.avg_sentiment_score, 0.6);
        let sum = stats.sentiment_ratio.positive
            + stats.sentiment_ratio.negative
            + stats.sentiment_ratio.neutral;
        assert!((sum - 100.0).abs() <= 0.02);
    }

    #[test]
    fn test_stats_guard_against_zero_total() {
        let stats = StatsResponse::from_topic(Some(&topic(0, 0, 0, 0.456)));
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.avg_sentiment_score, 0.46);
        assert_eq!(stats.sentiment_ratio.positive, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.576), 0.58);
        assert_eq!(round2(0.123), 0.12);
        assert_eq!(round2(100.0), 100.0);
    }
}
