// Persisted rows and the sentiment vocabulary shared by import and API

pub mod comment;
pub mod sentiment;
pub mod topic;

pub use comment::{local_now, Comment, CommentView, NewComment};
pub use sentiment::{majority_vote, Sentiment, DEFAULT_SCORE};
pub use topic::{Topic, TopicCounts, DEFAULT_TOPIC_TITLE};
