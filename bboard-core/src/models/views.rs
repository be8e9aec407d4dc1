//! Read models returned by the board.
//!
//! Timestamps are pre-formatted as `YYYY-MM-DD HH:MM` (UTC).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ForumId, PostId, TopicId};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render a post timestamp the way views expose it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Public profile of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonView {
    pub name: String,
    pub username: String,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleForumSummary {
    pub id: ForumId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleTopicSummary {
    pub topic_id: TopicId,
    pub forum_id: ForumId,
    pub title: String,
}

/// Forum with its most recently posted-to topic, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForumSummary {
    pub id: ForumId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_topic: Option<SimpleTopicSummary>,
}

/// Forum with its topics ordered by title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForumView {
    pub id: ForumId,
    pub title: String,
    pub topics: Vec<SimpleTopicSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimplePostView {
    pub post_id: PostId,
    /// 1-based
    pub position: i64,
    pub author_name: String,
    pub text: String,
    pub posted_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleTopicView {
    pub topic_id: TopicId,
    pub title: String,
    pub posts: Vec<SimplePostView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub forum_id: ForumId,
    pub topic_id: TopicId,
    pub post_id: PostId,
    /// 1-based
    pub position: i64,
    pub author_name: String,
    pub author_username: String,
    pub text: String,
    pub posted_at: String,
    pub likes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicView {
    pub forum_id: ForumId,
    pub forum_title: String,
    pub topic_id: TopicId,
    pub title: String,
    pub posts: Vec<PostView>,
}
