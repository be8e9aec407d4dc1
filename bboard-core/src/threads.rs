//! Thread manager: topics, posts and post numbering.
//!
//! Posts are numbered densely from 1 in creation order. `create_post` takes
//! the topic lock before reading the post count, so two writers on the same
//! topic cannot compute the same number.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::directory;
use crate::error::{BoardError, Result};
use crate::models::{
    format_timestamp, ForumId, PostId, PostText, PostView, SimplePostView, SimpleTopicView,
    TopicId, TopicTitle, TopicView, Username,
};
use crate::store::{NewPost, PostRecord, TopicRecord, UnitOfWork};

/// Topic record, or `NotFound`.
pub async fn require_topic<W: UnitOfWork>(work: &mut W, id: TopicId) -> Result<TopicRecord> {
    work.find_topic(id)
        .await?
        .ok_or_else(|| BoardError::not_found("topic", id))
}

/// Create a topic together with its opening post (number 1).
pub async fn create_topic<W: UnitOfWork>(
    work: &mut W,
    forum_id: ForumId,
    username: &Username,
    title: &TopicTitle,
    text: &PostText,
) -> Result<TopicId> {
    let author_id = directory::resolve_id(work, username).await?;

    if work.find_forum(forum_id).await?.is_none() {
        return Err(BoardError::not_found("forum", forum_id));
    }

    let topic_id = work
        .insert_topic(forum_id, author_id, title.as_str())
        .await
        .map_err(|e| BoardError::from_store(e, "forum", forum_id))?;

    work.insert_post(NewPost {
        topic_id,
        author_id,
        number: 1,
        text: text.as_str(),
        posted_at: Utc::now(),
    })
    .await
    .map_err(|e| BoardError::from_store(e, "topic", topic_id))?;

    info!(%forum_id, %topic_id, username = username.as_str(), "topic created");
    Ok(topic_id)
}

/// Append a post to a topic. Its number is the current post count plus one.
pub async fn create_post<W: UnitOfWork>(
    work: &mut W,
    topic_id: TopicId,
    username: &Username,
    text: &PostText,
) -> Result<PostId> {
    let author_id = directory::resolve_id(work, username).await?;

    if work.lock_topic(topic_id).await?.is_none() {
        return Err(BoardError::not_found("topic", topic_id));
    }

    let number = work.count_posts(topic_id).await? + 1;
    let latest = work.latest_post(topic_id).await?.map(|p| p.posted_at);

    let post_id = work
        .insert_post(NewPost {
            topic_id,
            author_id,
            number,
            text: text.as_str(),
            posted_at: next_timestamp(latest, Utc::now()),
        })
        .await
        .map_err(|e| BoardError::from_store(e, "topic", topic_id))?;

    info!(%topic_id, %post_id, number, username = username.as_str(), "post created");
    Ok(post_id)
}

/// Never go backwards in time within a topic.
fn next_timestamp(latest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    }
}

pub async fn count_posts<W: UnitOfWork>(work: &mut W, topic_id: TopicId) -> Result<i64> {
    require_topic(work, topic_id).await?;
    Ok(work.count_posts(topic_id).await?)
}

async fn posts_of<W: UnitOfWork>(work: &mut W, topic_id: TopicId) -> Result<Vec<PostRecord>> {
    let posts = work.posts_in_topic(topic_id).await?;
    if posts.is_empty() {
        warn!(%topic_id, "topic has no posts");
        return Err(BoardError::EmptyTopic { topic_id });
    }
    Ok(posts)
}

fn post_view(forum_id: ForumId, position: i64, post: PostRecord) -> PostView {
    PostView {
        forum_id,
        topic_id: post.topic_id,
        post_id: post.id,
        position,
        author_name: post.author_name,
        author_username: post.author_username,
        text: post.text,
        posted_at: format_timestamp(post.posted_at),
        likes: post.total_likes,
    }
}

/// Topic with its forum and every post, oldest first.
pub async fn get_topic<W: UnitOfWork>(work: &mut W, topic_id: TopicId) -> Result<TopicView> {
    let topic = require_topic(work, topic_id).await?;
    let forum = work
        .find_forum(topic.forum_id)
        .await?
        .ok_or_else(|| BoardError::fatal(format!("topic {topic_id} has no forum")))?;

    let posts = posts_of(work, topic_id)
        .await?
        .into_iter()
        .zip(1..)
        .map(|(post, position)| post_view(forum.id, position, post))
        .collect();

    Ok(TopicView {
        forum_id: forum.id,
        forum_title: forum.title,
        topic_id,
        title: topic.title,
        posts,
    })
}

pub async fn get_simple_topic<W: UnitOfWork>(
    work: &mut W,
    topic_id: TopicId,
) -> Result<SimpleTopicView> {
    let topic = require_topic(work, topic_id).await?;

    let posts = posts_of(work, topic_id)
        .await?
        .into_iter()
        .zip(1..)
        .map(|(post, position)| SimplePostView {
            post_id: post.id,
            position,
            author_name: post.author_name,
            text: post.text,
            posted_at: format_timestamp(post.posted_at),
        })
        .collect();

    Ok(SimpleTopicView {
        topic_id,
        title: topic.title,
        posts,
    })
}

/// Most recent post; its position is the topic's post count.
pub async fn get_latest_post<W: UnitOfWork>(work: &mut W, topic_id: TopicId) -> Result<PostView> {
    let topic = require_topic(work, topic_id).await?;
    let post = work.latest_post(topic_id).await?.ok_or_else(|| {
        warn!(%topic_id, "topic has no posts");
        BoardError::EmptyTopic { topic_id }
    })?;
    let position = work.count_posts(topic_id).await?;

    Ok(post_view(topic.forum_id, position, post))
}
