//! Catalog: forum creation and listing.

use tracing::info;

use crate::error::{BoardError, Result};
use crate::models::{
    ForumId, ForumSummary, ForumTitle, ForumView, SimpleForumSummary, SimpleTopicSummary,
};
use crate::store::{ForumRecord, TopicRecord, UnitOfWork};

impl From<TopicRecord> for SimpleTopicSummary {
    fn from(record: TopicRecord) -> Self {
        Self {
            topic_id: record.id,
            forum_id: record.forum_id,
            title: record.title,
        }
    }
}

impl From<ForumRecord> for SimpleForumSummary {
    fn from(record: ForumRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
        }
    }
}

/// Create a forum with a unique title.
///
/// The title check and the insert share one unit of work; the unique
/// constraint backs up the check if another writer slips in between.
pub async fn create_forum<W: UnitOfWork>(work: &mut W, title: &ForumTitle) -> Result<ForumId> {
    if work.find_forum_by_title(title.as_str()).await?.is_some() {
        return Err(BoardError::conflict("forum", title.as_str()));
    }

    let id = work
        .insert_forum(title.as_str())
        .await
        .map_err(|e| BoardError::from_store(e, "forum", title.as_str()))?;

    info!(forum_id = %id, title = title.as_str(), "forum created");
    Ok(id)
}

pub async fn list_simple<W: UnitOfWork>(work: &mut W) -> Result<Vec<SimpleForumSummary>> {
    Ok(work
        .list_forums()
        .await?
        .into_iter()
        .map(SimpleForumSummary::from)
        .collect())
}

/// Every forum with its most recently posted-to topic, if it has one.
pub async fn list_with_activity<W: UnitOfWork>(work: &mut W) -> Result<Vec<ForumSummary>> {
    Ok(work
        .list_forum_activity()
        .await?
        .into_iter()
        .map(|activity| ForumSummary {
            id: activity.forum.id,
            title: activity.forum.title,
            last_topic: activity.latest_topic.map(SimpleTopicSummary::from),
        })
        .collect())
}

/// Forum record, or `NotFound`.
pub async fn require_forum<W: UnitOfWork>(work: &mut W, id: ForumId) -> Result<ForumRecord> {
    work.find_forum(id)
        .await?
        .ok_or_else(|| BoardError::not_found("forum", id))
}

/// Forum with its topics ordered by title.
pub async fn get_forum<W: UnitOfWork>(work: &mut W, id: ForumId) -> Result<ForumView> {
    let forum = require_forum(work, id).await?;
    let topics = work
        .topics_in_forum(id)
        .await?
        .into_iter()
        .map(SimpleTopicSummary::from)
        .collect();

    Ok(ForumView {
        id: forum.id,
        title: forum.title,
        topics,
    })
}
