//! Reaction registry: idempotent likes.
//!
//! A toggle means "ensure this state", so liking twice or unliking something
//! never liked both succeed. Post likes also maintain the post's
//! `total_likes` counter, but only when the like set actually changed.

use tracing::debug;

use crate::directory;
use crate::error::{BoardError, Result};
use crate::models::{PersonView, Position, TopicId, Username};
use crate::store::{LikeItem, StoreError, UnitOfWork};
use crate::threads;

/// Whether a toggle changed the like set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Changed,
    Unchanged,
}

async fn require_item<W: UnitOfWork>(work: &mut W, item: LikeItem) -> Result<()> {
    let exists = match item {
        LikeItem::Topic(id) => work.find_topic(id).await?.is_some(),
        LikeItem::Post(id) => work.find_post_topic(id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(BoardError::not_found(item.resource(), item.raw_id()))
    }
}

/// Bring the like of `username` on `item` into the wanted state.
pub async fn set_like<W: UnitOfWork>(
    work: &mut W,
    item: LikeItem,
    username: &Username,
    want: bool,
) -> Result<LikeChange> {
    let person = directory::resolve_id(work, username).await?;
    require_item(work, item).await?;

    let changed = if want {
        match work.insert_like(item, person).await {
            Ok(inserted) => inserted,
            // Already liked: the desired state holds.
            Err(StoreError::UniqueViolation { .. }) => false,
            Err(e) => return Err(BoardError::from_store(e, item.resource(), item.raw_id())),
        }
    } else {
        work.delete_like(item, person).await?
    };

    if changed {
        if let LikeItem::Post(post) = item {
            let delta = if want { 1 } else { -1 };
            work.adjust_post_likes(post, delta).await?;
        }
    }

    debug!(?item, username = username.as_str(), want, changed, "like toggled");
    Ok(if changed {
        LikeChange::Changed
    } else {
        LikeChange::Unchanged
    })
}

/// Like or unlike the post at a 1-based position within a topic.
pub async fn set_post_like_at<W: UnitOfWork>(
    work: &mut W,
    topic_id: TopicId,
    position: Position,
    username: &Username,
    want: bool,
) -> Result<LikeChange> {
    threads::require_topic(work, topic_id).await?;
    let post = work
        .post_at(topic_id, position)
        .await?
        .ok_or_else(|| {
            BoardError::not_found("post", format!("{topic_id}#{}", position.get()))
        })?;

    set_like(work, LikeItem::Post(post.id), username, want).await
}

/// Everyone who liked a topic, in no particular order.
pub async fn get_likers<W: UnitOfWork>(work: &mut W, topic_id: TopicId) -> Result<Vec<PersonView>> {
    threads::require_topic(work, topic_id).await?;
    Ok(work
        .topic_likers(topic_id)
        .await?
        .into_iter()
        .map(PersonView::from)
        .collect())
}
