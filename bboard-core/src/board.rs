//! Interaction facade: the public operation surface.
//!
//! Each operation is one unit of work: validate -> begin -> component logic
//! -> exactly one commit (on success) or rollback (on any failure). Input is
//! validated before the store is touched, so validation errors never open a
//! unit of work.

use std::collections::BTreeMap;

use tracing::{debug, error, instrument};

use crate::error::{BoardError, Result};
use crate::models::{
    ForumId, ForumSummary, ForumTitle, ForumView, NewPerson, PersonView, Position, PostId,
    PostText, PostView, SimpleForumSummary, SimpleTopicView, TopicId, TopicTitle, TopicView,
    Username,
};
use crate::reactions::{self, LikeChange};
use crate::store::{LikeItem, Store, UnitOfWork};
use crate::{catalog, directory, threads};

/// Discussion board over a [`Store`].
#[derive(Debug, Clone)]
pub struct Board<S> {
    store: S,
}

impl<S: Store> Board<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn begin(&self) -> Result<S::Work> {
        self.store.begin().await.map_err(|e| {
            error!(error = %e, "could not open unit of work");
            BoardError::from(e)
        })
    }

    /// Commit on success, roll back on failure. Consumes the unit of work.
    async fn finish<T>(work: S::Work, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => match work.commit().await {
                Ok(()) => Ok(value),
                Err(e) => {
                    error!(error = %e, "commit failed");
                    Err(BoardError::fatal(format!("commit failed: {e}")))
                }
            },
            Err(err) => {
                if let Err(e) = work.rollback().await {
                    error!(error = %e, cause = %err, "rollback failed");
                    return Err(BoardError::fatal(format!("rollback failed: {e}")));
                }
                if err.is_fatal() {
                    error!(error = %err, "operation aborted");
                } else {
                    debug!(error = %err, "operation rejected");
                }
                Err(err)
            }
        }
    }

    // People

    #[instrument(skip(self, name, student_id))]
    pub async fn register(
        &self,
        name: &str,
        username: &str,
        student_id: Option<&str>,
    ) -> Result<()> {
        let person = NewPerson::new(name, username, student_id)?;
        let mut work = self.begin().await?;
        let outcome = directory::register(&mut work, &person).await.map(|_| ());
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn lookup_person(&self, username: &str) -> Result<PersonView> {
        let username = Username::new(username)?;
        let mut work = self.begin().await?;
        let outcome = directory::lookup(&mut work, &username).await;
        Self::finish(work, outcome).await
    }

    /// Name -> username for every registered person.
    #[instrument(skip(self))]
    pub async fn list_people(&self) -> Result<BTreeMap<String, String>> {
        let mut work = self.begin().await?;
        let outcome = directory::list_people(&mut work).await;
        Self::finish(work, outcome).await
    }

    // Forums

    #[instrument(skip(self))]
    pub async fn create_forum(&self, title: &str) -> Result<ForumId> {
        let title = ForumTitle::new(title)?;
        let mut work = self.begin().await?;
        let outcome = catalog::create_forum(&mut work, &title).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn list_simple_forums(&self) -> Result<Vec<SimpleForumSummary>> {
        let mut work = self.begin().await?;
        let outcome = catalog::list_simple(&mut work).await;
        Self::finish(work, outcome).await
    }

    /// Forums with their most recently active topic.
    #[instrument(skip(self))]
    pub async fn list_forums(&self) -> Result<Vec<ForumSummary>> {
        let mut work = self.begin().await?;
        let outcome = catalog::list_with_activity(&mut work).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn get_forum(&self, forum_id: ForumId) -> Result<ForumView> {
        let mut work = self.begin().await?;
        let outcome = catalog::get_forum(&mut work, forum_id).await;
        Self::finish(work, outcome).await
    }

    // Topics and posts

    /// Create a topic and its opening post atomically.
    #[instrument(skip(self, text))]
    pub async fn create_topic(
        &self,
        forum_id: ForumId,
        username: &str,
        title: &str,
        text: &str,
    ) -> Result<TopicId> {
        let username = Username::new(username)?;
        let title = TopicTitle::new(title)?;
        let text = PostText::new(text)?;
        let mut work = self.begin().await?;
        let outcome = threads::create_topic(&mut work, forum_id, &username, &title, &text).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self, text))]
    pub async fn create_post(&self, topic_id: TopicId, username: &str, text: &str) -> Result<PostId> {
        let username = Username::new(username)?;
        let text = PostText::new(text)?;
        let mut work = self.begin().await?;
        let outcome = threads::create_post(&mut work, topic_id, &username, &text).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn get_topic(&self, topic_id: TopicId) -> Result<TopicView> {
        let mut work = self.begin().await?;
        let outcome = threads::get_topic(&mut work, topic_id).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn get_simple_topic(&self, topic_id: TopicId) -> Result<SimpleTopicView> {
        let mut work = self.begin().await?;
        let outcome = threads::get_simple_topic(&mut work, topic_id).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn get_latest_post(&self, topic_id: TopicId) -> Result<PostView> {
        let mut work = self.begin().await?;
        let outcome = threads::get_latest_post(&mut work, topic_id).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn count_posts(&self, topic_id: TopicId) -> Result<i64> {
        let mut work = self.begin().await?;
        let outcome = threads::count_posts(&mut work, topic_id).await;
        Self::finish(work, outcome).await
    }

    // Likes

    /// Ensure `username` does (`want`) or does not like `item`.
    #[instrument(skip(self))]
    pub async fn set_like(&self, item: LikeItem, username: &str, want: bool) -> Result<LikeChange> {
        let username = Username::new(username)?;
        let mut work = self.begin().await?;
        let outcome = reactions::set_like(&mut work, item, &username, want).await;
        Self::finish(work, outcome).await
    }

    pub async fn set_topic_like(
        &self,
        username: &str,
        topic_id: TopicId,
        want: bool,
    ) -> Result<LikeChange> {
        self.set_like(LikeItem::Topic(topic_id), username, want).await
    }

    pub async fn set_post_like(
        &self,
        username: &str,
        post_id: PostId,
        want: bool,
    ) -> Result<LikeChange> {
        self.set_like(LikeItem::Post(post_id), username, want).await
    }

    /// Like the post at a 1-based `position` within a topic.
    #[instrument(skip(self))]
    pub async fn set_post_like_at(
        &self,
        username: &str,
        topic_id: TopicId,
        position: i64,
        want: bool,
    ) -> Result<LikeChange> {
        let username = Username::new(username)?;
        let position = Position::new(position)?;
        let mut work = self.begin().await?;
        let outcome =
            reactions::set_post_like_at(&mut work, topic_id, position, &username, want).await;
        Self::finish(work, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn get_likers(&self, topic_id: TopicId) -> Result<Vec<PersonView>> {
        let mut work = self.begin().await?;
        let outcome = reactions::get_likers(&mut work, topic_id).await;
        Self::finish(work, outcome).await
    }
}
