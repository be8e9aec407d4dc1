//! Store gateway port.
//!
//! The board never sees SQL. It talks to a [`UnitOfWork`]: one transactional
//! scope exposing a fixed set of parameter-bound statements. A unit of work is
//! finished by exactly one call to [`UnitOfWork::commit`] or
//! [`UnitOfWork::rollback`], both of which consume it.
//!
//! # Adapters
//!
//! - [`MemoryStore`]: in-process tables, serializable, for tests and embedding
//! - `bboard-postgres`: sqlx/PostgreSQL

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{ForumId, PersonId, Position, PostId, TopicId};

pub use memory::{Fault, MemoryStore, MemoryWork, WorkStats};

/// Store-level failure, classified so the board can map it to its taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint '{constraint}' violated")]
    ForeignKeyViolation { constraint: String },

    /// Connection, pool or timeout failure
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("store error: {message}")]
    Backend { message: String },
}

/// Likeable item. Each variant selects its own fixed statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeItem {
    Topic(TopicId),
    Post(PostId),
}

impl LikeItem {
    pub fn resource(&self) -> &'static str {
        match self {
            Self::Topic(_) => "topic",
            Self::Post(_) => "post",
        }
    }

    pub fn raw_id(&self) -> i64 {
        match self {
            Self::Topic(id) => id.get(),
            Self::Post(id) => id.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    pub username: String,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumRecord {
    pub id: ForumId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub id: TopicId,
    pub forum_id: ForumId,
    pub author_id: PersonId,
    pub title: String,
}

/// Post joined with its author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: PostId,
    pub topic_id: TopicId,
    pub number: i64,
    pub author_name: String,
    pub author_username: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub total_likes: i64,
}

/// Forum plus the topic holding its latest post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumActivity {
    pub forum: ForumRecord,
    pub latest_topic: Option<TopicRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost<'a> {
    pub topic_id: TopicId,
    pub author_id: PersonId,
    pub number: i64,
    pub text: &'a str,
    pub posted_at: DateTime<Utc>,
}

/// Opens units of work.
#[async_trait]
pub trait Store: Send + Sync {
    type Work: UnitOfWork;

    async fn begin(&self) -> Result<Self::Work, StoreError>;
}

/// One transactional scope against the store.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;

    // People

    async fn insert_person(
        &mut self,
        name: &str,
        username: &str,
        student_id: Option<&str>,
    ) -> Result<PersonId, StoreError>;

    async fn find_person(&mut self, username: &str) -> Result<Option<PersonRecord>, StoreError>;

    async fn list_people(&mut self) -> Result<Vec<PersonRecord>, StoreError>;

    // Forums

    async fn insert_forum(&mut self, title: &str) -> Result<ForumId, StoreError>;

    async fn find_forum(&mut self, id: ForumId) -> Result<Option<ForumRecord>, StoreError>;

    async fn find_forum_by_title(&mut self, title: &str)
        -> Result<Option<ForumRecord>, StoreError>;

    /// All forums ordered by id.
    async fn list_forums(&mut self) -> Result<Vec<ForumRecord>, StoreError>;

    /// All forums ordered by id, each with the topic whose latest post is the
    /// most recent (ties go to the higher topic id).
    async fn list_forum_activity(&mut self) -> Result<Vec<ForumActivity>, StoreError>;

    /// Topics of a forum ordered by title.
    async fn topics_in_forum(&mut self, forum_id: ForumId)
        -> Result<Vec<TopicRecord>, StoreError>;

    // Topics

    async fn insert_topic(
        &mut self,
        forum_id: ForumId,
        author_id: PersonId,
        title: &str,
    ) -> Result<TopicId, StoreError>;

    async fn find_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError>;

    /// Like [`UnitOfWork::find_topic`], but holds the topic exclusively until
    /// the unit of work ends so post numbering cannot race.
    async fn lock_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError>;

    // Posts

    async fn insert_post(&mut self, post: NewPost<'_>) -> Result<PostId, StoreError>;

    async fn count_posts(&mut self, topic_id: TopicId) -> Result<i64, StoreError>;

    /// Posts ordered by `posted_at`, ties by insertion order.
    async fn posts_in_topic(&mut self, topic_id: TopicId) -> Result<Vec<PostRecord>, StoreError>;

    async fn latest_post(&mut self, topic_id: TopicId) -> Result<Option<PostRecord>, StoreError>;

    async fn post_at(
        &mut self,
        topic_id: TopicId,
        position: Position,
    ) -> Result<Option<PostRecord>, StoreError>;

    /// Owning topic of a post, if the post exists.
    async fn find_post_topic(&mut self, id: PostId) -> Result<Option<TopicId>, StoreError>;

    // Likes

    /// Add a like row. `Ok(false)` means it already existed; adapters may
    /// instead report that as [`StoreError::UniqueViolation`].
    async fn insert_like(&mut self, item: LikeItem, person: PersonId)
        -> Result<bool, StoreError>;

    /// Remove a like row. `Ok(false)` means there was nothing to remove.
    async fn delete_like(&mut self, item: LikeItem, person: PersonId)
        -> Result<bool, StoreError>;

    async fn adjust_post_likes(&mut self, post: PostId, delta: i64) -> Result<(), StoreError>;

    async fn topic_likers(&mut self, topic_id: TopicId) -> Result<Vec<PersonRecord>, StoreError>;
}
