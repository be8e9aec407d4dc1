//! In-memory store adapter.
//!
//! A unit of work holds the table lock from `begin` until `commit`/`rollback`,
//! so units are fully serialized. Writes land on a private snapshot that only
//! becomes visible on commit; dropping or rolling back discards it.
//!
//! Enforces the same unique and foreign key rules as the SQL schema and
//! reports them as [`StoreError`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ForumActivity, ForumRecord, LikeItem, NewPost, PersonRecord, PostRecord, Store, StoreError,
    TopicRecord, UnitOfWork,
};
use crate::models::{ForumId, PersonId, Position, PostId, TopicId};

/// One-shot failure injected into the next unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    InsertPost,
    AdjustPostLikes,
    Commit,
}

/// Unit of work bookkeeping, for asserting one commit or rollback per begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Debug, Clone)]
struct PostRow {
    id: PostId,
    topic_id: TopicId,
    author_id: PersonId,
    number: i64,
    text: String,
    posted_at: DateTime<Utc>,
    total_likes: i64,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    people: BTreeMap<PersonId, PersonRecord>,
    forums: BTreeMap<ForumId, ForumRecord>,
    topics: BTreeMap<TopicId, TopicRecord>,
    posts: BTreeMap<PostId, PostRow>,
    topic_likes: BTreeSet<(TopicId, PersonId)>,
    post_likes: BTreeSet<(PostId, PersonId)>,
    last_id: i64,
    stats: WorkStats,
    fault: Option<Fault>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn person(&self, id: PersonId) -> Result<&PersonRecord, StoreError> {
        self.people.get(&id).ok_or_else(|| StoreError::Backend {
            message: format!("dangling person reference {id}"),
        })
    }

    fn post_record(&self, row: &PostRow) -> Result<PostRecord, StoreError> {
        let author = self.person(row.author_id)?;
        Ok(PostRecord {
            id: row.id,
            topic_id: row.topic_id,
            number: row.number,
            author_name: author.name.clone(),
            author_username: author.username.clone(),
            text: row.text.clone(),
            posted_at: row.posted_at,
            total_likes: row.total_likes,
        })
    }

    /// Posts of a topic in `posted_at` order, ties by id.
    fn ordered_posts(&self, topic_id: TopicId) -> Vec<&PostRow> {
        let mut posts: Vec<&PostRow> = self
            .posts
            .values()
            .filter(|p| p.topic_id == topic_id)
            .collect();
        posts.sort_by_key(|p| (p.posted_at, p.id));
        posts
    }

    fn latest_topic(&self, forum_id: ForumId) -> Option<TopicRecord> {
        self.topics
            .values()
            .filter(|t| t.forum_id == forum_id)
            .filter_map(|t| {
                self.ordered_posts(t.id)
                    .last()
                    .map(|p| ((p.posted_at, t.id), t))
            })
            .max_by_key(|(key, _)| *key)
            .map(|(_, t)| t.clone())
    }

    fn item_exists(&self, item: LikeItem) -> bool {
        match item {
            LikeItem::Topic(id) => self.topics.contains_key(&id),
            LikeItem::Post(id) => self.posts.contains_key(&id),
        }
    }
}

/// Shared in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next unit of work fail at `fault`.
    pub async fn fail_next(&self, fault: Fault) {
        self.tables.lock().await.fault = Some(fault);
    }

    pub async fn stats(&self) -> WorkStats {
        self.tables.lock().await.stats
    }

    /// Committed row counts: (people, forums, topics, posts).
    pub async fn row_counts(&self) -> (usize, usize, usize, usize) {
        let tables = self.tables.lock().await;
        (
            tables.people.len(),
            tables.forums.len(),
            tables.topics.len(),
            tables.posts.len(),
        )
    }

    /// Committed like rows for an item.
    pub async fn like_count(&self, item: LikeItem) -> usize {
        let tables = self.tables.lock().await;
        match item {
            LikeItem::Topic(id) => tables.topic_likes.iter().filter(|(t, _)| *t == id).count(),
            LikeItem::Post(id) => tables.post_likes.iter().filter(|(p, _)| *p == id).count(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Work = MemoryWork;

    async fn begin(&self) -> Result<MemoryWork, StoreError> {
        let mut guard = Arc::clone(&self.tables).lock_owned().await;
        guard.stats.begun += 1;
        let fault = guard.fault.take();
        let working = guard.clone();
        Ok(MemoryWork {
            guard,
            working,
            fault,
        })
    }
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fault: Option<Fault>,
}

impl MemoryWork {
    fn check_fault(&mut self, at: Fault) -> Result<(), StoreError> {
        if self.fault == Some(at) {
            self.fault = None;
            return Err(StoreError::Backend {
                message: format!("injected failure at {at:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryWork {
    async fn commit(mut self) -> Result<(), StoreError> {
        if let Err(err) = self.check_fault(Fault::Commit) {
            self.guard.stats.rolled_back += 1;
            return Err(err);
        }
        let mut tables = self.working;
        tables.stats = self.guard.stats;
        tables.stats.committed += 1;
        *self.guard = tables;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.guard.stats.rolled_back += 1;
        Ok(())
    }

    async fn insert_person(
        &mut self,
        name: &str,
        username: &str,
        student_id: Option<&str>,
    ) -> Result<PersonId, StoreError> {
        let tables = &mut self.working;
        if tables.people.values().any(|p| p.username == username) {
            return Err(StoreError::UniqueViolation {
                constraint: "person_username_key".into(),
            });
        }
        let id = PersonId::new(tables.next_id());
        tables.people.insert(
            id,
            PersonRecord {
                id,
                name: name.to_owned(),
                username: username.to_owned(),
                student_id: student_id.map(str::to_owned),
            },
        );
        Ok(id)
    }

    async fn find_person(&mut self, username: &str) -> Result<Option<PersonRecord>, StoreError> {
        Ok(self
            .working
            .people
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn list_people(&mut self) -> Result<Vec<PersonRecord>, StoreError> {
        Ok(self.working.people.values().cloned().collect())
    }

    async fn insert_forum(&mut self, title: &str) -> Result<ForumId, StoreError> {
        let tables = &mut self.working;
        if tables.forums.values().any(|f| f.title == title) {
            return Err(StoreError::UniqueViolation {
                constraint: "forum_title_key".into(),
            });
        }
        let id = ForumId::new(tables.next_id());
        tables.forums.insert(
            id,
            ForumRecord {
                id,
                title: title.to_owned(),
            },
        );
        Ok(id)
    }

    async fn find_forum(&mut self, id: ForumId) -> Result<Option<ForumRecord>, StoreError> {
        Ok(self.working.forums.get(&id).cloned())
    }

    async fn find_forum_by_title(
        &mut self,
        title: &str,
    ) -> Result<Option<ForumRecord>, StoreError> {
        Ok(self
            .working
            .forums
            .values()
            .find(|f| f.title == title)
            .cloned())
    }

    async fn list_forums(&mut self) -> Result<Vec<ForumRecord>, StoreError> {
        Ok(self.working.forums.values().cloned().collect())
    }

    async fn list_forum_activity(&mut self) -> Result<Vec<ForumActivity>, StoreError> {
        let tables = &self.working;
        Ok(tables
            .forums
            .values()
            .map(|forum| ForumActivity {
                forum: forum.clone(),
                latest_topic: tables.latest_topic(forum.id),
            })
            .collect())
    }

    async fn topics_in_forum(
        &mut self,
        forum_id: ForumId,
    ) -> Result<Vec<TopicRecord>, StoreError> {
        let mut topics: Vec<TopicRecord> = self
            .working
            .topics
            .values()
            .filter(|t| t.forum_id == forum_id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(topics)
    }

    async fn insert_topic(
        &mut self,
        forum_id: ForumId,
        author_id: PersonId,
        title: &str,
    ) -> Result<TopicId, StoreError> {
        let tables = &mut self.working;
        if !tables.forums.contains_key(&forum_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "topic_forum_id_fkey".into(),
            });
        }
        if !tables.people.contains_key(&author_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "topic_author_id_fkey".into(),
            });
        }
        let id = TopicId::new(tables.next_id());
        tables.topics.insert(
            id,
            TopicRecord {
                id,
                forum_id,
                author_id,
                title: title.to_owned(),
            },
        );
        Ok(id)
    }

    async fn find_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError> {
        Ok(self.working.topics.get(&id).cloned())
    }

    async fn lock_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError> {
        // The whole store is already held exclusively.
        self.find_topic(id).await
    }

    async fn insert_post(&mut self, post: NewPost<'_>) -> Result<PostId, StoreError> {
        self.check_fault(Fault::InsertPost)?;
        let tables = &mut self.working;
        if !tables.topics.contains_key(&post.topic_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "post_topic_id_fkey".into(),
            });
        }
        if !tables.people.contains_key(&post.author_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "post_author_id_fkey".into(),
            });
        }
        if tables
            .posts
            .values()
            .any(|p| p.topic_id == post.topic_id && p.number == post.number)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "post_topic_id_number_key".into(),
            });
        }
        let id = PostId::new(tables.next_id());
        tables.posts.insert(
            id,
            PostRow {
                id,
                topic_id: post.topic_id,
                author_id: post.author_id,
                number: post.number,
                text: post.text.to_owned(),
                posted_at: post.posted_at,
                total_likes: 0,
            },
        );
        Ok(id)
    }

    async fn count_posts(&mut self, topic_id: TopicId) -> Result<i64, StoreError> {
        let count = self
            .working
            .posts
            .values()
            .filter(|p| p.topic_id == topic_id)
            .count();
        i64::try_from(count).map_err(|e| StoreError::Backend {
            message: e.to_string(),
        })
    }

    async fn posts_in_topic(&mut self, topic_id: TopicId) -> Result<Vec<PostRecord>, StoreError> {
        let tables = &self.working;
        tables
            .ordered_posts(topic_id)
            .into_iter()
            .map(|row| tables.post_record(row))
            .collect()
    }

    async fn latest_post(&mut self, topic_id: TopicId) -> Result<Option<PostRecord>, StoreError> {
        let tables = &self.working;
        tables
            .ordered_posts(topic_id)
            .last()
            .map(|row| tables.post_record(row))
            .transpose()
    }

    async fn post_at(
        &mut self,
        topic_id: TopicId,
        position: Position,
    ) -> Result<Option<PostRecord>, StoreError> {
        let tables = &self.working;
        let offset = usize::try_from(position.offset()).map_err(|e| StoreError::Backend {
            message: e.to_string(),
        })?;
        tables
            .ordered_posts(topic_id)
            .get(offset)
            .map(|row| tables.post_record(row))
            .transpose()
    }

    async fn find_post_topic(&mut self, id: PostId) -> Result<Option<TopicId>, StoreError> {
        Ok(self.working.posts.get(&id).map(|p| p.topic_id))
    }

    async fn insert_like(
        &mut self,
        item: LikeItem,
        person: PersonId,
    ) -> Result<bool, StoreError> {
        let tables = &mut self.working;
        if !tables.item_exists(item) || !tables.people.contains_key(&person) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: format!("{}_like_fkey", item.resource()),
            });
        }
        let inserted = match item {
            LikeItem::Topic(id) => tables.topic_likes.insert((id, person)),
            LikeItem::Post(id) => tables.post_likes.insert((id, person)),
        };
        if !inserted {
            // Plain INSERT semantics: the primary key rejects the duplicate.
            return Err(StoreError::UniqueViolation {
                constraint: format!("{}_like_pkey", item.resource()),
            });
        }
        Ok(true)
    }

    async fn delete_like(
        &mut self,
        item: LikeItem,
        person: PersonId,
    ) -> Result<bool, StoreError> {
        let tables = &mut self.working;
        Ok(match item {
            LikeItem::Topic(id) => tables.topic_likes.remove(&(id, person)),
            LikeItem::Post(id) => tables.post_likes.remove(&(id, person)),
        })
    }

    async fn adjust_post_likes(&mut self, post: PostId, delta: i64) -> Result<(), StoreError> {
        self.check_fault(Fault::AdjustPostLikes)?;
        if let Some(row) = self.working.posts.get_mut(&post) {
            let total = row.total_likes + delta;
            if total < 0 {
                return Err(StoreError::Backend {
                    message: "check constraint 'post_total_likes_check' violated".into(),
                });
            }
            row.total_likes = total;
        }
        Ok(())
    }

    async fn topic_likers(&mut self, topic_id: TopicId) -> Result<Vec<PersonRecord>, StoreError> {
        let tables = &self.working;
        tables
            .topic_likes
            .iter()
            .filter(|(topic, _)| *topic == topic_id)
            .map(|(_, person)| tables.person(*person).cloned())
            .collect()
    }
}
