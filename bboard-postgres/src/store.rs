//! sqlx implementation of the store port
//!
//! Every statement is a fixed, parameter-bound string. Like statements are
//! chosen by matching on [`LikeItem`], never built from identifiers.

use async_trait::async_trait;
use bboard_core::models::{ForumId, PersonId, Position, PostId, TopicId};
use bboard_core::store::{
    ForumActivity, ForumRecord, NewPost, PersonRecord, PostRecord, TopicRecord,
};
use bboard_core::{LikeItem, Store, StoreError, UnitOfWork};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::classify;
use crate::{create_pool, PgStoreConfig, PgStoreError};

const POST_COLUMNS: &str = r#"
    SELECT p.id, p.topic_id, p.number, pe.name AS author_name,
           pe.username AS author_username, p.text, p.posted_at, p.total_likes
    FROM post p
    JOIN person pe ON pe.id = p.author_id
"#;

#[derive(Debug, FromRow)]
struct PersonRow {
    id: i64,
    name: String,
    username: String,
    student_id: Option<String>,
}

impl From<PersonRow> for PersonRecord {
    fn from(row: PersonRow) -> Self {
        Self {
            id: PersonId::new(row.id),
            name: row.name,
            username: row.username,
            student_id: row.student_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct ForumRow {
    id: i64,
    title: String,
}

impl From<ForumRow> for ForumRecord {
    fn from(row: ForumRow) -> Self {
        Self {
            id: ForumId::new(row.id),
            title: row.title,
        }
    }
}

#[derive(Debug, FromRow)]
struct TopicRow {
    id: i64,
    forum_id: i64,
    author_id: i64,
    title: String,
}

impl From<TopicRow> for TopicRecord {
    fn from(row: TopicRow) -> Self {
        Self {
            id: TopicId::new(row.id),
            forum_id: ForumId::new(row.forum_id),
            author_id: PersonId::new(row.author_id),
            title: row.title,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    topic_id: i64,
    number: i64,
    author_name: String,
    author_username: String,
    text: String,
    posted_at: DateTime<Utc>,
    total_likes: i64,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::new(row.id),
            topic_id: TopicId::new(row.topic_id),
            number: row.number,
            author_name: row.author_name,
            author_username: row.author_username,
            text: row.text,
            posted_at: row.posted_at,
            total_likes: row.total_likes,
        }
    }
}

/// Forum left-joined with its most active topic
#[derive(Debug, FromRow)]
struct ActivityRow {
    forum_id: i64,
    forum_title: String,
    topic_id: Option<i64>,
    topic_author_id: Option<i64>,
    topic_title: Option<String>,
}

impl From<ActivityRow> for ForumActivity {
    fn from(row: ActivityRow) -> Self {
        let forum_id = ForumId::new(row.forum_id);
        let latest_topic = match (row.topic_id, row.topic_author_id, row.topic_title) {
            (Some(id), Some(author_id), Some(title)) => Some(TopicRecord {
                id: TopicId::new(id),
                forum_id,
                author_id: PersonId::new(author_id),
                title,
            }),
            _ => None,
        };
        Self {
            forum: ForumRecord {
                id: forum_id,
                title: row.forum_title,
            },
            latest_topic,
        }
    }
}

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the pool from configuration and wrap it.
    pub async fn connect(config: &PgStoreConfig) -> Result<Self, PgStoreError> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Work = PgWork;

    async fn begin(&self) -> Result<PgWork, StoreError> {
        let tx = self.pool.begin().await.map_err(classify)?;
        Ok(PgWork { tx })
    }
}

/// One database transaction
///
/// Dropping it without commit rolls back.
pub struct PgWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgWork {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(classify)
    }

    async fn insert_person(
        &mut self,
        name: &str,
        username: &str,
        student_id: Option<&str>,
    ) -> Result<PersonId, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO person (name, username, student_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(username)
        .bind(student_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(PersonId::new(id))
    }

    async fn find_person(&mut self, username: &str) -> Result<Option<PersonRecord>, StoreError> {
        let row: Option<PersonRow> = sqlx::query_as(
            "SELECT id, name, username, student_id FROM person WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(row.map(PersonRecord::from))
    }

    async fn list_people(&mut self) -> Result<Vec<PersonRecord>, StoreError> {
        let rows: Vec<PersonRow> = sqlx::query_as(
            "SELECT id, name, username, student_id FROM person ORDER BY username",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(PersonRecord::from).collect())
    }

    async fn insert_forum(&mut self, title: &str) -> Result<ForumId, StoreError> {
        let (id,): (i64,) = sqlx::query_as("INSERT INTO forum (title) VALUES ($1) RETURNING id")
            .bind(title)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(ForumId::new(id))
    }

    async fn find_forum(&mut self, id: ForumId) -> Result<Option<ForumRecord>, StoreError> {
        let row: Option<ForumRow> = sqlx::query_as("SELECT id, title FROM forum WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(ForumRecord::from))
    }

    async fn find_forum_by_title(
        &mut self,
        title: &str,
    ) -> Result<Option<ForumRecord>, StoreError> {
        let row: Option<ForumRow> = sqlx::query_as("SELECT id, title FROM forum WHERE title = $1")
            .bind(title)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(ForumRecord::from))
    }

    async fn list_forums(&mut self) -> Result<Vec<ForumRecord>, StoreError> {
        let rows: Vec<ForumRow> = sqlx::query_as("SELECT id, title FROM forum ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(ForumRecord::from).collect())
    }

    async fn list_forum_activity(&mut self) -> Result<Vec<ForumActivity>, StoreError> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT
                f.id AS forum_id,
                f.title AS forum_title,
                t.id AS topic_id,
                t.author_id AS topic_author_id,
                t.title AS topic_title
            FROM forum f
            LEFT JOIN LATERAL (
                SELECT tp.id, tp.author_id, tp.title
                FROM topic tp
                JOIN post p ON p.topic_id = tp.id
                WHERE tp.forum_id = f.id
                GROUP BY tp.id
                ORDER BY MAX(p.posted_at) DESC, tp.id DESC
                LIMIT 1
            ) t ON TRUE
            ORDER BY f.id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(ForumActivity::from).collect())
    }

    async fn topics_in_forum(
        &mut self,
        forum_id: ForumId,
    ) -> Result<Vec<TopicRecord>, StoreError> {
        let rows: Vec<TopicRow> = sqlx::query_as(
            "SELECT id, forum_id, author_id, title FROM topic WHERE forum_id = $1 ORDER BY title, id",
        )
        .bind(forum_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(TopicRecord::from).collect())
    }

    async fn insert_topic(
        &mut self,
        forum_id: ForumId,
        author_id: PersonId,
        title: &str,
    ) -> Result<TopicId, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO topic (forum_id, author_id, title) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(forum_id.get())
        .bind(author_id.get())
        .bind(title)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(TopicId::new(id))
    }

    async fn find_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError> {
        let row: Option<TopicRow> =
            sqlx::query_as("SELECT id, forum_id, author_id, title FROM topic WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(classify)?;

        Ok(row.map(TopicRecord::from))
    }

    async fn lock_topic(&mut self, id: TopicId) -> Result<Option<TopicRecord>, StoreError> {
        let row: Option<TopicRow> = sqlx::query_as(
            "SELECT id, forum_id, author_id, title FROM topic WHERE id = $1 FOR UPDATE",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(row.map(TopicRecord::from))
    }

    async fn insert_post(&mut self, post: NewPost<'_>) -> Result<PostId, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO post (topic_id, author_id, number, text, posted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(post.topic_id.get())
        .bind(post.author_id.get())
        .bind(post.number)
        .bind(post.text)
        .bind(post.posted_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(PostId::new(id))
    }

    async fn count_posts(&mut self, topic_id: TopicId) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post WHERE topic_id = $1")
            .bind(topic_id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(count)
    }

    async fn posts_in_topic(&mut self, topic_id: TopicId) -> Result<Vec<PostRecord>, StoreError> {
        let sql = format!("{POST_COLUMNS} WHERE p.topic_id = $1 ORDER BY p.posted_at, p.id");
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(topic_id.get())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn latest_post(&mut self, topic_id: TopicId) -> Result<Option<PostRecord>, StoreError> {
        let sql = format!(
            "{POST_COLUMNS} WHERE p.topic_id = $1 ORDER BY p.posted_at DESC, p.id DESC LIMIT 1"
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(topic_id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(PostRecord::from))
    }

    async fn post_at(
        &mut self,
        topic_id: TopicId,
        position: Position,
    ) -> Result<Option<PostRecord>, StoreError> {
        let sql = format!(
            "{POST_COLUMNS} WHERE p.topic_id = $1 ORDER BY p.posted_at, p.id LIMIT 1 OFFSET $2"
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(topic_id.get())
            .bind(position.offset())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(PostRecord::from))
    }

    async fn find_post_topic(&mut self, id: PostId) -> Result<Option<TopicId>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT topic_id FROM post WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(|(topic_id,)| TopicId::new(topic_id)))
    }

    async fn insert_like(
        &mut self,
        item: LikeItem,
        person: PersonId,
    ) -> Result<bool, StoreError> {
        let statement = match item {
            LikeItem::Topic(_) => {
                "INSERT INTO topic_like (topic_id, person_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
            LikeItem::Post(_) => {
                "INSERT INTO post_like (post_id, person_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
        };
        let result = sqlx::query(statement)
            .bind(item.raw_id())
            .bind(person.get())
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_like(
        &mut self,
        item: LikeItem,
        person: PersonId,
    ) -> Result<bool, StoreError> {
        let statement = match item {
            LikeItem::Topic(_) => "DELETE FROM topic_like WHERE topic_id = $1 AND person_id = $2",
            LikeItem::Post(_) => "DELETE FROM post_like WHERE post_id = $1 AND person_id = $2",
        };
        let result = sqlx::query(statement)
            .bind(item.raw_id())
            .bind(person.get())
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected() > 0)
    }

    async fn adjust_post_likes(&mut self, post: PostId, delta: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE post SET total_likes = total_likes + $2 WHERE id = $1")
            .bind(post.get())
            .bind(delta)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn topic_likers(&mut self, topic_id: TopicId) -> Result<Vec<PersonRecord>, StoreError> {
        let rows: Vec<PersonRow> = sqlx::query_as(
            r#"
            SELECT pe.id, pe.name, pe.username, pe.student_id
            FROM topic_like tl
            JOIN person pe ON pe.id = tl.person_id
            WHERE tl.topic_id = $1
            "#,
        )
        .bind(topic_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(PersonRecord::from).collect())
    }
}
