//! Table definitions for the board

use sqlx::PgPool;
use tracing::info;

use crate::PgStoreError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS person (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        username TEXT NOT NULL UNIQUE,
        student_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS forum (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topic (
        id BIGSERIAL PRIMARY KEY,
        forum_id BIGINT NOT NULL REFERENCES forum(id),
        author_id BIGINT NOT NULL REFERENCES person(id),
        title TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post (
        id BIGSERIAL PRIMARY KEY,
        topic_id BIGINT NOT NULL REFERENCES topic(id),
        author_id BIGINT NOT NULL REFERENCES person(id),
        number BIGINT NOT NULL CHECK (number >= 1),
        text TEXT NOT NULL,
        posted_at TIMESTAMPTZ NOT NULL,
        total_likes BIGINT NOT NULL DEFAULT 0 CHECK (total_likes >= 0),
        UNIQUE (topic_id, number)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS topic_like (
        topic_id BIGINT NOT NULL REFERENCES topic(id),
        person_id BIGINT NOT NULL REFERENCES person(id),
        PRIMARY KEY (topic_id, person_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_like (
        post_id BIGINT NOT NULL REFERENCES post(id),
        person_id BIGINT NOT NULL REFERENCES person(id),
        PRIMARY KEY (post_id, person_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_topic_forum ON topic (forum_id)",
    "CREATE INDEX IF NOT EXISTS idx_post_topic_order ON post (topic_id, posted_at, id)",
];

/// Create all board tables. Safe to run repeatedly.
pub async fn install(pool: &PgPool) -> Result<(), PgStoreError> {
    info!("installing board schema");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("board schema installed");
    Ok(())
}
