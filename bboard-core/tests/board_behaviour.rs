//! Board behaviour over the in-memory store.

use bboard_core::models::{ForumId, TopicId, ValidationError};
use bboard_core::store::{Fault, NewPost, WorkStats};
use bboard_core::{
    Board, BoardError, ErrorKind, LikeChange, LikeItem, MemoryStore, Outcome, Store, UnitOfWork,
};
use chrono::{TimeZone, Utc};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("bboard_core=debug")
        .try_init();
}

async fn board_with_topic() -> (Board<MemoryStore>, ForumId, TopicId) {
    init_tracing();
    let board = Board::new(MemoryStore::new());
    board.register("Ada", "ada", None).await.unwrap();
    let forum = board.create_forum("General").await.unwrap();
    let topic = board
        .create_topic(forum, "ada", "Hello", "First!")
        .await
        .unwrap();
    (board, forum, topic)
}

fn assert_balanced(stats: WorkStats) {
    assert_eq!(stats.begun, stats.committed + stats.rolled_back);
}

#[tokio::test]
async fn worked_example() {
    let (board, _, topic) = board_with_topic().await;

    let post = board.get_latest_post(topic).await.unwrap();
    assert_eq!(post.position, 1);
    assert_eq!(post.text, "First!");
    assert_eq!(post.likes, 0);
    assert_eq!(post.author_username, "ada");

    board.set_post_like("ada", post.post_id, true).await.unwrap();
    let post = board.get_latest_post(topic).await.unwrap();
    assert_eq!(post.likes, 1);
}

#[tokio::test]
async fn create_topic_then_get_topic_has_one_post() {
    let (board, forum, topic) = board_with_topic().await;

    let view = board.get_topic(topic).await.unwrap();
    assert_eq!(view.forum_id, forum);
    assert_eq!(view.forum_title, "General");
    assert_eq!(view.title, "Hello");
    assert_eq!(view.posts.len(), 1);
    assert_eq!(view.posts[0].position, 1);
    assert_eq!(view.posts[0].author_name, "Ada");

    let simple = board.get_simple_topic(topic).await.unwrap();
    assert_eq!(simple.posts.len(), 1);
    assert_eq!(simple.posts[0].text, "First!");
}

#[tokio::test]
async fn posts_are_numbered_densely() {
    let (board, _, topic) = board_with_topic().await;
    board.register("Bob", "bob", Some("42")).await.unwrap();

    for i in 0..5 {
        let who = if i % 2 == 0 { "bob" } else { "ada" };
        board
            .create_post(topic, who, &format!("reply {i}"))
            .await
            .unwrap();
    }

    assert_eq!(board.count_posts(topic).await.unwrap(), 6);
    let view = board.get_topic(topic).await.unwrap();
    let positions: Vec<i64> = view.posts.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(view.posts[5].text, "reply 4");

    let latest = board.get_latest_post(topic).await.unwrap();
    assert_eq!(latest.position, 6);
    assert_eq!(latest.text, "reply 4");
}

#[tokio::test]
async fn concurrent_posts_get_distinct_numbers() {
    let (board, _, topic) = board_with_topic().await;
    let board = std::sync::Arc::new(board);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let board = std::sync::Arc::clone(&board);
            tokio::spawn(async move { board.create_post(topic, "ada", &format!("{i}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let view = board.get_topic(topic).await.unwrap();
    let positions: Vec<i64> = view.posts.iter().map(|p| p.position).collect();
    assert_eq!(positions, (1..=9).collect::<Vec<_>>());
    assert_eq!(board.count_posts(topic).await.unwrap(), 9);
}

#[tokio::test]
async fn liking_twice_counts_once() {
    let (board, _, topic) = board_with_topic().await;
    let post = board.get_latest_post(topic).await.unwrap().post_id;

    assert_eq!(
        board.set_post_like("ada", post, true).await.unwrap(),
        LikeChange::Changed
    );
    assert_eq!(
        board.set_post_like("ada", post, true).await.unwrap(),
        LikeChange::Unchanged
    );

    assert_eq!(board.get_latest_post(topic).await.unwrap().likes, 1);
    assert_eq!(board.store().like_count(LikeItem::Post(post)).await, 1);
}

#[tokio::test]
async fn unliking_never_liked_is_a_no_op() {
    let (board, _, topic) = board_with_topic().await;
    let post = board.get_latest_post(topic).await.unwrap().post_id;

    assert_eq!(
        board.set_post_like("ada", post, false).await.unwrap(),
        LikeChange::Unchanged
    );
    assert_eq!(board.get_latest_post(topic).await.unwrap().likes, 0);

    board.set_post_like("ada", post, true).await.unwrap();
    board.set_post_like("ada", post, false).await.unwrap();
    board.set_post_like("ada", post, false).await.unwrap();
    assert_eq!(board.get_latest_post(topic).await.unwrap().likes, 0);
}

#[tokio::test]
async fn like_post_by_position() {
    let (board, _, topic) = board_with_topic().await;
    board.create_post(topic, "ada", "second").await.unwrap();

    board.set_post_like_at("ada", topic, 2, true).await.unwrap();
    let view = board.get_topic(topic).await.unwrap();
    assert_eq!(view.posts[0].likes, 0);
    assert_eq!(view.posts[1].likes, 1);

    assert!(matches!(
        board.set_post_like_at("ada", topic, 3, true).await,
        Err(BoardError::NotFound { resource: "post", .. })
    ));
    assert_eq!(
        board.set_post_like_at("ada", topic, 0, true).await.unwrap_err(),
        BoardError::Validation(ValidationError::InvalidPosition { position: 0 })
    );
}

#[tokio::test]
async fn topic_likes_and_likers() {
    let (board, _, topic) = board_with_topic().await;
    board.register("Bob", "bob", Some("42")).await.unwrap();

    board.set_topic_like("ada", topic, true).await.unwrap();
    board.set_topic_like("bob", topic, true).await.unwrap();
    board.set_topic_like("bob", topic, true).await.unwrap();

    let mut likers: Vec<String> = board
        .get_likers(topic)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.username)
        .collect();
    likers.sort();
    assert_eq!(likers, vec!["ada", "bob"]);

    board.set_topic_like("ada", topic, false).await.unwrap();
    let likers = board.get_likers(topic).await.unwrap();
    assert_eq!(likers.len(), 1);
    assert_eq!(likers[0].student_id.as_deref(), Some("42"));
}

#[tokio::test]
async fn like_requires_existing_item_and_person() {
    let (board, _, topic) = board_with_topic().await;

    assert!(matches!(
        board.set_topic_like("ghost", topic, true).await,
        Err(BoardError::NotFound { resource: "person", .. })
    ));
    assert!(matches!(
        board.set_topic_like("ada", TopicId::new(999), true).await,
        Err(BoardError::NotFound { resource: "topic", .. })
    ));
    assert!(matches!(
        board.get_likers(TopicId::new(999)).await,
        Err(BoardError::NotFound { .. })
    ));
}

#[tokio::test]
async fn duplicate_forum_title_conflicts() {
    init_tracing();
    let board = Board::new(MemoryStore::new());
    board.create_forum("X").await.unwrap();

    let err = board.create_forum("X").await.unwrap_err();
    assert_eq!(err, BoardError::conflict("forum", "X"));
    assert_eq!(err.kind(), ErrorKind::Failure);

    let titles: Vec<String> = board
        .list_simple_forums()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(titles, vec!["X"]);
}

#[tokio::test]
async fn post_to_missing_topic_writes_nothing() {
    let (board, _, _) = board_with_topic().await;
    let before = board.store().row_counts().await;

    assert!(matches!(
        board.create_post(TopicId::new(999), "ada", "hello?").await,
        Err(BoardError::NotFound { resource: "topic", .. })
    ));
    assert_eq!(board.store().row_counts().await, before);
}

#[tokio::test]
async fn failed_opening_post_rolls_back_topic() {
    let (board, forum, _) = board_with_topic().await;
    let before = board.store().row_counts().await;

    board.store().fail_next(Fault::InsertPost).await;
    let err = board
        .create_topic(forum, "ada", "Doomed", "never stored")
        .await
        .unwrap_err();
    assert!(err.is_fatal());

    assert_eq!(board.store().row_counts().await, before);
    let topics = board.get_forum(forum).await.unwrap().topics;
    assert!(topics.iter().all(|t| t.title != "Doomed"));
    assert_balanced(board.store().stats().await);
}

#[tokio::test]
async fn failed_counter_update_rolls_back_like() {
    let (board, _, topic) = board_with_topic().await;
    let post = board.get_latest_post(topic).await.unwrap().post_id;

    board.store().fail_next(Fault::AdjustPostLikes).await;
    assert!(board.set_post_like("ada", post, true).await.unwrap_err().is_fatal());

    assert_eq!(board.store().like_count(LikeItem::Post(post)).await, 0);
    assert_eq!(board.get_latest_post(topic).await.unwrap().likes, 0);
}

#[tokio::test]
async fn commit_failure_is_fatal() {
    init_tracing();
    let board = Board::new(MemoryStore::new());
    board.store().fail_next(Fault::Commit).await;

    let outcome: Outcome<_> = board.create_forum("General").await.into();
    assert!(matches!(outcome, Outcome::Fatal(_)));
    assert!(board.list_simple_forums().await.unwrap().is_empty());
}

#[tokio::test]
async fn validation_happens_before_the_store() {
    init_tracing();
    let board = Board::new(MemoryStore::new());

    assert_eq!(
        board.register("", "ada", None).await.unwrap_err(),
        BoardError::Validation(ValidationError::Empty { field: "name" })
    );
    assert!(matches!(
        board.register("Ada", "ada", Some(" ")).await,
        Err(BoardError::Validation(_))
    ));
    assert!(matches!(
        board.create_forum("  ").await,
        Err(BoardError::Validation(_))
    ));
    assert!(matches!(
        board.create_post(TopicId::new(1), "ada", "").await,
        Err(BoardError::Validation(_))
    ));

    assert_eq!(board.store().stats().await, WorkStats::default());
}

#[tokio::test]
async fn every_operation_finishes_its_unit_of_work() {
    let (board, forum, topic) = board_with_topic().await;

    assert!(matches!(
        board.register("Ada", "ada", None).await,
        Err(BoardError::Conflict { resource: "username", .. })
    ));
    assert!(matches!(
        board.lookup_person("nobody").await,
        Err(BoardError::NotFound { resource: "person", .. })
    ));
    assert!(matches!(
        board.get_forum(ForumId::new(999)).await,
        Err(BoardError::NotFound { resource: "forum", .. })
    ));
    assert!(matches!(
        board.create_topic(ForumId::new(999), "ada", "t", "x").await,
        Err(BoardError::NotFound { resource: "forum", .. })
    ));
    assert_eq!(board.count_posts(topic).await, Ok(1));
    assert_eq!(board.list_forums().await.unwrap().len(), 1);
    assert_eq!(board.get_forum(forum).await.unwrap().topics.len(), 1);

    assert_balanced(board.store().stats().await);
}

#[tokio::test]
async fn people_directory() {
    init_tracing();
    let board = Board::new(MemoryStore::new());
    board.register("Ada", "ada", Some("1815")).await.unwrap();
    board.register("Bob", "bob", None).await.unwrap();

    assert!(matches!(
        board.register("Ada Again", "ada", None).await,
        Err(BoardError::Conflict { .. })
    ));

    let ada = board.lookup_person("ada").await.unwrap();
    assert_eq!(ada.name, "Ada");
    assert_eq!(ada.student_id.as_deref(), Some("1815"));
    assert_eq!(board.lookup_person("bob").await.unwrap().student_id, None);
    assert!(matches!(
        board.lookup_person("carol").await,
        Err(BoardError::NotFound { .. })
    ));

    let people = board.list_people().await.unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people["Ada"], "ada");
    assert_eq!(people["Bob"], "bob");
}

#[tokio::test]
async fn create_topic_checks_author_and_forum() {
    let (board, forum, _) = board_with_topic().await;

    assert!(matches!(
        board.create_topic(forum, "ghost", "t", "x").await,
        Err(BoardError::NotFound { resource: "person", .. })
    ));
    assert!(matches!(
        board.create_topic(ForumId::new(999), "ada", "t", "x").await,
        Err(BoardError::NotFound { resource: "forum", .. })
    ));
}

#[tokio::test]
async fn forum_listing_tracks_latest_activity() {
    let (board, forum, hello) = board_with_topic().await;
    let quiet = board.create_forum("Quiet").await.unwrap();
    let later = board
        .create_topic(forum, "ada", "Another", "second topic")
        .await
        .unwrap();

    let forums = board.list_forums().await.unwrap();
    assert_eq!(forums.len(), 2);
    assert_eq!(forums[0].id, forum);
    assert_eq!(
        forums[0].last_topic.as_ref().map(|t| t.topic_id),
        Some(later)
    );
    assert_eq!(forums[1].id, quiet);
    assert!(forums[1].last_topic.is_none());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    board.create_post(hello, "ada", "bump").await.unwrap();
    let forums = board.list_forums().await.unwrap();
    assert_eq!(
        forums[0].last_topic.as_ref().map(|t| t.topic_id),
        Some(hello)
    );
}

#[tokio::test]
async fn forum_topics_are_ordered_by_title() {
    let (board, forum, _) = board_with_topic().await;
    board.create_topic(forum, "ada", "Zebra", "z").await.unwrap();
    board.create_topic(forum, "ada", "Apple", "a").await.unwrap();

    let view = board.get_forum(forum).await.unwrap();
    assert_eq!(view.title, "General");
    let titles: Vec<&str> = view.topics.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Apple", "Hello", "Zebra"]);
}

#[tokio::test]
async fn missing_topic_reads_are_not_found() {
    let (board, _, _) = board_with_topic().await;
    let missing = TopicId::new(999);

    assert!(matches!(board.get_topic(missing).await, Err(BoardError::NotFound { .. })));
    assert!(matches!(
        board.get_simple_topic(missing).await,
        Err(BoardError::NotFound { .. })
    ));
    assert!(matches!(
        board.get_latest_post(missing).await,
        Err(BoardError::NotFound { .. })
    ));
    assert!(matches!(board.count_posts(missing).await, Err(BoardError::NotFound { .. })));
}

#[tokio::test]
async fn topic_without_posts_is_an_empty_topic() {
    let (board, forum, _) = board_with_topic().await;

    let mut work = board.store().begin().await.unwrap();
    let ada = work.find_person("ada").await.unwrap().unwrap().id;
    let bare = work.insert_topic(forum, ada, "Bare").await.unwrap();
    work.commit().await.unwrap();

    assert_eq!(
        board.get_topic(bare).await,
        Err(BoardError::EmptyTopic { topic_id: bare })
    );
    assert!(matches!(
        board.get_simple_topic(bare).await,
        Err(BoardError::EmptyTopic { .. })
    ));
    assert!(matches!(
        board.get_latest_post(bare).await,
        Err(BoardError::EmptyTopic { .. })
    ));
    assert_eq!(board.count_posts(bare).await, Ok(0));
    assert_balanced(board.store().stats().await);
}

#[tokio::test]
async fn forum_activity_tie_goes_to_higher_topic_id() {
    init_tracing();
    let board = Board::new(MemoryStore::new());
    board.register("Ada", "ada", None).await.unwrap();
    let forum = board.create_forum("General").await.unwrap();
    let same_minute = Utc.with_ymd_and_hms(2018, 3, 9, 14, 5, 0).unwrap();

    let mut work = board.store().begin().await.unwrap();
    let ada = work.find_person("ada").await.unwrap().unwrap().id;
    let mut topics = Vec::new();
    for title in ["First", "Second"] {
        let topic_id = work.insert_topic(forum, ada, title).await.unwrap();
        work.insert_post(NewPost {
            topic_id,
            author_id: ada,
            number: 1,
            text: "opening",
            posted_at: same_minute,
        })
        .await
        .unwrap();
        topics.push(topic_id);
    }
    work.commit().await.unwrap();

    let forums = board.list_forums().await.unwrap();
    assert_eq!(forums.len(), 1);
    let latest = forums[0].last_topic.as_ref().map(|t| t.topic_id);
    assert_eq!(latest, topics.iter().max().copied());
    assert_eq!(latest, Some(topics[1]));
}
