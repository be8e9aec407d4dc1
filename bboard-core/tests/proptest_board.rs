use bboard_core::{Board, LikeItem, MemoryStore};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: N replies give N+1 posts numbered 1..=N+1 with no gaps
    #[test]
    fn prop_posts_numbered_without_gaps(texts in prop::collection::vec("[a-z ]{0,12}[a-z]", 0..20)) {
        let (count, positions, last_text) = runtime().block_on(async {
            let board = Board::new(MemoryStore::new());
            board.register("Ada", "ada", None).await.unwrap();
            let forum = board.create_forum("General").await.unwrap();
            let topic = board.create_topic(forum, "ada", "Hello", "opening").await.unwrap();

            for text in &texts {
                board.create_post(topic, "ada", text).await.unwrap();
            }

            let count = board.count_posts(topic).await.unwrap();
            let view = board.get_topic(topic).await.unwrap();
            let positions: Vec<i64> = view.posts.iter().map(|p| p.position).collect();
            let last_text = board.get_latest_post(topic).await.unwrap().text;
            (count, positions, last_text)
        });

        let expected = i64::try_from(texts.len()).unwrap() + 1;
        prop_assert_eq!(count, expected);
        prop_assert_eq!(positions, (1..=expected).collect::<Vec<_>>());
        prop_assert_eq!(last_text, texts.last().cloned().unwrap_or_else(|| "opening".to_string()));
    }

    /// Property: the like counter always equals the number of like rows
    #[test]
    fn prop_like_counter_matches_like_set(
        toggles in prop::collection::vec((0usize..3, any::<bool>()), 0..40)
    ) {
        let users = ["ada", "bob", "cy"];
        let (likes, rows, expected) = runtime().block_on(async {
            let board = Board::new(MemoryStore::new());
            for user in users {
                board.register(user, user, None).await.unwrap();
            }
            let forum = board.create_forum("General").await.unwrap();
            let topic = board.create_topic(forum, "ada", "Hello", "opening").await.unwrap();
            let post = board.get_latest_post(topic).await.unwrap().post_id;

            let mut liked = [false; 3];
            for (who, want) in &toggles {
                board.set_post_like(users[*who], post, *want).await.unwrap();
                liked[*who] = *want;
            }

            let likes = board.get_latest_post(topic).await.unwrap().likes;
            let rows = board.store().like_count(LikeItem::Post(post)).await;
            let expected = liked.iter().filter(|l| **l).count();
            (likes, rows, expected)
        });

        prop_assert_eq!(rows, expected);
        prop_assert_eq!(usize::try_from(likes).unwrap(), rows);
    }
}
