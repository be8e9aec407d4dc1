//! bboard-core: transactional business logic for a discussion board
//!
//! People register, create forums, open topics (always with an opening post),
//! reply with positionally numbered posts and like topics or posts. The rules
//! the store cannot express on its own live here: idempotent likes, like
//! counters kept in step with the like set, atomic topic creation and dense
//! post numbering.
//!
//! # Layout
//!
//! - [`models`]: validated input and read views
//! - [`store`]: the store gateway port plus the in-memory adapter
//! - [`directory`], [`catalog`], [`threads`], [`reactions`]: domain logic
//!   running inside a borrowed unit of work
//! - [`Board`]: one operation, one unit of work
//!
//! ```
//! use bboard_core::{Board, MemoryStore};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let board = Board::new(MemoryStore::new());
//! board.register("Ada", "ada", None).await?;
//! let forum = board.create_forum("General").await?;
//! let topic = board.create_topic(forum, "ada", "Hello", "First!").await?;
//!
//! let post = board.get_latest_post(topic).await?;
//! assert_eq!((post.position, post.likes), (1, 0));
//! # Ok::<(), bboard_core::BoardError>(())
//! # }).unwrap();
//! ```

pub mod board;
pub mod catalog;
pub mod directory;
pub mod error;
pub mod models;
pub mod reactions;
pub mod store;
pub mod threads;

pub use board::Board;
pub use error::{BoardError, ErrorKind, Outcome, Result};
pub use reactions::LikeChange;
pub use store::{LikeItem, MemoryStore, Store, StoreError, UnitOfWork};
