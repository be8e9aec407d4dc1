//! Domain models with validation at construction
//!
//! All caller input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod ids;
pub mod person;
pub mod post;
pub mod title;
pub mod validation;
pub mod views;

pub use ids::{ForumId, PersonId, PostId, TopicId};
pub use person::{NewPerson, Username};
pub use post::{Position, PostText};
pub use title::{ForumTitle, TopicTitle};
pub use validation::ValidationError;
pub use views::{
    format_timestamp, ForumSummary, ForumView, PersonView, PostView, SimpleForumSummary,
    SimplePostView, SimpleTopicSummary, SimpleTopicView, TopicView,
};
