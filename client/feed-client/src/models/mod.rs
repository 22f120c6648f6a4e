//! Data models
//!
//! `wire` holds the records exactly as the REST API serializes them; `view` holds
//! the normalized view-models the state managers own. [`crate::normalize`] is the
//! only place that converts one into the other.

pub mod view;
pub mod wire;

pub use view::{
    Author, Comment, CommentId, Conversation, Keyed, Message, Notification, Post, PostId,
    Profile, SharedFrom, UserSummary,
};
