//! Normalized view-models
//!
//! These are what state managers hold and what a front end renders. Image and
//! avatar URLs are always absolute (or the configured placeholder).

use chrono::NaiveDateTime;
use serde::Serialize;
use std::hash::Hash;

pub type PostId = i64;
pub type CommentId = i64;

/// Anything that can be de-duplicated by a stable key
pub trait Keyed {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// The original post a re-share points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedFrom {
    pub post_id: Option<PostId>,
    pub author: Author,
    pub text: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub author: Author,
    pub text: String,
    pub attached_image_urls: Vec<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub like_count: u32,
    pub viewer_has_liked: bool,
    pub comment_count: u32,
    pub share_count: u32,
    pub viewer_has_saved: bool,
    pub shared_from: Option<SharedFrom>,
}

impl Post {
    pub fn is_reshare(&self) -> bool {
        self.shared_from.is_some()
    }

    /// Adopt the server's answer to a like toggle.
    ///
    /// The flag and the count move together: the count changes by exactly one and
    /// only when the flag actually flips. Returns whether anything changed.
    pub fn apply_like(&mut self, liked: bool) -> bool {
        if self.viewer_has_liked == liked {
            return false;
        }
        self.viewer_has_liked = liked;
        self.like_count = if liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
        true
    }

    pub fn apply_save(&mut self, saved: bool) -> bool {
        let changed = self.viewer_has_saved != saved;
        self.viewer_has_saved = saved;
        changed
    }
}

impl Keyed for Post {
    type Key = PostId;

    fn key(&self) -> PostId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: Author,
    pub text: String,
    pub created_at: Option<NaiveDateTime>,
    pub image_url: Option<String>,
}

impl Keyed for Comment {
    type Key = CommentId;

    fn key(&self) -> CommentId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Option<i64>,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub avatar_url: String,
    pub background_url: String,
    pub verified: bool,
    pub followers_count: u32,
    pub following_count: u32,
    pub posts_count: u32,
    pub is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub verified: bool,
}

impl Keyed for UserSummary {
    type Key = String;

    fn key(&self) -> String {
        self.username.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub sender: Author,
    pub receiver_username: String,
    pub text: String,
    pub created_at: Option<NaiveDateTime>,
    pub read: bool,
}

impl Keyed for Message {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub other_user_id: Option<i64>,
    pub other_user: Author,
    pub last_message_text: String,
    pub last_message_at: Option<NaiveDateTime>,
    pub last_message_read: bool,
}

impl Keyed for Conversation {
    type Key = String;

    fn key(&self) -> String {
        self.other_user.username.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub actor: Author,
    pub post_id: Option<PostId>,
    pub kind: String,
    pub message: String,
    pub created_at: Option<NaiveDateTime>,
    pub read: bool,
}

impl Keyed for Notification {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}
