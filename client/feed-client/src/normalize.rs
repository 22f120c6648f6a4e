//! Shape normalization: raw API records into view-models
//!
//! The backend returns uploaded assets either as bare filenames or as absolute
//! URLs, and packs post images into one comma-joined string. Every record that
//! reaches a state manager passes through [`Normalizer`] first.

use crate::config::ClientConfig;
use crate::models::wire::{
    RawComment, RawConversation, RawMessage, RawNotification, RawPost, RawProfile, RawUser,
};
use crate::models::{
    Author, Comment, Conversation, Message, Notification, Post, Profile, SharedFrom,
    UserSummary,
};

pub const UNKNOWN_USERNAME: &str = "unknown";
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown user";

#[derive(Debug, Clone)]
pub struct Normalizer {
    upload_base: String,
    avatar_placeholder: String,
    background_placeholder: String,
}

impl Normalizer {
    /// `upload_base` is the absolute prefix bare filenames are joined to,
    /// e.g. `http://localhost:8080/uploads`
    pub fn new(upload_base: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            upload_base: upload_base.into().trim_end_matches('/').to_string(),
            avatar_placeholder: defaults.avatar_placeholder,
            background_placeholder: defaults.background_placeholder,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            upload_base: config.upload_base_url(),
            avatar_placeholder: config.avatar_placeholder.clone(),
            background_placeholder: config.background_placeholder.clone(),
        }
    }

    pub fn upload_base(&self) -> &str {
        &self.upload_base
    }

    /// Resolve one stored asset reference to an absolute URL.
    ///
    /// Already absolute values (and values already carrying the upload base) pass
    /// through untouched, so resolving twice is the same as resolving once.
    pub fn resolve_asset(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.starts_with("http") || reference.starts_with(&self.upload_base) {
            return reference.to_string();
        }
        format!(
            "{}/{}",
            self.upload_base,
            reference.trim_start_matches('/')
        )
    }

    /// Split a comma-joined image field. Null or empty yields an empty list.
    pub fn resolve_image_list(&self, joined: Option<&str>) -> Vec<String> {
        joined
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| self.resolve_asset(entry))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn avatar(&self, profile_image: Option<&str>) -> String {
        self.resolve_or(profile_image, &self.avatar_placeholder)
    }

    pub fn background(&self, background_image: Option<&str>) -> String {
        self.resolve_or(background_image, &self.background_placeholder)
    }

    fn resolve_or(&self, reference: Option<&str>, placeholder: &str) -> String {
        match reference.map(str::trim) {
            Some(value) if !value.is_empty() => self.resolve_asset(value),
            _ => placeholder.to_string(),
        }
    }

    /// Author fields from a user sub-record; a missing record yields placeholders
    pub fn author(&self, user: Option<&RawUser>) -> Author {
        match user {
            Some(user) => self.author_from_parts(
                user.username.as_deref(),
                user.full_name.as_deref(),
                user.profile_image.as_deref(),
            ),
            None => self.placeholder_author(),
        }
    }

    fn author_from_parts(
        &self,
        username: Option<&str>,
        full_name: Option<&str>,
        profile_image: Option<&str>,
    ) -> Author {
        let username = username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(UNKNOWN_USERNAME)
            .to_string();
        let display_name = full_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| username.clone());

        Author {
            username,
            display_name,
            avatar_url: self.avatar(profile_image),
        }
    }

    pub fn placeholder_author(&self) -> Author {
        Author {
            username: UNKNOWN_USERNAME.to_string(),
            display_name: UNKNOWN_DISPLAY_NAME.to_string(),
            avatar_url: self.avatar_placeholder.clone(),
        }
    }

    pub fn post(&self, raw: RawPost) -> Post {
        let shared_from = if raw.original_user.is_some() || raw.original_post_id.is_some() {
            Some(SharedFrom {
                post_id: raw.original_post_id,
                author: self.author(raw.original_user.as_ref()),
                text: raw.original_content.clone().unwrap_or_default(),
                image_urls: self.resolve_image_list(raw.original_image_url.as_deref()),
            })
        } else {
            None
        };

        Post {
            id: raw.id,
            author: self.author(raw.user.as_ref()),
            attached_image_urls: self.resolve_image_list(raw.image_url.as_deref()),
            text: raw.content.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            like_count: raw.likes.unwrap_or(0),
            viewer_has_liked: raw.is_liked.unwrap_or(false),
            comment_count: raw.comments.unwrap_or(0),
            share_count: raw.share_count.unwrap_or(0),
            viewer_has_saved: raw.is_saved.unwrap_or(false),
            shared_from,
        }
    }

    /// Normalize a list response, keeping server order
    pub fn posts(&self, raw: Vec<RawPost>) -> Vec<Post> {
        raw.into_iter().map(|p| self.post(p)).collect()
    }

    pub fn comment(&self, raw: RawComment) -> Comment {
        Comment {
            id: raw.id,
            author: self.author(raw.user.as_ref()),
            text: raw.content.unwrap_or_default(),
            created_at: raw.created_at,
            image_url: raw
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(|u| self.resolve_asset(u)),
        }
    }

    pub fn profile(&self, raw: RawProfile) -> Profile {
        let author = self.author_from_parts(
            raw.username.as_deref(),
            raw.full_name.as_deref(),
            raw.profile_image.as_deref(),
        );

        Profile {
            id: raw.id,
            username: author.username,
            display_name: author.display_name,
            bio: raw.bio,
            location: raw.location,
            website: raw.website,
            avatar_url: author.avatar_url,
            background_url: self.background(raw.background_image.as_deref()),
            verified: raw.verified.unwrap_or(false),
            followers_count: raw.followers_count.unwrap_or(0),
            following_count: raw.following_count.unwrap_or(0),
            posts_count: raw.posts_count.unwrap_or(0),
            is_following: raw.is_following.unwrap_or(false),
        }
    }

    pub fn user_summary(&self, raw: RawUser) -> UserSummary {
        let verified = raw.verified.unwrap_or(false);
        let author = self.author(Some(&raw));
        UserSummary {
            username: author.username,
            display_name: author.display_name,
            avatar_url: author.avatar_url,
            verified,
        }
    }

    pub fn message(&self, raw: RawMessage) -> Message {
        Message {
            id: raw.id,
            sender: self.author_from_parts(
                raw.sender_username.as_deref(),
                raw.sender_full_name.as_deref(),
                raw.sender_profile_image.as_deref(),
            ),
            receiver_username: raw.receiver_username.unwrap_or_default(),
            text: raw.content.unwrap_or_default(),
            created_at: raw.created_at,
            read: raw.is_read.unwrap_or(false),
        }
    }

    pub fn conversation(&self, raw: RawConversation) -> Conversation {
        Conversation {
            other_user_id: raw.other_user_id,
            other_user: self.author_from_parts(
                raw.other_username.as_deref(),
                raw.other_user_full_name.as_deref(),
                raw.other_user_profile_image.as_deref(),
            ),
            last_message_text: raw.last_message_content.unwrap_or_default(),
            last_message_at: raw.last_message_created_at,
            last_message_read: raw.last_message_read.unwrap_or(false),
        }
    }

    pub fn notification(&self, raw: RawNotification) -> Notification {
        Notification {
            id: raw.id,
            actor: self.author_from_parts(
                raw.actor_username.as_deref(),
                raw.actor_full_name.as_deref(),
                raw.actor_profile_image.as_deref(),
            ),
            post_id: raw.post_id,
            kind: raw.kind.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
            created_at: raw.created_at,
            read: raw.is_read.unwrap_or(false),
        }
    }
}
