//! Raw API records (camelCase JSON)
//!
//! Every field the backend may omit or send as `null` is an `Option` with a serde
//! default, so partially populated records still decode.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// User sub-record embedded in posts and comments, also returned by the
/// suggestion, search and following endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    pub id: i64,
    #[serde(default)]
    pub content: Option<String>,
    /// Comma-joined filenames or absolute URLs
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub user: Option<RawUser>,
    /// Comment count
    #[serde(default)]
    pub comments: Option<u32>,
    /// Like count
    #[serde(default)]
    pub likes: Option<u32>,
    #[serde(default)]
    pub is_liked: Option<bool>,
    #[serde(default)]
    pub share_count: Option<u32>,
    #[serde(default)]
    pub is_saved: Option<bool>,
    #[serde(default)]
    pub original_post_id: Option<i64>,
    #[serde(default)]
    pub original_user: Option<RawUser>,
    #[serde(default)]
    pub original_content: Option<String>,
    #[serde(default)]
    pub original_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    pub id: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub user: Option<RawUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub followers_count: Option<u32>,
    #[serde(default)]
    pub following_count: Option<u32>,
    #[serde(default)]
    pub posts_count: Option<u32>,
    #[serde(default)]
    pub is_following: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: i64,
    #[serde(default)]
    pub sender_username: Option<String>,
    #[serde(default)]
    pub sender_full_name: Option<String>,
    #[serde(default)]
    pub sender_profile_image: Option<String>,
    #[serde(default)]
    pub receiver_username: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, alias = "read")]
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConversation {
    #[serde(default)]
    pub other_user_id: Option<i64>,
    #[serde(default)]
    pub other_username: Option<String>,
    #[serde(default)]
    pub other_user_full_name: Option<String>,
    #[serde(default)]
    pub other_user_profile_image: Option<String>,
    #[serde(default)]
    pub last_message_content: Option<String>,
    #[serde(default)]
    pub last_message_created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_message_read: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    pub id: i64,
    #[serde(default)]
    pub actor_username: Option<String>,
    #[serde(default)]
    pub actor_full_name: Option<String>,
    #[serde(default)]
    pub actor_profile_image: Option<String>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, alias = "read")]
    pub is_read: Option<bool>,
}

/// Body of `POST /api/posts/{id}/like`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
}

/// Body of `POST /api/posts/{id}/save`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SaveResponse {
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `GET /api/auth/user`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_decodes_with_nulls() {
        let raw: RawPost = serde_json::from_value(json!({
            "id": 12,
            "content": "hello",
            "imageUrl": null,
            "createdAt": "2024-05-01T10:20:30.123456",
            "user": null,
            "likes": 3,
            "isLiked": false
        }))
        .unwrap();

        assert_eq!(raw.id, 12);
        assert!(raw.image_url.is_none());
        assert!(raw.user.is_none());
        assert_eq!(raw.likes, Some(3));
        assert!(raw.created_at.is_some());
        assert!(raw.original_user.is_none());
    }

    #[test]
    fn test_message_accepts_read_alias() {
        let raw: RawMessage = serde_json::from_value(json!({
            "id": 1,
            "senderUsername": "bob",
            "content": "hi",
            "read": true
        }))
        .unwrap();
        assert_eq!(raw.is_read, Some(true));
    }

    #[test]
    fn test_notification_type_field() {
        let raw: RawNotification = serde_json::from_value(json!({
            "id": 9,
            "actorUsername": "carol",
            "postId": 4,
            "type": "LIKE",
            "message": "liked your post"
        }))
        .unwrap();
        assert_eq!(raw.kind.as_deref(), Some("LIKE"));
        assert_eq!(raw.post_id, Some(4));
    }
}
