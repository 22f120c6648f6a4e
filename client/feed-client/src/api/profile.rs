//! Profiles and the follow graph
//!
//! GET  /api/profile                    - signed-in user's profile
//! GET  /api/profile/{username}         - another user's profile
//! PUT  /api/profile/update             - multipart update
//! GET  /api/profile/following          - usernames the viewer follows
//! GET  /api/users                      - suggestions (everyone but the viewer)
//! GET  /api/users/search?query=        - user search
//! POST /api/users/{username}/follow
//! POST /api/users/{username}/unfollow

use reqwest::multipart::Form;
use tracing::info;

use super::{segment, ApiClient, ImageUpload};
use crate::error::Result;
use crate::models::wire::{RawProfile, RawUser};

/// Fields left as `None` are not sent and stay unchanged server-side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<ImageUpload>,
    pub background_image: Option<ImageUpload>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.bio.is_none()
            && self.website.is_none()
            && self.location.is_none()
            && self.profile_image.is_none()
            && self.background_image.is_none()
    }

    fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in [
            ("fullName", self.full_name),
            ("bio", self.bio),
            ("website", self.website),
            ("location", self.location),
        ] {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        if let Some(image) = self.profile_image {
            form = form.part("profileImage", image.into_part()?);
        }
        if let Some(image) = self.background_image {
            form = form.part("backgroundImage", image.into_part()?);
        }
        Ok(form)
    }
}

impl ApiClient {
    pub async fn get_own_profile(&self) -> Result<RawProfile> {
        self.send_json(self.get("/api/profile"), "get_own_profile")
            .await
    }

    pub async fn get_profile(&self, username: &str) -> Result<RawProfile> {
        self.send_json(
            self.get(&format!("/api/profile/{}", segment(username))),
            "get_profile",
        )
        .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<RawProfile> {
        let form = update.into_form()?;
        let profile: RawProfile = self
            .send_json(
                self.put("/api/profile/update").multipart(form),
                "update_profile",
            )
            .await?;
        info!(username = profile.username.as_deref().unwrap_or(""), "Profile updated");
        Ok(profile)
    }

    pub async fn list_following(&self) -> Result<Vec<RawUser>> {
        self.send_json(self.get("/api/profile/following"), "list_following")
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<RawUser>> {
        self.send_json(self.get("/api/users"), "list_users").await
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<RawUser>> {
        self.send_json(
            self.get("/api/users/search").query(&[("query", query)]),
            "search_users",
        )
        .await
    }

    pub async fn follow(&self, username: &str) -> Result<()> {
        self.send_empty(
            self.post(&format!("/api/users/{}/follow", segment(username))),
            "follow",
        )
        .await?;
        info!(username, "Followed user");
        Ok(())
    }

    pub async fn unfollow(&self, username: &str) -> Result<()> {
        self.send_empty(
            self.post(&format!("/api/users/{}/unfollow", segment(username))),
            "unfollow",
        )
        .await?;
        info!(username, "Unfollowed user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            bio: Some("hi".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert!(update.into_form().is_ok());
    }
}
