//! Follow graph and profiles

use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::api::{ApiClient, ProfileUpdate};
use crate::error::{ClientError, Result};
use crate::feed::{failed, InFlight, OpTarget, Operation};
use crate::models::{Profile, UserSummary};
use crate::normalize::Normalizer;

/// Usernames the viewer follows, plus discovery lists
pub struct FollowState {
    api: ApiClient,
    normalizer: Normalizer,
    following: RwLock<BTreeSet<String>>,
    inflight: InFlight,
}

impl FollowState {
    pub fn new(api: ApiClient, normalizer: Normalizer) -> Self {
        Self {
            api,
            normalizer,
            following: RwLock::new(BTreeSet::new()),
            inflight: InFlight::new(),
        }
    }

    pub async fn load(&self) -> Result<usize> {
        let users = self.api.list_following().await.map_err(|e| {
            warn!(error = %e, "Failed to load followed users");
            e
        })?;
        let following: BTreeSet<String> = users
            .into_iter()
            .filter_map(|u| u.username)
            .filter(|name| !name.trim().is_empty())
            .collect();
        let count = following.len();
        *self.following.write() = following;
        Ok(count)
    }

    pub fn is_following(&self, username: &str) -> bool {
        self.following.read().contains(username)
    }

    pub fn following(&self) -> Vec<String> {
        self.following.read().iter().cloned().collect()
    }

    fn check_target(&self, username: &str) -> Result<String> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ClientError::Validation("Username is empty".to_string()));
        }
        if self.api.session().username().as_deref() == Some(username) {
            return Err(ClientError::Validation("You cannot follow yourself".to_string()));
        }
        Ok(username.to_string())
    }

    pub async fn follow(&self, username: &str) -> Result<()> {
        let username = self.check_target(username)?;
        let target = OpTarget::User(username.clone());
        let _guard = self.inflight.try_begin(target.clone(), Operation::Follow)?;

        self.api
            .follow(&username)
            .await
            .map_err(failed(Operation::Follow, target))?;
        self.following.write().insert(username);
        Ok(())
    }

    pub async fn unfollow(&self, username: &str) -> Result<()> {
        let username = self.check_target(username)?;
        let target = OpTarget::User(username.clone());
        let _guard = self.inflight.try_begin(target.clone(), Operation::Unfollow)?;

        self.api
            .unfollow(&username)
            .await
            .map_err(failed(Operation::Unfollow, target))?;
        self.following.write().remove(&username);
        Ok(())
    }

    /// Everyone but the viewer, as the server orders them
    pub async fn suggestions(&self) -> Result<Vec<UserSummary>> {
        let users = self.api.list_users().await?;
        let viewer = self.api.session().username();
        Ok(users
            .into_iter()
            .map(|u| self.normalizer.user_summary(u))
            .filter(|u| Some(&u.username) != viewer.as_ref())
            .collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::Validation("Search query is empty".to_string()));
        }
        let users = self.api.search_users(query).await?;
        debug!(query, count = users.len(), "User search");
        Ok(users
            .into_iter()
            .map(|u| self.normalizer.user_summary(u))
            .collect())
    }
}

/// Profile fetch and update
pub struct ProfileView {
    api: ApiClient,
    normalizer: Normalizer,
}

impl ProfileView {
    pub fn new(api: ApiClient, normalizer: Normalizer) -> Self {
        Self { api, normalizer }
    }

    /// `None` loads the viewer's own profile
    pub async fn load(&self, username: Option<&str>) -> Result<Profile> {
        let raw = match username.map(str::trim) {
            Some(name) if !name.is_empty() => self.api.get_profile(name).await?,
            _ => self.api.get_own_profile().await?,
        };
        Ok(self.normalizer.profile(raw))
    }

    pub async fn update(&self, update: ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".to_string()));
        }
        let raw = self.api.update_profile(update).await.map_err(|e| {
            warn!(error = %e, "Profile update failed");
            e
        })?;
        Ok(self.normalizer.profile(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemorySession;
    use std::sync::Arc;

    fn offline(session: MemorySession) -> (ApiClient, Normalizer) {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
        let api = ApiClient::new(&config, Arc::new(session)).unwrap();
        (api, Normalizer::from_config(&config))
    }

    #[tokio::test]
    async fn test_self_follow_rejected_without_call() {
        let session = MemorySession::new();
        session.store("t0k3n", Some("alice".into()));
        let (api, normalizer) = offline(session);
        let follows = FollowState::new(api, normalizer);

        let err = follows.follow(" alice ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(!follows.is_following("alice"));
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let (api, normalizer) = offline(MemorySession::new());
        let follows = FollowState::new(api.clone(), normalizer.clone());
        assert!(matches!(
            follows.search("  ").await.unwrap_err(),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            follows.unfollow("").await.unwrap_err(),
            ClientError::Validation(_)
        ));

        let profiles = ProfileView::new(api, normalizer);
        assert!(matches!(
            profiles.update(ProfileUpdate::default()).await.unwrap_err(),
            ClientError::Validation(_)
        ));
    }
}
