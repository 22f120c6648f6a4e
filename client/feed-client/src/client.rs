use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiClient, FeedScope, PostsApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::feed::{CommentThread, FeedStateManager, LikeStrategy};
use crate::messaging::{ConversationFeed, ConversationList, NotificationFeed};
use crate::models::PostId;
use crate::normalize::Normalizer;
use crate::session::Session;
use crate::social::{FollowState, ProfileView};

/// Entry point wiring one API client and normalizer into per-screen managers
///
/// Every call to a factory method returns a fresh manager with its own state;
/// screens never share a post list.
#[derive(Debug, Clone)]
pub struct FeedClient {
    api: ApiClient,
    normalizer: Normalizer,
    poll_interval: Duration,
}

impl FeedClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn Session>) -> Result<Self> {
        let api = ApiClient::new(config, session)?;
        info!(base_url = %api.base_url(), "Feed client ready");
        Ok(Self {
            api,
            normalizer: Normalizer::from_config(config),
            poll_interval: config.poll_interval(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn posts_api(&self) -> Arc<dyn PostsApi> {
        Arc::new(self.api.clone())
    }

    pub fn feed(&self, scope: FeedScope) -> FeedStateManager {
        FeedStateManager::new(self.posts_api(), self.normalizer.clone(), scope)
    }

    pub fn feed_with(&self, scope: FeedScope, strategy: LikeStrategy) -> FeedStateManager {
        self.feed(scope).with_like_strategy(strategy)
    }

    pub fn comments(&self, post_id: PostId) -> CommentThread {
        CommentThread::new(self.posts_api(), self.normalizer.clone(), post_id)
    }

    pub fn follows(&self) -> FollowState {
        FollowState::new(self.api.clone(), self.normalizer.clone())
    }

    pub fn profiles(&self) -> ProfileView {
        ProfileView::new(self.api.clone(), self.normalizer.clone())
    }

    pub fn conversations(&self) -> ConversationList {
        ConversationList::new(self.api.clone(), self.normalizer.clone())
    }

    pub fn conversation(&self, username: impl Into<String>) -> ConversationFeed {
        ConversationFeed::new(self.api.clone(), self.normalizer.clone(), username)
    }

    pub fn notifications(&self) -> NotificationFeed {
        NotificationFeed::new(self.api.clone(), self.normalizer.clone())
    }
}
