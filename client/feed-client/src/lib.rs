//! Nova Feed Client
//!
//! Client-side state for the social feed: normalized post lists with
//! server-confirmed updates, comment threads, the follow graph, and polled
//! conversation and notification lists over the Nova REST API.

pub mod api;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod messaging;
pub mod models;
pub mod normalize;
pub mod polling;
pub mod session;
pub mod social;

pub use api::{ApiClient, FeedScope, ImageUpload, PostsApi, ProfileUpdate};
pub use client::FeedClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use feed::{CommentThread, Confirm, FeedStateManager, LikeStrategy};
pub use messaging::{ConversationFeed, ConversationList, NotificationFeed};
pub use models::wire::{AuthResponse, CurrentUser, SignupRequest};
pub use models::{Comment, Conversation, Message, Notification, Post, PostId, Profile, UserSummary};
pub use normalize::Normalizer;
pub use polling::{merge_by_id, Poller};
pub use session::{MemorySession, Session};
pub use social::{FollowState, ProfileView};
