//! Conversations, direct messages and notifications
//!
//! Each list is published through a `watch` channel so that a screen can
//! subscribe to it while a [`Poller`] keeps it fresh in the background.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{Conversation, Keyed, Message, Notification};
use crate::normalize::Normalizer;
use crate::polling::{merge_by_id, Poller};

struct Published<T> {
    tx: Arc<watch::Sender<Vec<T>>>,
}

impl<T: Keyed + Clone> Published<T> {
    fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(Vec::new()).0),
        }
    }

    fn current(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }

    fn replace(&self, items: Vec<T>) -> usize {
        let items = merge_by_id(items);
        let count = items.len();
        self.tx.send_replace(items);
        count
    }

    fn append(&self, item: T) {
        self.tx.send_modify(|items| {
            items.push(item);
            let merged = merge_by_id(std::mem::take(items));
            *items = merged;
        });
    }
}

async fn fetch_conversations(api: &ApiClient, normalizer: &Normalizer) -> Result<Vec<Conversation>> {
    let raw = api.list_conversations().await?;
    Ok(raw.into_iter().map(|c| normalizer.conversation(c)).collect())
}

async fn fetch_messages(
    api: &ApiClient,
    normalizer: &Normalizer,
    username: &str,
) -> Result<Vec<Message>> {
    let raw = api.get_conversation(username).await?;
    Ok(raw.into_iter().map(|m| normalizer.message(m)).collect())
}

async fn fetch_notifications(
    api: &ApiClient,
    normalizer: &Normalizer,
) -> Result<Vec<Notification>> {
    let raw = api.list_notifications().await?;
    Ok(raw.into_iter().map(|n| normalizer.notification(n)).collect())
}

/// The viewer's inbox: one entry per counterpart
pub struct ConversationList {
    api: ApiClient,
    normalizer: Normalizer,
    state: Published<Conversation>,
}

impl ConversationList {
    pub fn new(api: ApiClient, normalizer: Normalizer) -> Self {
        Self {
            api,
            normalizer,
            state: Published::new(),
        }
    }

    pub async fn refresh(&self) -> Result<usize> {
        let conversations = fetch_conversations(&self.api, &self.normalizer)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to load conversations");
                e
            })?;
        Ok(self.state.replace(conversations))
    }

    pub fn current(&self) -> Vec<Conversation> {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Conversation>> {
        self.state.subscribe()
    }

    pub fn start_polling(&self, interval: Duration) -> Poller {
        let api = self.api.clone();
        let normalizer = self.normalizer.clone();
        Poller::spawn(
            "conversations",
            interval,
            move || {
                let api = api.clone();
                let normalizer = normalizer.clone();
                async move { fetch_conversations(&api, &normalizer).await }
            },
            self.state.tx.clone(),
        )
    }
}

/// Messages exchanged with one other user
pub struct ConversationFeed {
    api: ApiClient,
    normalizer: Normalizer,
    username: String,
    state: Published<Message>,
}

impl ConversationFeed {
    pub fn new(api: ApiClient, normalizer: Normalizer, username: impl Into<String>) -> Self {
        Self {
            api,
            normalizer,
            username: username.into(),
            state: Published::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub async fn refresh(&self) -> Result<usize> {
        let messages = fetch_messages(&self.api, &self.normalizer, &self.username)
            .await
            .map_err(|e| {
                warn!(with = %self.username, error = %e, "Failed to load conversation");
                e
            })?;
        Ok(self.state.replace(messages))
    }

    pub fn current(&self) -> Vec<Message> {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.state.subscribe()
    }

    pub fn start_polling(&self, interval: Duration) -> Poller {
        let api = self.api.clone();
        let normalizer = self.normalizer.clone();
        let username = self.username.clone();
        Poller::spawn(
            "conversation",
            interval,
            move || {
                let api = api.clone();
                let normalizer = normalizer.clone();
                let username = username.clone();
                async move { fetch_messages(&api, &normalizer, &username).await }
            },
            self.state.tx.clone(),
        )
    }

    /// Appended to the list only once the server has stored it
    pub async fn send(&self, text: &str) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Validation("Message text is empty".to_string()));
        }

        let raw = self
            .api
            .send_message(&self.username, text)
            .await
            .map_err(|e| {
                warn!(to = %self.username, error = %e, "Failed to send message");
                e
            })?;
        let message = self.normalizer.message(raw);
        self.state.append(message.clone());
        debug!(message_id = message.id, to = %self.username, "Message appended");
        Ok(message)
    }
}

pub struct NotificationFeed {
    api: ApiClient,
    normalizer: Normalizer,
    state: Published<Notification>,
}

impl NotificationFeed {
    pub fn new(api: ApiClient, normalizer: Normalizer) -> Self {
        Self {
            api,
            normalizer,
            state: Published::new(),
        }
    }

    pub async fn refresh(&self) -> Result<usize> {
        let notifications = fetch_notifications(&self.api, &self.normalizer)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to load notifications");
                e
            })?;
        Ok(self.state.replace(notifications))
    }

    pub fn current(&self) -> Vec<Notification> {
        self.state.current()
    }

    pub fn unread_count(&self) -> usize {
        self.state.tx.borrow().iter().filter(|n| !n.read).count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.state.subscribe()
    }

    pub fn start_polling(&self, interval: Duration) -> Poller {
        let api = self.api.clone();
        let normalizer = self.normalizer.clone();
        Poller::spawn(
            "notifications",
            interval,
            move || {
                let api = api.clone();
                let normalizer = normalizer.clone();
                async move { fetch_notifications(&api, &normalizer).await }
            },
            self.state.tx.clone(),
        )
    }
}
