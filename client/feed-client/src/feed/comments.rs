use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use super::inflight::{failed, InFlight, OpTarget, Operation};
use crate::api::{ImageUpload, NewComment, PostsApi};
use crate::error::{ClientError, Result};
use crate::models::{Comment, CommentId, PostId};
use crate::normalize::Normalizer;

/// Comments under one post
///
/// Every mutation is followed by a reload of the whole list. When that reload
/// fails the confirmed change is applied locally instead.
pub struct CommentThread {
    api: Arc<dyn PostsApi>,
    normalizer: Normalizer,
    post_id: PostId,
    comments: RwLock<Vec<Comment>>,
    inflight: InFlight,
}

impl CommentThread {
    pub fn new(api: Arc<dyn PostsApi>, normalizer: Normalizer, post_id: PostId) -> Self {
        Self {
            api,
            normalizer,
            post_id,
            comments: RwLock::new(Vec::new()),
            inflight: InFlight::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments.read().clone()
    }

    pub fn len(&self) -> usize {
        self.comments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.read().is_empty()
    }

    pub async fn load(&self) -> Result<usize> {
        let raw = self.api.list_comments(self.post_id).await.map_err(|e| {
            warn!(post_id = self.post_id, error = %e, "Failed to load comments");
            e
        })?;
        let comments: Vec<Comment> = raw
            .into_iter()
            .map(|c| self.normalizer.comment(c))
            .collect();
        let count = comments.len();
        *self.comments.write() = comments;
        debug!(post_id = self.post_id, count, "Comments loaded");
        Ok(count)
    }

    async fn reload_or<F: FnOnce(&mut Vec<Comment>)>(&self, fallback: F) {
        if self.load().await.is_err() {
            fallback(&mut *self.comments.write());
        }
    }

    pub async fn add(&self, text: &str, image: Option<ImageUpload>) -> Result<Comment> {
        let text = non_blank(text)?;
        let _guard = self
            .inflight
            .try_begin(OpTarget::CommentOn(self.post_id), Operation::Comment)?;

        let raw = self
            .api
            .add_comment(
                self.post_id,
                NewComment {
                    content: text.to_string(),
                    image,
                },
            )
            .await
            .map_err(failed(Operation::Comment, OpTarget::CommentOn(self.post_id)))?;
        let comment = self.normalizer.comment(raw);

        let added = comment.clone();
        self.reload_or(move |comments| {
            comments.retain(|c| c.id != added.id);
            comments.push(added);
        })
        .await;
        Ok(comment)
    }

    pub async fn edit(&self, comment_id: CommentId, text: &str) -> Result<Comment> {
        let text = non_blank(text)?;
        let _guard = self
            .inflight
            .try_begin(OpTarget::CommentOn(self.post_id), Operation::Edit)?;

        let raw = self
            .api
            .edit_comment(self.post_id, comment_id, text.to_string())
            .await
            .map_err(failed(Operation::Edit, OpTarget::CommentOn(self.post_id)))?;
        let comment = self.normalizer.comment(raw);

        let edited = comment.clone();
        self.reload_or(move |comments| {
            if let Some(slot) = comments.iter_mut().find(|c| c.id == edited.id) {
                *slot = edited;
            }
        })
        .await;
        Ok(comment)
    }

    pub async fn delete(&self, comment_id: CommentId) -> Result<()> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::CommentOn(self.post_id), Operation::Delete)?;

        self.api
            .delete_comment(self.post_id, comment_id)
            .await
            .map_err(failed(Operation::Delete, OpTarget::CommentOn(self.post_id)))?;
        self.reload_or(|comments| comments.retain(|c| c.id != comment_id))
            .await;
        Ok(())
    }
}

fn non_blank(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClientError::Validation("Comment text is empty".to_string()));
    }
    Ok(text)
}
