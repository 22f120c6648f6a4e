use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::inflight::{failed, InFlight, OpTarget, Operation};
use crate::api::{FeedScope, ImageChanges, ImageUpload, NewComment, NewPost, PostEdit, PostsApi};
use crate::error::{ClientError, Result};
use crate::models::{Comment, Post, PostId};
use crate::normalize::Normalizer;
use crate::polling::merge_by_id;

/// How a like/unlike response is folded into local state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LikeStrategy {
    /// Adopt the server's `liked` flag, adjusting the count by one when it differs
    #[default]
    Patch,
    /// Re-read the single post after the toggle
    Refetch,
}

/// Gate for destructive actions; returning `false` aborts before any request
pub trait Confirm {
    fn confirm(&self, post: &Post) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&Post) -> bool,
{
    fn confirm(&self, post: &Post) -> bool {
        self(post)
    }
}

/// In-memory list of posts for one feed
///
/// Local state only changes after the server confirms a mutation. Every
/// mutating call on a post holds that post's in-flight slot until it returns,
/// so a second mutation on the same post fails with [`ClientError::Busy`]
/// instead of racing the first.
pub struct FeedStateManager {
    api: Arc<dyn PostsApi>,
    normalizer: Normalizer,
    scope: FeedScope,
    like_strategy: LikeStrategy,
    posts: RwLock<Vec<Post>>,
    inflight: InFlight,
    cancel: CancellationToken,
}

impl FeedStateManager {
    pub fn new(api: Arc<dyn PostsApi>, normalizer: Normalizer, scope: FeedScope) -> Self {
        Self {
            api,
            normalizer,
            scope,
            like_strategy: LikeStrategy::default(),
            posts: RwLock::new(Vec::new()),
            inflight: InFlight::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_like_strategy(mut self, strategy: LikeStrategy) -> Self {
        self.like_strategy = strategy;
        self
    }

    /// Tie this manager's lifetime to a parent token (e.g. the owning screen's)
    pub fn with_parent_token(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    pub fn scope(&self) -> FeedScope {
        self.scope
    }

    pub fn like_strategy(&self) -> LikeStrategy {
        self.like_strategy
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn posts(&self) -> Vec<Post> {
        self.posts.read().clone()
    }

    pub fn get(&self, post_id: PostId) -> Option<Post> {
        self.posts.read().iter().find(|p| p.id == post_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.read().is_empty()
    }

    pub fn is_busy(&self, post_id: PostId) -> bool {
        self.inflight.is_active(&OpTarget::Post(post_id))
    }

    pub fn is_creating(&self) -> bool {
        self.inflight.is_active(&OpTarget::Compose)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Cancel every in-flight operation; later calls fail with `Cancelled`
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            info!(scope = ?self.scope, "Tearing down feed");
            self.cancel.cancel();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn until_cancelled<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = call => {
                // A response that lands after teardown is dropped
                if self.cancel.is_cancelled() {
                    return Err(ClientError::Cancelled);
                }
                result
            }
        }
    }

    // ------------------------------------------------------------------
    // Local state helpers (never held across an await)
    // ------------------------------------------------------------------

    fn find(&self, post_id: PostId) -> Result<Post> {
        self.get(post_id)
            .ok_or_else(|| ClientError::NotFound(format!("Post {} is not in this feed", post_id)))
    }

    fn replace(&self, post: Post) -> bool {
        let mut posts = self.posts.write();
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        }
    }

    fn update<F: FnOnce(&mut Post)>(&self, post_id: PostId, f: F) -> bool {
        let mut posts = self.posts.write();
        match posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                f(post);
                true
            }
            None => false,
        }
    }

    fn remove(&self, post_id: PostId) -> bool {
        let mut posts = self.posts.write();
        let before = posts.len();
        posts.retain(|p| p.id != post_id);
        posts.len() != before
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Replace local state with the server's list, keeping server order
    pub async fn refresh(&self) -> Result<usize> {
        let raw = self
            .until_cancelled(self.api.list_posts(self.scope))
            .await
            .map_err(|e| {
                warn!(scope = ?self.scope, error = %e, "Feed refresh failed");
                e
            })?;

        let posts = merge_by_id(self.normalizer.posts(raw));
        let count = posts.len();
        *self.posts.write() = posts;
        debug!(scope = ?self.scope, count, "Feed replaced");
        Ok(count)
    }

    pub async fn create(&self, text: &str, images: Vec<ImageUpload>) -> Result<Post> {
        if text.trim().is_empty() && images.is_empty() {
            return Err(ClientError::Validation(
                "A post needs text or at least one image".to_string(),
            ));
        }
        let _guard = self.inflight.try_begin(OpTarget::Compose, Operation::Create)?;

        let raw = self
            .until_cancelled(self.api.create_post(NewPost {
                content: text.to_string(),
                images,
            }))
            .await
            .map_err(failed(Operation::Create, OpTarget::Compose))?;
        let post = self.normalizer.post(raw);

        if self.scope != FeedScope::Saved {
            let mut posts = self.posts.write();
            posts.retain(|p| p.id != post.id);
            posts.insert(0, post.clone());
        }
        info!(post_id = post.id, scope = ?self.scope, "Post created");
        Ok(post)
    }

    /// Re-shares only take a new caption; image arguments are ignored for them
    pub async fn edit(
        &self,
        post_id: PostId,
        new_text: &str,
        kept_image_urls: Vec<String>,
        new_images: Vec<ImageUpload>,
    ) -> Result<Post> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::Post(post_id), Operation::Edit)?;
        let current = self.find(post_id)?;

        let edit = if current.is_reshare() {
            if !kept_image_urls.is_empty() || !new_images.is_empty() {
                debug!(post_id, "Dropping image changes on a re-share");
            }
            PostEdit::caption_only(new_text)
        } else {
            if new_text.trim().is_empty() && kept_image_urls.is_empty() && new_images.is_empty() {
                return Err(ClientError::Validation(
                    "An edited post needs text or at least one image".to_string(),
                ));
            }
            PostEdit {
                content: new_text.to_string(),
                images: Some(ImageChanges {
                    kept: kept_image_urls,
                    added: new_images,
                }),
            }
        };

        let raw = self
            .until_cancelled(self.api.update_post(post_id, edit))
            .await
            .map_err(failed(Operation::Edit, OpTarget::Post(post_id)))?;
        let post = self.normalizer.post(raw);
        if !self.replace(post.clone()) {
            debug!(post_id, "Edited post left the feed before the response arrived");
        }
        Ok(post)
    }

    pub async fn delete<C: Confirm + ?Sized>(&self, post_id: PostId, confirm: &C) -> Result<()> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::Post(post_id), Operation::Delete)?;
        let post = self.find(post_id)?;

        if !confirm.confirm(&post) {
            info!(post_id, "Delete declined");
            return Err(ClientError::NotConfirmed);
        }

        self.until_cancelled(self.api.delete_post(post_id))
            .await
            .map_err(failed(Operation::Delete, OpTarget::Post(post_id)))?;
        self.remove(post_id);
        Ok(())
    }

    /// Returns the server's `liked` flag
    pub async fn toggle_like(&self, post_id: PostId) -> Result<bool> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::Post(post_id), Operation::Like)?;
        self.find(post_id)?;

        let response = self
            .until_cancelled(self.api.toggle_like(post_id))
            .await
            .map_err(failed(Operation::Like, OpTarget::Post(post_id)))?;

        match self.like_strategy {
            LikeStrategy::Patch => {
                self.update(post_id, |post| {
                    post.apply_like(response.liked);
                });
            }
            LikeStrategy::Refetch => match self.until_cancelled(self.api.get_post(post_id)).await {
                Ok(raw) => {
                    self.replace(self.normalizer.post(raw));
                }
                Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
                Err(e) => {
                    warn!(post_id, error = %e, "Re-reading liked post failed, applying server flag");
                    self.update(post_id, |post| {
                        post.apply_like(response.liked);
                    });
                }
            },
        }
        debug!(post_id, liked = response.liked, "Like applied");
        Ok(response.liked)
    }

    /// Returns the server's `saved` flag
    pub async fn toggle_save(&self, post_id: PostId) -> Result<bool> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::Post(post_id), Operation::Save)?;
        self.find(post_id)?;

        let response = self
            .until_cancelled(self.api.toggle_save(post_id))
            .await
            .map_err(failed(Operation::Save, OpTarget::Post(post_id)))?;

        match (self.scope, response.saved) {
            (FeedScope::Saved, false) => {
                self.remove(post_id);
                info!(post_id, "Unsaved post removed from saved feed");
            }
            (FeedScope::Saved, true) => match self.refresh().await {
                Ok(_) => {}
                Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
                Err(_) => {
                    self.update(post_id, |post| {
                        post.apply_save(true);
                    });
                }
            },
            (_, saved) => {
                self.update(post_id, |post| {
                    post.apply_save(saved);
                });
            }
        }
        Ok(response.saved)
    }

    pub async fn share(&self, post_id: PostId) -> Result<()> {
        let _guard = self
            .inflight
            .try_begin(OpTarget::Post(post_id), Operation::Share)?;
        self.find(post_id)?;

        self.until_cancelled(self.api.share_post(post_id))
            .await
            .map_err(failed(Operation::Share, OpTarget::Post(post_id)))?;

        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(_) => {
                // The share went through; show it on the original at least
                self.update(post_id, |post| {
                    post.share_count = post.share_count.saturating_add(1);
                });
                Ok(())
            }
        }
    }

    pub async fn add_comment(
        &self,
        post_id: PostId,
        text: &str,
        image: Option<ImageUpload>,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Validation("Comment text is empty".to_string()));
        }
        let _guard = self
            .inflight
            .try_begin(OpTarget::CommentOn(post_id), Operation::Comment)?;
        self.find(post_id)?;

        let raw = self
            .until_cancelled(self.api.add_comment(
                post_id,
                NewComment {
                    content: text.to_string(),
                    image,
                },
            ))
            .await
            .map_err(failed(Operation::Comment, OpTarget::CommentOn(post_id)))?;
        let comment = self.normalizer.comment(raw);

        match self.until_cancelled(self.api.get_post(post_id)).await {
            Ok(raw) => {
                self.replace(self.normalizer.post(raw));
            }
            Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
            Err(e) => {
                warn!(post_id, error = %e, "Re-reading commented post failed, counting locally");
                self.update(post_id, |post| {
                    post.comment_count = post.comment_count.saturating_add(1);
                });
            }
        }
        Ok(comment)
    }
}

impl Drop for FeedStateManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
