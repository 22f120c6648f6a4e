//! Post and comment endpoints
//!
//! GET    /api/posts                              - global feed
//! GET    /api/posts/user/{user_id}                - one user's posts
//! GET    /api/posts/saved                         - viewer's saved posts
//! POST   /api/posts                               - create (multipart)
//! GET    /api/posts/{id}                          - single post
//! PUT    /api/posts/{id}                          - edit (multipart)
//! DELETE /api/posts/{id}                          - delete
//! POST   /api/posts/{id}/like                     - toggle like, returns {liked}
//! POST   /api/posts/{id}/save                     - toggle save, returns {saved}
//! POST   /api/posts/{id}/share                    - re-share
//! GET/POST/PUT/DELETE /api/posts/{id}/comments[/{comment_id}]

use async_trait::async_trait;
use reqwest::multipart::Form;
use tracing::{debug, info};

use super::{ApiClient, ImageUpload};
use crate::error::Result;
use crate::models::wire::{LikeResponse, RawComment, RawPost, SaveResponse};
use crate::models::{CommentId, PostId};

/// Which post collection a feed shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedScope {
    Global,
    /// Posts authored by one user (server user id)
    Profile(i64),
    /// The viewer's saved posts
    Saved,
}

impl FeedScope {
    pub fn path(&self) -> String {
        match self {
            FeedScope::Global => "/api/posts".to_string(),
            FeedScope::Profile(user_id) => format!("/api/posts/user/{}", user_id),
            FeedScope::Saved => "/api/posts/saved".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub content: String,
    pub images: Vec<ImageUpload>,
}

/// Image part of an edit; absent for re-shares, which are caption-only
#[derive(Debug, Clone, PartialEq)]
pub struct ImageChanges {
    /// URLs of existing images that stay attached
    pub kept: Vec<String>,
    pub added: Vec<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostEdit {
    pub content: String,
    pub images: Option<ImageChanges>,
}

impl PostEdit {
    pub fn caption_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            images: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub content: String,
    pub image: Option<ImageUpload>,
}

/// Post-related calls the state managers depend on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn list_posts(&self, scope: FeedScope) -> Result<Vec<RawPost>>;

    async fn get_post(&self, post_id: PostId) -> Result<RawPost>;

    async fn create_post(&self, post: NewPost) -> Result<RawPost>;

    async fn update_post(&self, post_id: PostId, edit: PostEdit) -> Result<RawPost>;

    async fn delete_post(&self, post_id: PostId) -> Result<()>;

    async fn toggle_like(&self, post_id: PostId) -> Result<LikeResponse>;

    async fn toggle_save(&self, post_id: PostId) -> Result<SaveResponse>;

    async fn share_post(&self, post_id: PostId) -> Result<()>;

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<RawComment>>;

    async fn add_comment(&self, post_id: PostId, comment: NewComment) -> Result<RawComment>;

    async fn edit_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        content: String,
    ) -> Result<RawComment>;

    async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<()>;
}

fn post_form(content: String, images: Vec<ImageUpload>) -> Result<Form> {
    let mut form = Form::new().text("content", content);
    for image in images {
        form = form.part("images", image.into_part()?);
    }
    Ok(form)
}

fn edit_form(edit: PostEdit) -> Result<Form> {
    match edit.images {
        Some(changes) => {
            let form = post_form(edit.content, changes.added)?;
            Ok(form.text("keptImages", changes.kept.join(",")))
        }
        None => Ok(Form::new().text("content", edit.content)),
    }
}

#[async_trait]
impl PostsApi for ApiClient {
    async fn list_posts(&self, scope: FeedScope) -> Result<Vec<RawPost>> {
        let posts: Vec<RawPost> = self.send_json(self.get(&scope.path()), "list_posts").await?;
        debug!(?scope, count = posts.len(), "Fetched posts");
        Ok(posts)
    }

    async fn get_post(&self, post_id: PostId) -> Result<RawPost> {
        self.send_json(self.get(&format!("/api/posts/{}", post_id)), "get_post")
            .await
    }

    async fn create_post(&self, post: NewPost) -> Result<RawPost> {
        let image_count = post.images.len();
        let form = post_form(post.content, post.images)?;
        let created: RawPost = self
            .send_json(self.post("/api/posts").multipart(form), "create_post")
            .await?;
        info!(post_id = created.id, image_count, "Post created");
        Ok(created)
    }

    async fn update_post(&self, post_id: PostId, edit: PostEdit) -> Result<RawPost> {
        let form = edit_form(edit)?;
        let updated: RawPost = self
            .send_json(
                self.put(&format!("/api/posts/{}", post_id)).multipart(form),
                "update_post",
            )
            .await?;
        info!(post_id, "Post updated");
        Ok(updated)
    }

    async fn delete_post(&self, post_id: PostId) -> Result<()> {
        self.send_empty(self.delete(&format!("/api/posts/{}", post_id)), "delete_post")
            .await?;
        info!(post_id, "Post deleted");
        Ok(())
    }

    async fn toggle_like(&self, post_id: PostId) -> Result<LikeResponse> {
        self.send_json(self.post(&format!("/api/posts/{}/like", post_id)), "toggle_like")
            .await
    }

    async fn toggle_save(&self, post_id: PostId) -> Result<SaveResponse> {
        self.send_json(self.post(&format!("/api/posts/{}/save", post_id)), "toggle_save")
            .await
    }

    async fn share_post(&self, post_id: PostId) -> Result<()> {
        self.send_empty(self.post(&format!("/api/posts/{}/share", post_id)), "share_post")
            .await?;
        info!(post_id, "Post shared");
        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<RawComment>> {
        self.send_json(
            self.get(&format!("/api/posts/{}/comments", post_id)),
            "list_comments",
        )
        .await
    }

    async fn add_comment(&self, post_id: PostId, comment: NewComment) -> Result<RawComment> {
        let builder = self.post(&format!("/api/posts/{}/comments", post_id));
        let builder = match comment.image {
            Some(image) => builder.multipart(
                Form::new()
                    .text("content", comment.content)
                    .part("image", image.into_part()?),
            ),
            None => builder.form(&[("content", comment.content)]),
        };
        self.send_json(builder, "add_comment").await
    }

    async fn edit_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        content: String,
    ) -> Result<RawComment> {
        self.send_json(
            self.put(&format!("/api/posts/{}/comments/{}", post_id, comment_id))
                .form(&[("content", content)]),
            "edit_comment",
        )
        .await
    }

    async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<()> {
        self.send_empty(
            self.delete(&format!("/api/posts/{}/comments/{}", post_id, comment_id)),
            "delete_comment",
        )
        .await
    }
}
