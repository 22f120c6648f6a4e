//! REST client for the social API
//!
//! `ApiClient` owns the `reqwest::Client`, the API origin and the session. Every
//! request goes through [`ApiClient::send`], which attaches the bearer token,
//! turns non-2xx answers into [`ClientError`] and clears the session on 401.
//!
//! Endpoint groups live in submodules; each returns raw wire records; callers
//! normalize them.

mod auth;
mod messages;
mod notifications;
mod posts;
mod profile;
mod upload;

pub use posts::{FeedScope, ImageChanges, NewComment, NewPost, PostEdit, PostsApi};
pub use profile::ProfileUpdate;
pub use upload::ImageUpload;

#[cfg(test)]
pub use posts::MockPostsApi;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<dyn Session>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.session.token().is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn Session>) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.origin().to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.delete(self.url(path)))
    }

    /// Send a request and require a 2xx answer
    pub(crate) async fn send(&self, builder: RequestBuilder, op: &'static str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(op, error = %e, "Request failed before a response arrived");
            ClientError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(op, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(op, "API rejected credentials, clearing session");
            self.session.on_unauthorized();
            return Err(ClientError::Unauthorized);
        }

        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        error!(op, status = status.as_u16(), %message, "API returned an error");
        Err(ClientError::from_status(status, message))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        op: &'static str,
    ) -> Result<T> {
        let response = self.send(builder, op).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!(op, error = %e, "Response body did not match the expected shape");
            ClientError::Decode(format!("{}: {}", op, e))
        })
    }

    pub(crate) async fn send_empty(&self, builder: RequestBuilder, op: &'static str) -> Result<()> {
        self.send(builder, op).await.map(|_| ())
    }
}

/// Percent-encode a user-supplied path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
