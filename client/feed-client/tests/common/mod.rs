#![allow(dead_code)]

use std::sync::Arc;

use feed_client::{ClientConfig, FeedClient, MemorySession};
use serde_json::{json, Value};
use wiremock::{Match, MockServer, Request};

pub const TOKEN: &str = "test-token";

pub struct Harness {
    pub server: MockServer,
    pub session: Arc<MemorySession>,
    pub client: FeedClient,
}

impl Harness {
    pub async fn start() -> Self {
        let session = Arc::new(MemorySession::new());
        session.store(TOKEN, Some("alice".to_string()));
        Self::with_session(session).await
    }

    pub async fn with_session(session: Arc<MemorySession>) -> Self {
        let server = MockServer::start().await;
        let config = ClientConfig::default().with_base_url(server.uri());
        let client = FeedClient::new(&config, session.clone()).expect("client builds");
        Self {
            server,
            session,
            client,
        }
    }

    pub fn upload(&self, file: &str) -> String {
        format!("{}/uploads/{}", self.server.uri(), file)
    }
}

pub fn post_json(id: i64, likes: u32, liked: bool) -> Value {
    json!({
        "id": id,
        "content": format!("post {}", id),
        "imageUrl": "a.jpg,b.jpg",
        "createdAt": "2024-05-01T10:20:30",
        "user": { "id": 1, "username": "alice", "fullName": "Alice A", "profileImage": null },
        "comments": 0,
        "likes": likes,
        "isLiked": liked,
        "shareCount": 0,
        "isSaved": false
    })
}

pub fn reshare_json(id: i64) -> Value {
    let mut post = post_json(id, 0, false);
    post["imageUrl"] = Value::Null;
    post["originalPostId"] = json!(1);
    post["originalUser"] = json!({ "username": "bob" });
    post["originalContent"] = json!("the original");
    post["originalImageUrl"] = json!("orig.jpg");
    post
}

/// Matches requests whose raw body contains `needle`
pub struct BodyContains(pub &'static str);

impl Match for BodyContains {
    fn matches(&self, request: &Request) -> bool {
        String::from_utf8_lossy(&request.body).contains(self.0)
    }
}

/// Matches requests whose raw body does not contain `needle`
pub struct BodyLacks(pub &'static str);

impl Match for BodyLacks {
    fn matches(&self, request: &Request) -> bool {
        !String::from_utf8_lossy(&request.body).contains(self.0)
    }
}
