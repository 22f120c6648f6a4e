//! Feed operations against a mocked REST API
//!
//! Run: cargo test -p feed-client --test feed_http_test

mod common;

use common::{post_json, reshare_json, BodyContains, BodyLacks, Harness, TOKEN};
use feed_client::{ClientError, FeedScope, ImageUpload, LikeStrategy, Post, Session, SignupRequest};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

// ============================================
// Auth and transport
// ============================================

#[tokio::test]
async fn test_bearer_token_attached_and_urls_normalized() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 0, false)])))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    assert_eq!(feed.refresh().await.unwrap(), 1);

    let post = feed.get(1).unwrap();
    assert_eq!(
        post.attached_image_urls,
        vec![h.upload("a.jpg"), h.upload("b.jpg")]
    );
    assert_eq!(post.author.display_name, "Alice A");
    assert_eq!(post.author.avatar_url, "/default-profile.png");
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let h = Harness::start().await;
    let mut login_required = h.session.login_required();
    Mock::given(method("GET"))
        .and(path("/api/posts/saved"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Saved);
    let err = feed.refresh().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(h.session.token().is_none());
    assert!(*login_required.borrow_and_update());
}

#[tokio::test]
async fn test_error_statuses_map_to_variants() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/user/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/user/500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let missing = h.client.feed(FeedScope::Profile(404)).refresh().await.unwrap_err();
    assert!(matches!(missing, ClientError::NotFound(ref m) if m.contains("no such user")));

    let broken = h.client.feed(FeedScope::Profile(500)).refresh().await.unwrap_err();
    assert_eq!(broken.status_code(), Some(500));
    assert!(broken.is_retryable());
    // The session survives non-auth failures
    assert!(h.session.is_signed_in());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
        .mount(&h.server)
        .await;

    let err = h.client.feed(FeedScope::Global).refresh().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_login_sends_json_credentials() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"usernameOrEmail": "alice", "password": "hunter2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "fresh", "username": "alice"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let auth = h.client.api().login("alice", "hunter2").await.unwrap();
    assert_eq!(auth.token, "fresh");
    assert_eq!(auth.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_signup_sends_json_account() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({
            "username": "dana",
            "email": "dana@example.com",
            "password": "s3cret"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "new-account", "username": "dana"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let auth = h
        .client
        .api()
        .signup(SignupRequest {
            username: " dana ".into(),
            email: "dana@example.com".into(),
            password: "s3cret".into(),
        })
        .await
        .unwrap();
    assert_eq!(auth.token, "new-account");
    assert_eq!(auth.username.as_deref(), Some("dana"));
}

#[tokio::test]
async fn test_signup_with_missing_field_sends_nothing() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h
        .client
        .api()
        .signup(SignupRequest {
            username: "dana".into(),
            email: "  ".into(),
            password: "s3cret".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_current_user_uses_session_token() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"username": "alice", "email": "alice@example.com"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let me = h.client.api().current_user().await.unwrap();
    assert_eq!(me.username.as_deref(), Some("alice"));
    assert_eq!(me.email.as_deref(), Some("alice@example.com"));
}

// ============================================
// Likes
// ============================================

#[tokio::test]
async fn test_like_then_unlike_round_trip() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 3, false)])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": true})))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": false})))
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();

    assert!(feed.toggle_like(1).await.unwrap());
    let post = feed.get(1).unwrap();
    assert_eq!((post.like_count, post.viewer_has_liked), (4, true));

    assert!(!feed.toggle_like(1).await.unwrap());
    let post = feed.get(1).unwrap();
    assert_eq!((post.like_count, post.viewer_has_liked), (3, false));
}

#[tokio::test]
async fn test_refetch_strategy_reads_single_post() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 3, false)])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": true})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(1, 8, true)))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed_with(FeedScope::Global, LikeStrategy::Refetch);
    feed.refresh().await.unwrap();
    feed.toggle_like(1).await.unwrap();

    let post = feed.get(1).unwrap();
    assert_eq!((post.like_count, post.viewer_has_liked), (8, true));
}

// ============================================
// Create / edit / delete
// ============================================

#[tokio::test]
async fn test_create_sends_multipart() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .and(BodyContains("name=\"content\""))
        .and(BodyContains("name=\"images\"; filename=\"cat.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(2, 0, false)))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    let created = feed
        .create("hello", vec![ImageUpload::new("cat.png", vec![1, 2, 3])])
        .await
        .unwrap();

    assert_eq!(created.id, 2);
    assert_eq!(feed.posts()[0].id, 2);
}

#[tokio::test]
async fn test_empty_create_never_reaches_server() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(2, 0, false)))
        .expect(0)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    let err = feed.create("", vec![]).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_reshare_edit_omits_image_fields() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([reshare_json(5)])))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/posts/5"))
        .and(BodyContains("new caption"))
        .and(BodyLacks("name=\"keptImages\""))
        .and(BodyLacks("name=\"images\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(reshare_json(5)))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();
    assert!(feed.get(5).unwrap().is_reshare());

    feed.edit(
        5,
        "new caption",
        vec![h.upload("orig.jpg")],
        vec![ImageUpload::new("extra.png", vec![9])],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_plain_edit_sends_kept_images() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 0, false)])))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/posts/1"))
        .and(BodyContains("name=\"keptImages\""))
        .and(BodyContains("/uploads/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(1, 0, false)))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();
    feed.edit(1, "edited", vec![h.upload("a.jpg")], vec![])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 0, false)])))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/posts/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();

    let decline = |_: &Post| false;
    assert!(matches!(
        feed.delete(1, &decline).await.unwrap_err(),
        ClientError::NotConfirmed
    ));
    assert_eq!(feed.len(), 1);

    let accept = |_: &Post| true;
    feed.delete(1, &accept).await.unwrap();
    assert!(feed.is_empty());
}

// ============================================
// Saves, shares, comments
// ============================================

#[tokio::test]
async fn test_unsave_on_saved_feed_leaves_home_feed_alone() {
    let h = Harness::start().await;
    let mut saved_post = post_json(1, 0, false);
    saved_post["isSaved"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/api/posts/saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([saved_post.clone()])))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([saved_post])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"saved": false})))
        .mount(&h.server)
        .await;

    let home = h.client.feed(FeedScope::Global);
    let saved = h.client.feed(FeedScope::Saved);
    home.refresh().await.unwrap();
    saved.refresh().await.unwrap();

    assert!(!saved.toggle_save(1).await.unwrap());
    assert!(saved.is_empty());
    assert_eq!(home.len(), 1);
    assert!(home.get(1).unwrap().viewer_has_saved);
}

#[tokio::test]
async fn test_share_refetches_feed() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 0, false)])))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    let mut shared = post_json(1, 0, false);
    shared["shareCount"] = json!(1);
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([reshare_json(9), shared])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/share"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();
    feed.share(1).await.unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed.posts()[0].id, 9);
    assert_eq!(feed.get(1).unwrap().share_count, 1);
}

#[tokio::test]
async fn test_comment_is_form_encoded_and_count_refetched() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json(1, 0, false)])))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comments"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("content=great+shot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77,
            "content": "great shot",
            "user": {"username": "alice"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    let mut counted = post_json(1, 0, false);
    counted["comments"] = json!(4);
    Mock::given(method("GET"))
        .and(path("/api/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(counted))
        .mount(&h.server)
        .await;

    let feed = h.client.feed(FeedScope::Global);
    feed.refresh().await.unwrap();
    let comment = feed.add_comment(1, "great shot", None).await.unwrap();

    assert_eq!(comment.id, 77);
    assert_eq!(feed.get(1).unwrap().comment_count, 4);
}

#[tokio::test]
async fn test_comment_thread_reloads_after_add() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/3/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "content": "second"})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/3/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "content": "first", "user": null},
            {"id": 2, "content": "second", "imageUrl": "c.png"}
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let thread = h.client.comments(3);
    thread.add("second", None).await.unwrap();

    let comments = thread.comments();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author.username, "unknown");
    assert_eq!(comments[1].image_url, Some(h.upload("c.png")));
}

#[tokio::test]
async fn test_user_search_sends_query() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/search"))
        .and(query_param("query", "bo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"username": "bob", "fullName": "Bob B", "verified": true}
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let users = h.client.follows().search(" bo ").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].display_name, "Bob B");
    assert!(users[0].verified);
}
