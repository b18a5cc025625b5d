use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chirp_api::auth::AppStateInner;

fn test_app() -> Router {
    let db = chirp_db::Database::open_in_memory().unwrap();
    let state = Arc::new(AppStateInner {
        db,
        // Matches the middleware fallback secret so minted tokens verify.
        jwt_secret: "dev-secret-change-me".into(),
    });
    chirp_api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "goodpass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_engagement_scenario() {
    let app = test_app();

    // alice signs up and tweets
    let alice = register(&app, "alice").await;
    let (status, tweet) = request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet_id = tweet["id"].as_str().unwrap().to_string();

    // the tweet leads the home feed
    let (status, feed) = request(&app, "GET", "/home", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed[0]["content"], "hello");
    assert_eq!(feed[0]["like_count"], 0);
    assert_eq!(feed[0]["liked_by_me"], false);

    // bob signs up and follows alice; the second follow is a no-op warning
    let bob = register(&app, "bob").await;
    let (status, body) =
        request(&app, "POST", "/users/alice/follow", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) =
        request(&app, "POST", "/users/alice/follow", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no-op");
    assert!(body["warning"].as_str().unwrap().contains("already following"));

    // like toggle is its own inverse
    let (status, body) = request(
        &app,
        "POST",
        &format!("/tweets/{tweet_id}/like"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["tweet_id"], tweet_id.as_str());

    // bob's view of the tweet shows his like
    let (status, body) = request(
        &app,
        "GET",
        &format!("/tweets/{tweet_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["liked_by_me"], true);

    let (_, body) = request(
        &app,
        "POST",
        &format!("/tweets/{tweet_id}/like"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["count"], 0);

    // alice deletes her tweet; the feed is empty again
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/tweets/{tweet_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, feed) = request(&app, "GET", "/home", Some(&alice), None).await;
    assert_eq!(feed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();

    let (status, _) = request(&app, "GET", "/home", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        "/tweets",
        Some("not-a-real-token"),
        Some(json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tweet_validation_reports_field_errors() {
    let app = test_app();
    let alice = register(&app, "alice").await;

    let (status, body) = request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "content");

    let long = "a".repeat(141);
    let (status, body) = request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": long })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "content");
    // The message names the bound and the actual length.
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("140"));
    assert!(message.contains("141"));

    let (status, _) = request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": "a".repeat(140) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn delete_distinguishes_missing_from_forbidden() {
    let app = test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (_, tweet) = request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": "mine" })),
    )
    .await;
    let tweet_id = tweet["id"].as_str().unwrap().to_string();

    // someone else's tweet: forbidden, and the tweet survives
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/tweets/{tweet_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "GET",
        &format!("/tweets/{tweet_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // unknown id: not found
    let missing = uuid::Uuid::new_v4();
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/tweets/{missing}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_edge_cases() {
    let app = test_app();
    let alice = register(&app, "alice").await;

    // self-follow is a warning, not an error
    let (status, body) =
        request(&app, "POST", "/users/alice/follow", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no-op");

    // unknown followee is a missing resource
    let (status, _) =
        request(&app, "POST", "/users/nobody/follow", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // unfollow without a follow is a warning
    let _bob = register(&app, "bob").await;
    let (status, body) =
        request(&app, "DELETE", "/users/bob/follow", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no-op");
    assert!(body["warning"].as_str().unwrap().contains("not following"));
}

#[tokio::test]
async fn profile_shows_counts_lists_and_viewer_flags() {
    let app = test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    request(
        &app,
        "POST",
        "/tweets",
        Some(&alice),
        Some(json!({ "content": "from alice" })),
    )
    .await;
    request(&app, "POST", "/users/alice/follow", Some(&bob), None).await;

    let (status, profile) = request(&app, "GET", "/users/alice", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["follower_count"], 1);
    assert_eq!(profile["following_count"], 0);
    assert_eq!(profile["followed_by_me"], true);
    assert_eq!(profile["tweets"][0]["content"], "from alice");

    let (_, profile) = request(&app, "GET", "/users/bob", Some(&alice), None).await;
    assert_eq!(profile["follower_count"], 0);
    assert_eq!(profile["following_count"], 1);
    assert_eq!(profile["followed_by_me"], false);

    let (_, body) = request(&app, "GET", "/users/alice/followers", Some(&bob), None).await;
    assert_eq!(body["users"][0]["username"], "bob");
    let (_, body) = request(&app, "GET", "/users/bob/following", Some(&bob), None).await;
    assert_eq!(body["users"][0]["username"], "alice");
}

#[tokio::test]
async fn profile_edit_is_owner_only() {
    let app = test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let update = json!({ "gender": 2, "self_intro": "rustacean" });

    let (status, _) = request(
        &app,
        "PUT",
        "/users/alice/profile",
        Some(&bob),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "PUT",
        "/users/nobody/profile",
        Some(&bob),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "PUT",
        "/users/alice/profile",
        Some(&alice),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, profile) = request(&app, "GET", "/users/alice", Some(&bob), None).await;
    assert_eq!(profile["gender"], 2);
    assert_eq!(profile["self_intro"], "rustacean");

    // over-long self introduction is a field error
    let (status, body) = request(
        &app,
        "PUT",
        "/users/alice/profile",
        Some(&alice),
        Some(json!({ "gender": 2, "self_intro": "x".repeat(253) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "self_intro");
}

#[tokio::test]
async fn login_verifies_credentials() {
    let app = test_app();
    register(&app, "alice").await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "goodpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    let token = body["token"].as_str().unwrap().to_string();

    // the minted token works against protected routes
    let (status, _) = request(&app, "GET", "/home", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrongpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "ghost", "password": "goodpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_is_a_field_error() {
    let app = test_app();
    register(&app, "alice").await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "goodpass",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "username");
}
