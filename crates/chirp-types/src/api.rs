use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Gender, User};

// -- JWT Claims --

/// JWT claims shared between the auth handlers (token minting) and the
/// request middleware (token validation). Canonical definition lives here in
/// chirp-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Tweets --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTweetRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub like_count: u64,
    pub liked_by_me: bool,
}

// -- Likes --

/// Toggle result consumed asynchronously by the client, no page reload.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub tweet_id: Uuid,
    pub liked: bool,
    pub count: u64,
}

// -- Follows --

/// Business-rule rejections (self-follow, duplicate follow, unfollow without
/// a follow) come back as `NoOp` with a warning message; the request itself
/// still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowOutcome {
    Ok,
    NoOp,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub status: FollowOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub gender: Gender,
    pub self_intro: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub gender: Gender,
    pub self_intro: Option<String>,
    pub following_count: u64,
    pub follower_count: u64,
    /// Whether the acting viewer follows this user.
    pub followed_by_me: bool,
    pub tweets: Vec<TweetResponse>,
}

#[derive(Debug, Serialize)]
pub struct FollowListResponse {
    pub users: Vec<User>,
}
