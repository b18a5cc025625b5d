use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::{error, warn};

use chirp_db::error::StoreError;
use chirp_types::api::{Claims, ProfileResponse, TweetResponse, UpdateProfileRequest};
use chirp_types::models::Gender;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::tweets::{parse_uuid, tweet_response};

/// Target's tweets plus follow-graph aggregates, with the viewer's liked
/// and following flags folded in.
pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer_id = claims.sub.to_string();

    let (user, profile, rows, counts, liked, following_count, follower_count, followed_by_me) =
        tokio::task::spawn_blocking(move || {
            let user = db
                .db
                .get_user_by_username(&username)?
                .ok_or(StoreError::UserNotFound {
                    username: username.clone(),
                })?;

            let profile = db.db.get_profile(&user.id)?;
            let rows = db.db.list_tweets(Some(&user.id))?;
            let tweet_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let counts = db.db.like_counts_for_tweets(&tweet_ids)?;
            let liked = db.db.liked_tweet_ids(&viewer_id)?;
            let following_count = db.db.count_following(&user.id)?;
            let follower_count = db.db.count_followers(&user.id)?;
            let followed_by_me = db.db.is_following(&viewer_id, &user.id)?;

            Ok::<_, StoreError>((
                user,
                profile,
                rows,
                counts,
                liked,
                following_count,
                follower_count,
                followed_by_me,
            ))
        })
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })??;

    let counts: HashMap<String, u64> = counts.into_iter().collect();
    let liked: HashSet<String> = liked.into_iter().collect();

    let tweets: Vec<TweetResponse> = rows
        .into_iter()
        .map(|row| tweet_response(row, &counts, &liked))
        .collect();

    let (gender, self_intro) = match profile {
        Some(p) => (gender_from_code(p.gender, &user.id), p.self_intro),
        None => {
            warn!("Missing profile row for user '{}'", user.id);
            (Gender::Unspecified, None)
        }
    };

    Ok(Json(ProfileResponse {
        user_id: parse_uuid(&user.id, "user id"),
        username: user.username,
        gender,
        self_intro,
        following_count,
        follower_count,
        followed_by_me,
        tweets,
    }))
}

/// Owner-only: the username must resolve to the acting identity.
pub async fn edit_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {username}")))?;

    if user.id != claims.sub.to_string() {
        return Err(ApiError::Forbidden);
    }

    state
        .db
        .update_profile(&user.id, u8::from(req.gender), req.self_intro.as_deref())?;

    Ok(Json(json!({
        "user_id": user.id,
        "gender": req.gender,
        "self_intro": req.self_intro,
    })))
}

fn gender_from_code(code: i64, user_id: &str) -> Gender {
    u8::try_from(code)
        .ok()
        .and_then(|c| Gender::try_from(c).ok())
        .unwrap_or_else(|| {
            warn!("Corrupt gender code {} for user '{}'", code, user_id);
            Gender::Unspecified
        })
}
