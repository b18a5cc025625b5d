use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use chirp_db::error::StoreError;
use chirp_db::models::TweetRow;
use chirp_types::api::{Claims, CreateTweetRequest, TweetResponse};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tweet_id = Uuid::new_v4();

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let tid = tweet_id.to_string();
    let author_id = claims.sub.to_string();
    let content = req.content.clone();
    let created_at = tokio::task::spawn_blocking(move || db.db.insert_tweet(&tid, &author_id, &content))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })??;

    Ok((
        StatusCode::CREATED,
        Json(TweetResponse {
            id: tweet_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            content: req.content,
            created_at: parse_timestamp(&created_at, "tweet created_at"),
            like_count: 0,
            liked_by_me: false,
        }),
    ))
}

pub async fn get_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let tid = tweet_id.to_string();
    let viewer_id = claims.sub.to_string();

    let (row, counts, liked) = tokio::task::spawn_blocking(move || {
        let row = db.db.get_tweet(&tid)?.ok_or(StoreError::TweetNotFound {
            tweet_id: tid.clone(),
        })?;
        let counts = db.db.like_counts_for_tweets(std::slice::from_ref(&tid))?;
        let liked = db.db.liked_tweet_ids(&viewer_id)?;
        Ok::<_, StoreError>((row, counts, liked))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal(e)
    })??;

    let counts: HashMap<String, u64> = counts.into_iter().collect();
    let liked: HashSet<String> = liked.into_iter().collect();

    Ok(Json(tweet_response(row, &counts, &liked)))
}

/// Author-only deletion; the store distinguishes a missing tweet (404)
/// from someone else's tweet (403).
pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let tid = tweet_id.to_string();
    let acting_id = claims.sub.to_string();

    tokio::task::spawn_blocking(move || db.db.delete_tweet(&tid, &acting_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })??;

    Ok(StatusCode::NO_CONTENT)
}

/// Global reverse-chronological feed. Like counts come from one grouped
/// query and the viewer's liked flags from one membership set, never a
/// query per tweet.
pub async fn home_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer_id = claims.sub.to_string();

    let (rows, counts, liked) = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_tweets(None)?;
        let tweet_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let counts = db.db.like_counts_for_tweets(&tweet_ids)?;
        let liked = db.db.liked_tweet_ids(&viewer_id)?;
        Ok::<_, StoreError>((rows, counts, liked))
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

    Ok(Json(tweets))
}

pub(crate) fn tweet_response(
    row: TweetRow,
    like_counts: &HashMap<String, u64>,
    liked: &HashSet<String>,
) -> TweetResponse {
    let like_count = like_counts.get(&row.id).copied().unwrap_or(0);
    let liked_by_me = liked.contains(&row.id);

    TweetResponse {
        id: parse_uuid(&row.id, "tweet id"),
        author_id: parse_uuid(&row.author_id, "tweet author_id"),
        author_username: row.author_username,
        content: row.content,
        created_at: parse_timestamp(&row.created_at, "tweet created_at"),
        like_count,
        liked_by_me,
    }
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// Timestamps are stored as "YYYY-MM-DD HH:MM:SS[.ffffff]" without
/// timezone. Parse as naive UTC and convert.
pub(crate) fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, raw, e);
            DateTime::default()
        })
}
