use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use chirp_db::error::{StoreError, StoreResult};
use chirp_types::api::{Claims, FollowListResponse, FollowOutcome, FollowResponse};
use chirp_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::tweets::{parse_timestamp, parse_uuid};

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let edge_id = Uuid::new_v4();

    let db = state.clone();
    let follower_id = claims.sub.to_string();
    let result = tokio::task::spawn_blocking(move || {
        db.db.follow(&edge_id.to_string(), &follower_id, &username)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal(e)
    })?;

    follow_response(result)
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let follower_id = claims.sub.to_string();
    let result =
        tokio::task::spawn_blocking(move || db.db.unfollow(&follower_id, &username))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::internal(e)
            })?;

    follow_response(result)
}

/// Business-rule rejections (self-follow, duplicate follow, missing edge)
/// come back as a no-op with a warning; the request itself succeeds.
/// Everything else maps through the usual error taxonomy.
fn follow_response(result: StoreResult<()>) -> Result<Json<FollowResponse>, ApiError> {
    match result {
        Ok(()) => Ok(Json(FollowResponse {
            status: FollowOutcome::Ok,
            warning: None,
        })),
        Err(
            err @ (StoreError::SelfFollow
            | StoreError::AlreadyFollowing { .. }
            | StoreError::NotFollowing { .. }),
        ) => Ok(Json(FollowResponse {
            status: FollowOutcome::NoOp,
            warning: Some(err.to_string()),
        })),
        Err(other) => Err(other.into()),
    }
}

pub async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    list_edges(state, username, EdgeSide::Following).await
}

pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    list_edges(state, username, EdgeSide::Followers).await
}

enum EdgeSide {
    Following,
    Followers,
}

async fn list_edges(
    state: AppState,
    username: String,
    side: EdgeSide,
) -> Result<Json<FollowListResponse>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let user = db
            .db
            .get_user_by_username(&username)?
            .ok_or(StoreError::UserNotFound {
                username: username.clone(),
            })?;

        match side {
            EdgeSide::Following => db.db.list_following(&user.id),
            EdgeSide::Followers => db.db.list_followers(&user.id),
        }
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::internal(e)
    })??;

    let users: Vec<User> = rows
        .into_iter()
        .map(|row| User {
            id: parse_uuid(&row.id, "user id"),
            username: row.username,
            created_at: parse_timestamp(&row.created_at, "user created_at"),
        })
        .collect();

    Ok(Json(FollowListResponse { users }))
}
