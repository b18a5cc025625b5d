use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use chirp_types::api::{Claims, LikeResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// Single toggle endpoint rather than separate like/unlike routes: the
/// store flips the edge and reports which way it went, so there is no
/// "already liked" ambiguity at the API boundary. Any authenticated user
/// may toggle any tweet.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let like_id = Uuid::new_v4();

    let db = state.clone();
    let lid = like_id.to_string();
    let tid = tweet_id.to_string();
    let user_id = claims.sub.to_string();
    let (liked, count) = tokio::task::spawn_blocking(move || db.db.toggle_like(&lid, &tid, &user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })??;

    Ok(Json(LikeResponse {
        tweet_id,
        liked,
        count,
    }))
}
