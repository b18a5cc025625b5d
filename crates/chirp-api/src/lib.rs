pub mod auth;
pub mod error;
pub mod follows;
pub mod likes;
pub mod middleware;
pub mod profiles;
pub mod tweets;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Assembles the full route table. Lives here (not in the server binary)
/// so integration tests can drive the router directly.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/home", get(tweets::home_feed))
        .route("/tweets", post(tweets::create_tweet))
        .route(
            "/tweets/{tweet_id}",
            get(tweets::get_tweet).delete(tweets::delete_tweet),
        )
        .route("/tweets/{tweet_id}/like", post(likes::toggle_like))
        .route("/users/{username}", get(profiles::user_profile))
        .route("/users/{username}/profile", put(profiles::edit_profile))
        .route(
            "/users/{username}/follow",
            post(follows::follow).delete(follows::unfollow),
        )
        .route("/users/{username}/following", get(follows::following))
        .route("/users/{username}/followers", get(follows::followers))
        .layer(axum::middleware::from_fn(require_auth))
        .with_state(state);

    public_routes.merge(protected_routes)
}
