use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;

use super::{directors, films, genres, mpa, reviews, users, AppState};

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Users and the friendship graph
        .route("/users", post(users::create))
        .route("/users", put(users::update))
        .route("/users", get(users::get_all))
        .route("/users/:id", get(users::get))
        .route("/users/:id", delete(users::delete))
        .route("/users/:id/friends/:friend_id", put(users::add_friend))
        .route("/users/:id/friends/:friend_id", delete(users::remove_friend))
        .route("/users/:id/friends", get(users::friends))
        .route("/users/:id/friends/common/:other_id", get(users::common_friends))
        .route("/users/:id/feed", get(users::feed))
        .route("/users/:id/recommendations", get(users::recommendations))
        // Films, likes, ranking, search
        .route("/films", post(films::create))
        .route("/films", put(films::update))
        .route("/films", get(films::get_all))
        .route("/films/:id", get(films::get))
        .route("/films/:id", delete(films::delete))
        .route("/films/:id/like/:user_id", put(films::like))
        .route("/films/:id/like/:user_id", delete(films::unlike))
        .route("/films/popular", get(films::popular))
        .route("/films/director/:director_id", get(films::director_films))
        .route("/films/search", get(films::search))
        .route("/films/common", get(films::common_films))
        // Reviews and usefulness votes
        .route("/reviews", post(reviews::create))
        .route("/reviews", put(reviews::update))
        .route("/reviews", get(reviews::get_many))
        .route("/reviews/:id", get(reviews::get))
        .route("/reviews/:id", delete(reviews::delete))
        .route("/reviews/:id/like/:user_id", put(reviews::like))
        .route("/reviews/:id/like/:user_id", delete(reviews::remove_like))
        .route("/reviews/:id/dislike/:user_id", put(reviews::dislike))
        .route("/reviews/:id/dislike/:user_id", delete(reviews::remove_dislike))
        // Directors
        .route("/directors", get(directors::get_all))
        .route("/directors", post(directors::create))
        .route("/directors", put(directors::update))
        .route("/directors/:id", get(directors::get))
        .route("/directors/:id", delete(directors::delete))
        // Reference catalogues
        .route("/genres", get(genres::get_all))
        .route("/genres/:id", get(genres::get))
        .route("/mpa", get(mpa::get_all))
        .route("/mpa/:id", get(mpa::get))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}
