use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/auth", get(handlers::authorization))
        .route("/gallery", get(handlers::gallery))
        .route("/images", get(handlers::image_links))
        .route("/upload", post(handlers::upload))
        .route("/categories", post(handlers::create_category))
        .route("/logout", get(handlers::logout))
        .with_state(state)
}
