use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn blog_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_blogs))
        .route("/", post(handlers::create_blog))
        .route("/search", get(handlers::search_blogs))
        .route("/{blog_id}", get(handlers::get_blog))
        .route("/{blog_id}", put(handlers::update_blog))
        .route("/{blog_id}", delete(handlers::deactivate_blog))
        .route("/{blog_id}/comments", get(handlers::list_top_comments))
        .route("/{blog_id}/comments", post(handlers::create_comment))
        .route(
            "/comments/{comment_id}/replies",
            get(handlers::list_sub_comments),
        )
        .route("/comments/{comment_id}", put(handlers::update_comment))
        .route("/comments/{comment_id}", delete(handlers::remove_comment))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
