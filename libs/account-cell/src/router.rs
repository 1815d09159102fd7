use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn account_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register_customer));

    let protected_routes = Router::new()
        .route("/", post(handlers::register_account))
        .route("/consultants/active", get(handlers::list_active_consultants))
        .route(
            "/consultants/{consultant_id}/certificates",
            get(handlers::get_consultant_certificates),
        )
        .route("/{role}", get(handlers::list_accounts))
        .route("/{role}/{account_id}", get(handlers::get_account))
        .route("/{role}/{account_id}", put(handlers::update_account))
        .route(
            "/{role}/{account_id}/status",
            patch(handlers::update_account_status),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
