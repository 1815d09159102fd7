use std::sync::Arc;

use axum::{routing::get, Router};

use account_cell::router::account_routes;
use blog_cell::router::blog_routes;
use consultation_cell::router::consultation_routes;
use report_cell::router::report_routes;
use shared_config::AppConfig;
use testing_cell::router::testing_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Wellspring Clinic API is running!" }))
        .nest("/accounts", account_routes(state.clone()))
        .nest("/blogs", blog_routes(state.clone()))
        .nest("/consultations", consultation_routes(state.clone()))
        .nest("/testing", testing_routes(state.clone()))
        .nest("/reports", report_routes(state))
}
