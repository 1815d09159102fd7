use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn report_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/consultations", get(handlers::consultation_statistics))
        .route(
            "/testing-bookings",
            get(handlers::testing_booking_statistics),
        )
        .route("/users/count", get(handlers::total_account_count))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
