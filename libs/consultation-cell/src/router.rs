use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/types", get(handlers::list_consultation_types))
        .route("/types", post(handlers::create_consultation_type))
        .route("/types/{type_id}", delete(handlers::retire_consultation_type))
        .route("/", post(handlers::register_consultation))
        .route("/{consultation_id}", get(handlers::get_consultation))
        .route(
            "/{consultation_id}/payment",
            get(handlers::get_consultation_payment),
        )
        .route(
            "/{consultation_id}/reschedule",
            patch(handlers::reschedule_consultation),
        )
        .route(
            "/{consultation_id}/complete",
            patch(handlers::complete_consultation),
        )
        .route(
            "/{consultation_id}/cancel",
            post(handlers::cancel_consultation),
        )
        .route(
            "/{consultation_id}/evaluate",
            patch(handlers::evaluate_consultation),
        )
        .route(
            "/consultants/{consultant_id}/schedule",
            get(handlers::get_consultant_day_schedule),
        )
        .route(
            "/consultants/{consultant_id}",
            get(handlers::list_consultant_consultations),
        )
        .route(
            "/customers/{customer_id}",
            get(handlers::list_customer_consultations),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
