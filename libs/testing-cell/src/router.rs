use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn testing_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        // Catalog
        .route("/types", get(handlers::list_service_types))
        .route("/types", post(handlers::create_service_type))
        .route("/services", get(handlers::list_services))
        .route("/services", post(handlers::create_service))
        .route("/services/{service_id}", get(handlers::get_service))
        .route(
            "/services/{service_id}/status",
            patch(handlers::update_service_status),
        )
        .route(
            "/services/{service_id}/templates",
            get(handlers::list_service_templates),
        )
        // Bookings
        .route("/bookings", post(handlers::register_booking))
        .route("/bookings/schedule", get(handlers::unavailable_slots))
        .route("/bookings/{booking_id}", get(handlers::get_booking))
        .route(
            "/bookings/{booking_id}/payment",
            get(handlers::get_booking_payment),
        )
        .route("/bookings/{booking_id}/start", patch(handlers::start_booking))
        .route(
            "/bookings/{booking_id}/complete",
            patch(handlers::complete_booking),
        )
        .route(
            "/bookings/{booking_id}/cancel",
            post(handlers::cancel_booking),
        )
        .route(
            "/bookings/{booking_id}/evaluate",
            patch(handlers::evaluate_booking),
        )
        .route(
            "/bookings/{booking_id}/overall-result",
            post(handlers::overall_result),
        )
        .route(
            "/bookings/customers/{customer_id}",
            get(handlers::list_customer_bookings),
        )
        .route(
            "/bookings/staff/{staff_id}",
            get(handlers::list_staff_bookings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
