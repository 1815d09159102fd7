use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};
use testing_cell::router::testing_routes;

async fn create_test_app(config: &TestConfig) -> Router {
    testing_routes(config.to_arc())
}

fn payment_row(booking_id: Uuid) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "booking_id": booking_id,
        "transaction_id": "17515234",
        "amount": 49.0,
        "method": "cash",
        "status": "paid",
        "description": null,
        "created_at": "2025-06-01T08:00:00Z"
    })
}

fn register_body(service_id: Uuid, customer_id: Uuid, start: chrono::DateTime<Utc>) -> String {
    json!({
        "testing_service_id": service_id,
        "customer_id": customer_id,
        "expected_start_time": start,
        "payment": {
            "method": "cash",
            "amount": 49.0,
            "transaction_id": null,
            "description": "Lab fee",
            "created_at": Utc::now(),
        }
    })
    .to_string()
}

#[tokio::test]
async fn duplicate_slot_booking_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let service_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");
    let customer_id: Uuid = customer.id.parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("testing_service_id", format!("eq.{}", service_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    service_id,
                    customer_id,
                    Utc::now() + Duration::days(2),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn male_customer_cannot_book_female_only_service() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let service_id = Uuid::new_v4();
    let customer = TestUser::customer("mark");
    let customer_id: Uuid = customer.id.parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "gender": "male" }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::testing_service_row(
                &service_id.to_string(),
                "female",
                "ANY_POSITIVE"
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    service_id,
                    customer_id,
                    Utc::now() + Duration::days(2),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The gender gate fired before any row was written.
    let received = mock_server.received_requests().await.unwrap();
    assert!(received
        .iter()
        .all(|r| r.method != wiremock::http::Method::POST));
}

#[tokio::test]
async fn booking_goes_to_least_loaded_staff() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let service_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");
    let customer_id: Uuid = customer.id.parse().unwrap();
    let busy_staff = Uuid::new_v4();
    let idle_staff = Uuid::new_v4();
    let booking_id = Uuid::new_v4();

    // Slot probe: free. Assignment count query: one booking for busy_staff.
    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("select", "staff_id"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "staff_id": busy_staff }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "gender": "female" }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.staff"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": busy_staff },
            { "id": idle_staff },
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::testing_service_row(
                &service_id.to_string(),
                "any",
                "ANY_POSITIVE"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/testing_service_bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::booking_row(
                &booking_id.to_string(),
                &service_id.to_string(),
                &customer.id,
                &idle_staff.to_string(),
                "confirmed",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/testing_service_payments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([payment_row(booking_id)])))
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    service_id,
                    customer_id,
                    Utc::now() + Duration::days(2),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The insert carried the idle staff member.
    let received = mock_server.received_requests().await.unwrap();
    let insert = received
        .iter()
        .find(|r| {
            r.method == wiremock::http::Method::POST
                && r.url.path() == "/rest/v1/testing_service_bookings"
        })
        .expect("booking insert request");
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(body["staff_id"], json!(idle_staff));
}

#[tokio::test]
async fn booking_fails_when_no_staff_available() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let service_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");
    let customer_id: Uuid = customer.id.parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "gender": "female" }])))
        .mount(&mock_server)
        .await;

    // No ACTIVE staff at all.
    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.staff"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::testing_service_row(
                &service_id.to_string(),
                "any",
                "ANY_POSITIVE"
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bookings")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    service_id,
                    customer_id,
                    Utc::now() + Duration::days(2),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn completion_with_short_session_leaves_booking_untouched() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let booking_id = Uuid::new_v4();
    let staff = TestUser::staff("tech");

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_row(
                &booking_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &staff.id,
                "confirmed",
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = staff.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/bookings/{}/complete", booking_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        // Mock row expects 08:00; a 15-minute session is too short.
                        "real_start_time": "2025-06-11T08:00:00Z",
                        "real_end_time": "2025-06-11T08:15:00Z",
                        "results": [
                            { "title": "HIV Ag/Ab", "result": "NEGATIVE",
                              "measure_unit": null, "min_value": null, "max_value": null }
                        ],
                        "overall_result": "NEGATIVE",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No partial write happened.
    let received = mock_server.received_requests().await.unwrap();
    assert!(received
        .iter()
        .all(|r| r.method != wiremock::http::Method::PATCH));
}

#[tokio::test]
async fn completing_a_cancelled_booking_fails() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let booking_id = Uuid::new_v4();
    let staff = TestUser::staff("tech");

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_row(
                &booking_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &staff.id,
                "cancelled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = staff.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/bookings/{}/complete", booking_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "real_start_time": "2025-06-11T08:00:00Z",
                        "real_end_time": "2025-06-11T08:40:00Z",
                        "results": [
                            { "title": "HIV Ag/Ab", "result": "NEGATIVE",
                              "measure_unit": null, "min_value": null, "max_value": null }
                        ],
                        "overall_result": "NEGATIVE",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_numeric_result_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let booking_id = Uuid::new_v4();
    let staff = TestUser::staff("tech");

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_row(
                &booking_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &staff.id,
                "in_progress",
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = staff.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/bookings/{}/complete", booking_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "real_start_time": "2025-06-11T08:00:00Z",
                        "real_end_time": "2025-06-11T08:40:00Z",
                        "results": [
                            { "title": "Glucose", "result": "9.8",
                              "measure_unit": "millimol_per_liter",
                              "min_value": 3.9, "max_value": 6.4 }
                        ],
                        "overall_result": "INDETERMINATE",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let received = mock_server.received_requests().await.unwrap();
    assert!(received
        .iter()
        .all(|r| r.method != wiremock::http::Method::PATCH));
}

#[tokio::test]
async fn overall_result_uses_service_flag_logic() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let booking_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_service_bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_row(
                &booking_id.to_string(),
                &service_id.to_string(),
                &customer.id,
                &Uuid::new_v4().to_string(),
                "completed",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/testing_services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::testing_service_row(
                &service_id.to_string(),
                "any",
                "ALL_POSITIVE"
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/bookings/{}/overall-result", booking_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "results": ["POSITIVE", "NEGATIVE"] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["overall_result"], json!("NEGATIVE"));
}
