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

use consultation_cell::router::consultation_routes;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: &TestConfig) -> Router {
    consultation_routes(config.to_arc())
}

fn consultation_type_row(id: Uuid, target_gender: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Reproductive health consult",
        "description": "One-hour advisory session",
        "target_gender": target_gender,
        "price": 35.0,
        "active": true
    })
}

fn register_body(
    consultant_id: Uuid,
    customer_id: Uuid,
    type_id: Uuid,
    start: chrono::DateTime<Utc>,
) -> String {
    json!({
        "consultant_id": consultant_id,
        "customer_id": customer_id,
        "consultation_type_id": type_id,
        "expected_start_time": start,
        "payment": {
            "method": "cash",
            "amount": 35.0,
            "transaction_id": null,
            "description": "Consultation fee",
            "created_at": Utc::now(),
        }
    })
    .to_string()
}

#[tokio::test]
async fn register_rejects_occupied_slot_with_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultant_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");
    let customer_id: Uuid = customer.id.parse().unwrap();
    let type_id = Uuid::new_v4();

    // Slot probe finds an existing non-cancelled consultation.
    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("consultant_id", format!("eq.{}", consultant_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);
    let start = Utc::now() + Duration::days(2);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    consultant_id,
                    customer_id,
                    type_id,
                    start,
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_same_day_start() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let customer = TestUser::customer("claire");
    let customer_id: Uuid = customer.id.parse().unwrap();
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    Uuid::new_v4(),
                    customer_id,
                    Uuid::new_v4(),
                    Utc::now() + Duration::minutes(30),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_gates_target_gender_before_any_write() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultant_id = Uuid::new_v4();
    let customer = TestUser::customer("mark");
    let customer_id: Uuid = customer.id.parse().unwrap();
    let type_id = Uuid::new_v4();

    // No existing booking at the slot.
    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // Female-only consultation type.
    Mock::given(method("GET"))
        .and(path("/rest/v1/consultation_types"))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(json!([consultation_type_row(type_id, "female")])))
        .mount(&mock_server)
        .await;

    // Male customer.
    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .and(query_param("role", "eq.customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "gender": "male" }])))
        .mount(&mock_server)
        .await;

    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(register_body(
                    consultant_id,
                    customer_id,
                    type_id,
                    Utc::now() + Duration::days(2),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The gender gate fired before any insert.
    let received = mock_server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.method != wiremock::http::Method::POST));
}

#[tokio::test]
async fn reschedule_requires_three_hours_notice() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultant = TestUser::consultant("dr-lin");
    let token = consultant.bearer_token(&config.jwt_secret);
    let consultation_id = Uuid::new_v4();

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}/reschedule", consultation_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "expected_start_time": Utc::now() + Duration::hours(2) }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completing_cancelled_consultation_fails() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultation_id = Uuid::new_v4();
    let consultant = TestUser::consultant("dr-lin");

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_row(
                &consultation_id.to_string(),
                &consultant.id,
                &Uuid::new_v4().to_string(),
                "cancelled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = consultant.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}/complete", consultation_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "real_start_time": "2025-06-11T08:05:00Z",
                        "real_end_time": "2025-06-11T08:45:00Z",
                        "summary": "n/a",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Terminal state: nothing was patched.
    let received = mock_server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.method != wiremock::http::Method::PATCH));
}

#[tokio::test]
async fn completion_shorter_than_twenty_minutes_fails() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultation_id = Uuid::new_v4();
    let consultant = TestUser::consultant("dr-lin");

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_row(
                &consultation_id.to_string(),
                &consultant.id,
                &Uuid::new_v4().to_string(),
                "confirmed",
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = consultant.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{}/complete", consultation_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        // Mock row expects 08:00-09:00; a 15-minute session is too short.
                        "real_start_time": "2025-06-11T08:05:00Z",
                        "real_end_time": "2025-06-11T08:20:00Z",
                        "summary": "cut short",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let received = mock_server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.method != wiremock::http::Method::PATCH));
}

#[tokio::test]
async fn cancelling_twice_raises_on_the_second_call() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let consultation_id = Uuid::new_v4();
    let customer = TestUser::customer("claire");

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::consultation_row(
                &consultation_id.to_string(),
                &Uuid::new_v4().to_string(),
                &customer.id,
                "cancelled",
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
                .uri(format!("/{}/cancel", consultation_id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
