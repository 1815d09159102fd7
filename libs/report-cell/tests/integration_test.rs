use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use report_cell::router::report_routes;
use shared_utils::test_utils::{TestConfig, TestUser};

async fn create_test_app(config: &TestConfig) -> Router {
    report_routes(config.to_arc())
}

#[tokio::test]
async fn statistics_require_back_office_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let customer = TestUser::customer("mallory");
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/consultations?period_days=30")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn consultation_statistics_bucket_completed_rows() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("status", "eq.completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "created_at": "2025-06-10T08:30:00Z", "payments": [{ "amount": 35.0 }] },
            { "created_at": "2025-06-10T13:00:00Z", "payments": [{ "amount": 35.0 }] },
            { "created_at": "2025-06-12T09:00:00Z", "payments": [{ "amount": 50.0 }] },
        ])))
        .mount(&mock_server)
        .await;

    let manager = TestUser::manager("boss");
    let token = manager.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/consultations?period_days=90")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let stats = body["statistics"].as_array().unwrap();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["date"], json!("2025-06-10"));
    assert_eq!(stats[0]["count"], json!(2));
    assert_eq!(stats[0]["revenue"], json!(70.0));
    assert_eq!(stats[1]["date"], json!("2025-06-12"));
    assert_eq!(stats[1]["count"], json!(1));
}

#[tokio::test]
async fn non_positive_period_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let manager = TestUser::manager("boss");
    let token = manager.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/testing-bookings?period_days=0")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn total_account_count_comes_from_content_range() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-range", "0-0/57")
                .set_body_json(json!([{ "id": uuid::Uuid::new_v4() }])),
        )
        .mount(&mock_server)
        .await;

    let admin = TestUser::admin("root");
    let token = admin.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/count")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total_accounts"], json!(57));
}
