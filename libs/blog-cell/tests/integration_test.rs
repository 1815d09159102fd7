use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use blog_cell::router::blog_routes;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: &TestConfig) -> Router {
    blog_routes(config.to_arc())
}

fn comment_row(id: Uuid, blog_id: Uuid, parent: Option<Uuid>) -> serde_json::Value {
    json!({
        "id": id,
        "blog_id": blog_id,
        "customer_id": Uuid::new_v4(),
        "parent_comment_id": parent,
        "content": "Thanks, very helpful",
        "status": "active",
        "created_at": "2025-05-21T10:00:00Z"
    })
}

#[tokio::test]
async fn customer_listing_filters_to_active_blogs() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let blog_id = Uuid::new_v4().to_string();
    let manager_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("status", "eq.active"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-range", "0-0/1")
                .set_body_json(json!([MockSupabaseResponses::blog_row(
                    &blog_id,
                    &manager_id,
                    "active"
                )])),
        )
        .mount(&mock_server)
        .await;

    let customer = TestUser::customer("reader");
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/?page=0")
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
    assert_eq!(body["items"][0]["id"], json!(blog_id));
    assert_eq!(body["total_pages"], json!(1));
}

#[tokio::test]
async fn create_blog_requires_manager_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let customer = TestUser::customer("mallory");
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "manager_id": Uuid::new_v4(),
                        "title": "Not allowed",
                        "content": "Should be rejected",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_blog_rejects_empty_title() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let manager = TestUser::manager("editor");
    let token = manager.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "manager_id": Uuid::new_v4(),
                        "title": "   ",
                        "content": "Body",
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
async fn top_comments_are_paged() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let blog_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/comments"))
        .and(query_param("blog_id", format!("eq.{}", blog_id)))
        .and(query_param("parent_comment_id", "is.null"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-range", "0-1/2")
                .set_body_json(json!([
                    comment_row(Uuid::new_v4(), blog_id, None),
                    comment_row(Uuid::new_v4(), blog_id, None),
                ])),
        )
        .mount(&mock_server)
        .await;

    let customer = TestUser::customer("reader");
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/{}/comments?page=0", blog_id))
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
    assert_eq!(body["total_items"], json!(2));
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn commenting_on_inactive_blog_fails() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let blog_id = Uuid::new_v4();
    let manager_id = Uuid::new_v4().to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/blogs"))
        .and(query_param("id", format!("eq.{}", blog_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::blog_row(&blog_id.to_string(), &manager_id, "inactive")
        ])))
        .mount(&mock_server)
        .await;

    let customer = TestUser::customer("reader");
    let token = customer.bearer_token(&config.jwt_secret);

    let app = create_test_app(&config).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/comments", blog_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "customer_id": customer.id,
                        "parent_comment_id": null,
                        "content": "First!",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
