use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use medical_service_cell::router::{service_admin_routes, service_public_routes};
use shared_utils::test_utils::{JwtTestUtils, MockRows, TestConfig};

/// The eight-byte PNG signature, base64 encoded.
const PNG_BASE64: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn admin_app(mock_server: &MockServer, assets: &std::path::Path) -> Router {
    let config = TestConfig::with_supabase_url(mock_server.uri()).with_assets_dir(assets);
    service_admin_routes(config.to_arc())
}

fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", JwtTestUtils::admin_bearer());
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_public_list_pushes_type_filter_and_searches_name() {
    let mock_server = MockServer::start().await;
    let specialty_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("service_type", "eq.examination"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::service(&Uuid::new_v4().to_string(), "Cardiac Checkup", &specialty_id),
            MockRows::service(&Uuid::new_v4().to_string(), "General Checkup", &specialty_id),
            MockRows::service(&Uuid::new_v4().to_string(), "Skin Exam", &specialty_id),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = service_public_routes(TestConfig::with_supabase_url(mock_server.uri()).to_arc());
    let request = Request::builder()
        .uri("/services?service_type=examination&name=checkup")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 10);
}

#[tokio::test]
async fn test_create_service_stores_image() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();
    let service_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockRows::service(&service_id, "Blood Panel", &Uuid::new_v4().to_string())
        ])))
        .mount(&mock_server)
        .await;

    let request = admin_request("POST", "/services", Some(json!({
        "name": "Blood Panel",
        "price": 120000.0,
        "service_type": "test",
        "image": PNG_BASE64
    })));

    let response = admin_app(&mock_server, assets.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let inserted: Value = serde_json::from_slice(&insert.body).unwrap();
    let image_path = inserted["image_path"].as_str().unwrap();
    assert!(image_path.starts_with("/images/services/"));
    assert!(image_path.ends_with(".png"));

    let stored = assets.path().join(image_path.trim_start_matches('/'));
    assert!(stored.exists());
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();

    let request = admin_request("POST", "/services", Some(json!({
        "name": "Free Money",
        "price": -5.0,
        "service_type": "consultation"
    })));

    let response = admin_app(&mock_server, assets.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_image_removes_previous_file() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();
    let service_id = Uuid::new_v4().to_string();
    let specialty_id = Uuid::new_v4().to_string();

    let old_dir = assets.path().join("images/services");
    std::fs::create_dir_all(&old_dir).unwrap();
    std::fs::write(old_dir.join("old.png"), b"old").unwrap();

    let mut existing = MockRows::service(&service_id, "X-Ray", &specialty_id);
    existing["image_path"] = json!("/images/services/old.png");

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([existing])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::service(&service_id, "X-Ray", &specialty_id)
        ])))
        .mount(&mock_server)
        .await;

    let request = admin_request(
        "PUT",
        &format!("/services/{}", service_id),
        Some(json!({ "image": PNG_BASE64 })),
    );

    let response = admin_app(&mock_server, assets.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!old_dir.join("old.png").exists());
    assert_eq!(std::fs::read_dir(&old_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_delete_service_with_appointments_is_rejected() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();
    let service_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("service_id", format!("eq.{}", service_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": Uuid::new_v4()}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/test_results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server, assets.path())
        .oneshot(admin_request("DELETE", &format!("/services/{}", service_id), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "Cannot delete service: it is still referenced by appointments"
    );
}

fn large_png_data_uri(decoded_len: usize) -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    let mut bytes = vec![0u8; decoded_len];
    bytes[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[tokio::test]
async fn test_create_service_accepts_image_near_size_limit() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockRows::service(&Uuid::new_v4().to_string(), "MRI Scan", &Uuid::new_v4().to_string())
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = admin_request("POST", "/services", Some(json!({
        "name": "MRI Scan",
        "price": 2500000.0,
        "service_type": "test",
        "image": large_png_data_uri(4 * 1024 * 1024)
    })));

    let response = admin_app(&mock_server, assets.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = std::fs::read_dir(assets.path().join("images/services")).unwrap().count();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn test_failed_update_removes_new_image() {
    let mock_server = MockServer::start().await;
    let assets = tempfile::tempdir().unwrap();
    let service_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::service(&service_id, "X-Ray", &Uuid::new_v4().to_string())
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockRows::error_response("duplicate key value violates unique constraint", "23505")
        ))
        .mount(&mock_server)
        .await;

    let request = admin_request(
        "PUT",
        &format!("/services/{}", service_id),
        Some(json!({ "image": PNG_BASE64 })),
    );

    let response = admin_app(&mock_server, assets.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let dir = assets.path().join("images/services");
    let remaining = std::fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(remaining, 0);
}
