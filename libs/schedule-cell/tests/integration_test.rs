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

use schedule_cell::router::{doctor_schedule_routes, schedule_admin_routes};
use shared_utils::test_utils::{JwtTestUtils, MockRows, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn admin_app(mock_server: &MockServer) -> Router {
    schedule_admin_routes(TestConfig::with_supabase_url(mock_server.uri()).to_arc())
}

fn create_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/schedules")
        .header("Authorization", JwtTestUtils::admin_bearer())
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_staff_and_room(mock_server: &MockServer, room_id: &str, room_status: &str) {
    mount_staff_with_status(mock_server, room_id, room_status, "active").await;
}

async fn mount_staff_with_status(mock_server: &MockServer, room_id: &str, room_status: &str, user_status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": Uuid::new_v4(), "user": {"status": user_status}}
        ])))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::room(room_id, "101", room_status)
        ])))
        .mount(mock_server)
        .await;
}

fn plan(staff_id: &str, room_id: &str) -> Value {
    json!({
        "staff_id": staff_id,
        "staff_type": "doctor",
        "room_id": room_id,
        "start_date": "2024-01-01",
        "end_date": "2024-01-14",
        "weekdays": [1, 3, 5],
        "shift": "morning"
    })
}

#[tokio::test]
async fn test_weekly_pattern_is_bulk_inserted() {
    let mock_server = MockServer::start().await;
    let staff_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    mount_staff_and_room(&mock_server, &room_id, "available").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("work_date", "gte.2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let dates = ["2024-01-01", "2024-01-03", "2024-01-05", "2024-01-08", "2024-01-10", "2024-01-12"];
    let created: Vec<Value> = dates
        .iter()
        .map(|d| MockRows::schedule(&Uuid::new_v4().to_string(), &staff_id, &room_id, d, "07:00:00", "11:30:00"))
        .collect();
    Mock::given(method("POST"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(created)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(create_request(plan(&staff_id, &room_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["total"], 6);

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let rows: Vec<Value> = serde_json::from_slice(&insert.body).unwrap();
    let inserted_dates: Vec<&str> = rows.iter().map(|r| r["work_date"].as_str().unwrap()).collect();
    assert_eq!(inserted_dates, dates);
    assert!(rows.iter().all(|r| r["start_time"] == "07:00:00" && r["end_time"] == "11:30:00"));
    assert!(rows.iter().all(|r| r["status"] == "scheduled" && r["staff_type"] == "doctor"));
}

#[tokio::test]
async fn test_room_conflict_rejects_whole_request() {
    let mock_server = MockServer::start().await;
    let staff_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    mount_staff_and_room(&mock_server, &room_id, "available").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::schedule(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &room_id,
                "2024-01-03",
                "09:00:00",
                "10:00:00",
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(create_request(plan(&staff_id, &room_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "Schedule conflicts with existing bookings: 2024-01-03 09:00-10:00 (room already booked)"
    );
}

#[tokio::test]
async fn test_room_under_maintenance_cannot_be_scheduled() {
    let mock_server = MockServer::start().await;
    let room_id = Uuid::new_v4().to_string();

    mount_staff_and_room(&mock_server, &room_id, "maintenance").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(create_request(plan(&Uuid::new_v4().to_string(), &room_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Room 101 is under maintenance");
}

#[tokio::test]
async fn test_empty_weekdays_for_range_is_rejected() {
    let mock_server = MockServer::start().await;
    let mut body = plan(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string());
    body["weekdays"] = json!([]);

    let response = admin_app(&mock_server).oneshot(create_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_doctor_sees_own_schedules() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("dr.lan@hospital.vn");
    let doctor_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": doctor_id}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("staff_id", format!("eq.{}", doctor_id)))
        .and(query_param("staff_type", "eq.doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::schedule(&Uuid::new_v4().to_string(), &doctor_id, &room_id, "2024-01-01", "07:00:00", "11:30:00"),
            MockRows::schedule(&Uuid::new_v4().to_string(), &doctor_id, &room_id, "2024-01-02", "13:00:00", "16:30:00"),
        ])))
        .mount(&mock_server)
        .await;

    let app = doctor_schedule_routes(TestConfig::with_supabase_url(mock_server.uri()).to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/schedules")
                .header("Authorization", JwtTestUtils::bearer_for(&doctor))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 2);
}

#[tokio::test]
async fn test_doctor_without_profile_gets_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let doctor = TestUser::doctor("new.doctor@hospital.vn");
    let app = doctor_schedule_routes(TestConfig::with_supabase_url(mock_server.uri()).to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/schedules")
                .header("Authorization", JwtTestUtils::bearer_for(&doctor))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_labtech_cannot_use_doctor_area() {
    let mock_server = MockServer::start().await;
    let labtech = TestUser::labtech("tech@hospital.vn");

    let app = doctor_schedule_routes(TestConfig::with_supabase_url(mock_server.uri()).to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/schedules")
                .header("Authorization", JwtTestUtils::bearer_for(&labtech))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_inactive_staff_cannot_be_scheduled() {
    let mock_server = MockServer::start().await;
    let room_id = Uuid::new_v4().to_string();

    mount_staff_with_status(&mock_server, &room_id, "available", "inactive").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(create_request(plan(&Uuid::new_v4().to_string(), &room_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Doctor is inactive and cannot be scheduled");
}

fn update_request(schedule_id: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/schedules/{}", schedule_id))
        .header("Authorization", JwtTestUtils::admin_bearer())
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_existing_schedule(mock_server: &MockServer, row: &Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("id", format!("eq.{}", row["id"].as_str().unwrap())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_update_shift_overrides_times_and_ignores_own_row() {
    let mock_server = MockServer::start().await;
    let schedule_id = Uuid::new_v4().to_string();
    let staff_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    let existing = MockRows::schedule(&schedule_id, &staff_id, &room_id, "2024-01-03", "07:00:00", "11:30:00");
    mount_existing_schedule(&mock_server, &existing).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::schedule(&schedule_id, &staff_id, &room_id, "2024-01-03", "07:00:00", "15:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::schedule(&schedule_id, &staff_id, &room_id, "2024-01-03", "13:00:00", "16:30:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(update_request(&schedule_id, json!({
            "shift": "afternoon",
            "start_time": "08:00:00",
            "end_time": "09:00:00"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
    let body: Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(body["start_time"], "13:00:00");
    assert_eq!(body["end_time"], "16:30:00");
}

#[tokio::test]
async fn test_reactivating_cancelled_schedule_rechecks_conflicts() {
    let mock_server = MockServer::start().await;
    let schedule_id = Uuid::new_v4().to_string();
    let staff_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    let mut existing = MockRows::schedule(&schedule_id, &staff_id, &room_id, "2024-01-03", "07:00:00", "11:30:00");
    existing["status"] = json!("cancelled");
    mount_existing_schedule(&mock_server, &existing).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::schedule(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &room_id,
                "2024-01-03",
                "10:00:00",
                "11:00:00",
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(update_request(&schedule_id, json!({ "status": "scheduled" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "Schedule conflicts with existing bookings: 2024-01-03 10:00-11:00 (room already booked)"
    );
}

#[tokio::test]
async fn test_notes_only_update_skips_conflict_lookup() {
    let mock_server = MockServer::start().await;
    let schedule_id = Uuid::new_v4().to_string();
    let staff_id = Uuid::new_v4().to_string();
    let room_id = Uuid::new_v4().to_string();

    let existing = MockRows::schedule(&schedule_id, &staff_id, &room_id, "2024-01-03", "07:00:00", "11:30:00");
    mount_existing_schedule(&mock_server, &existing).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([existing])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = admin_app(&mock_server)
        .oneshot(update_request(&schedule_id, json!({ "notes": "Covering for Dr. Minh" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
