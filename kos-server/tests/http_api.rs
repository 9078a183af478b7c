mod common;

use axum::Router;
use axum::body::Body;
use common::TestApp;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use kos_server::api;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = TestApp::new().await;
    let router = api::build_app(app.state.clone());

    let response = router.clone().oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (status, body) = send(&router, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_register_and_login_over_http() {
    let app = TestApp::new().await;
    let router = api::build_app(app.state.clone());

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": "lina", "password": "rahasia123", "email": "lina@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "lina");
    assert_eq!(body["data"]["role"], "tenant");

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": "lina", "password": "rahasia123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1005);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/auth/login", None, json!({ "username": "lina", "password": "salah" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "lina", "password": "rahasia123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&router, get("/api/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["email"], "lina@example.com");
    assert_eq!(body["data"]["profile"]["level"], "Guest");
}

#[tokio::test]
async fn test_forgot_password_never_reveals_accounts() {
    let app = TestApp::new().await;
    let router = api::build_app(app.state.clone());

    let (status, body) = send(
        &router,
        json_request("POST", "/api/auth/forgot-password", None, json!({ "email": "siapa@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
}

#[tokio::test]
async fn test_auth_and_admin_guards() {
    let app = TestApp::new().await;
    let tenant = app.tenant("budi").await;
    let admin = app.admin().await;
    let router = api::build_app(app.state.clone());
    let tenant_token = app.access_token(&tenant);
    let admin_token = app.access_token(&admin);

    let (status, body) = send(&router, get("/api/bookings", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = send(&router, get("/api/bookings", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, get("/api/admin/dashboard", Some(&tenant_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&router, get("/api/admin/dashboard", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_rooms"], 0);

    let (status, body) = send(&router, get("/api/admin/tenants", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].is_array());
}

#[tokio::test]
async fn test_room_crud_and_booking_over_http() {
    let app = TestApp::new().await;
    let tenant = app.tenant("budi").await;
    let admin = app.admin().await;
    let router = api::build_app(app.state.clone());
    let tenant_token = app.access_token(&tenant);
    let admin_token = app.access_token(&admin);

    let room = json!({
        "name": "A1",
        "room_type": "Deluxe",
        "price": 1750000.0,
        "capacity": 2,
        "facilities": ["AC", "WiFi", "Kamar mandi dalam"],
        "description": "Lantai dua, menghadap taman"
    });

    let (status, _) = send(&router, json_request("POST", "/api/kamar", Some(&tenant_token), room.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&router, json_request("POST", "/api/kamar", Some(&admin_token), room)).await;
    assert_eq!(status, StatusCode::OK);
    let room_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "Available");
    assert_eq!(body["data"]["facilities"][2], "Kamar mandi dalam");

    let (status, body) = send(&router, get("/api/kamar", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &router,
        json_request("PUT", &format!("/api/kamar/{room_id}/status"), Some(&admin_token), json!({ "status": "Occupied" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 6005);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/bookings",
            Some(&tenant_token),
            json!({ "room_id": room_id, "start_date": "2099-01-01", "duration_months": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let booking_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "Pending");

    let (status, body) = send(&router, get(&format!("/api/kamar/{room_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Reserved");

    let (status, body) = send(&router, get("/api/bookings", Some(&tenant_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], booking_id);
    assert_eq!(body["data"][0]["room"]["name"], "A1");

    let (status, body) = send(
        &router,
        json_request("DELETE", &format!("/api/kamar/{room_id}"), Some(&admin_token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6004);

    let (status, body) = send(
        &router,
        json_request("POST", &format!("/api/bookings/{booking_id}/cancel"), Some(&tenant_token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Cancelled");

    let (_, body) = send(&router, get(&format!("/api/kamar/{room_id}"), None)).await;
    assert_eq!(body["data"]["status"], "Available");
}

#[tokio::test]
async fn test_midtrans_notification_without_gateway() {
    let app = TestApp::new().await;
    let router = api::build_app(app.state.clone());

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/payments/notification",
            None,
            json!({
                "order_id": "KOS-1-1700000000000",
                "status_code": "200",
                "gross_amount": "1500000.00",
                "signature_key": "deadbeef",
                "transaction_status": "settlement"
            }),
        ),
    )
    .await;
    // no server key configured
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
