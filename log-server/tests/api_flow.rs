//! HTTP-level tests driving the full router: login → write → verify.

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use log_server::{Config, ServerState, api};

// TempDir first so the database handle drops before its directory goes away
async fn test_app() -> (tempfile::TempDir, Router, ServerState) {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).await;
    let app = api::build_app(&state).with_state(state.clone());
    (tmp, app, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn login(app: &Router, user_id: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            serde_json::json!({"user_id": user_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    json["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_rejects_empty_user() {
    let (_tmp, app, _state) = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            serde_json::json!({"user_id": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_write_requires_bearer_token() {
    let (_tmp, app, _state) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/logs",
            serde_json::json!({"query": "SELECT 1", "status": "SUCCESS"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // garbage token is also rejected
    let mut req = json_request(
        "PUT",
        "/api/v1/logs",
        serde_json::json!({"query": "SELECT 1", "status": "SUCCESS"}),
    );
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        "Bearer not-a-real-token".parse().unwrap(),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_write_verify_tamper_scenario() {
    let (_tmp, app, state) = test_app().await;

    // login
    let token = login(&app, "test_user").await;

    // write an entry
    let mut req = json_request(
        "PUT",
        "/api/v1/logs",
        serde_json::json!({"query": "SELECT 1", "status": "SUCCESS"}),
    );
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;

    assert_eq!(entry["user_id"], "test_user");
    assert_eq!(entry["query"], "SELECT 1");
    assert_eq!(entry["status"], "SUCCESS");
    let id = entry["id"].as_i64().unwrap();
    let hash = entry["hash"].as_str().unwrap();
    assert_eq!(hash.len(), 64);

    // verify — valid
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/verify/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["log_id"], id);
    assert_eq!(json["verification"]["valid"], true);
    assert!(json["verification"]["verification_token"].is_string());

    // tamper with the stored status out-of-band
    state
        .db
        .query("UPDATE log_entry SET status = 'ERROR' WHERE entry_id = $id")
        .bind(("id", id))
        .await
        .unwrap()
        .check()
        .unwrap();

    // verify — tampered entry reported as data, not as an error
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/verify/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["verification"]["valid"], false);
    assert!(json["verification"]["error"].is_string());

    // unknown id is a 404 — distinguishable from a failed verification
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/verify/999999999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (_tmp, app, _state) = test_app().await;

    let token = login(&app, "test_user").await;

    let mut req = Request::builder()
        .method("POST")
        .uri("/api/v1/logout")
        .body(Body::empty())
        .unwrap();
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // revoked token no longer writes
    let mut req = json_request(
        "PUT",
        "/api/v1/logs",
        serde_json::json!({"query": "SELECT 1", "status": "SUCCESS"}),
    );
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_endpoint_filters_by_user() {
    let (_tmp, app, state) = test_app().await;

    for i in 0..3 {
        state
            .logs
            .append("a", &format!("SELECT {i}"), "SUCCESS")
            .await
            .unwrap();
    }
    state.logs.append("b", "SELECT x", "ERROR").await.unwrap();

    let token = login(&app, "auditor").await;
    let mut req = Request::builder()
        .uri("/api/v1/logs?user_id=a&limit=2")
        .body(Body::empty())
        .unwrap();
    req.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    let logs = json["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l["user_id"] == "a"));
}

#[tokio::test]
async fn test_health_reports_status() {
    let (_tmp, app, _state) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_connections"], 0);
}
