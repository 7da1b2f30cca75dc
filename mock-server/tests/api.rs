use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use serde_json::Value;
use tower::ServiceExt;

const ID: &str = "00000000-0000-0000-0000-000000000001";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- status / create ---

#[tokio::test]
async fn status_returns_ok_message() {
    let resp = app().oneshot(get("/status")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "ok");
}

#[tokio::test]
async fn create_returns_201_with_payload() {
    let resp = app()
        .oneshot(json_request("POST", "/create", r#"{"data":"test"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "created");
    assert_eq!(body["received"]["data"], "test");
}

#[tokio::test]
async fn create_malformed_json_is_rejected() {
    let resp = app()
        .oneshot(json_request("POST", "/create", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_headers_and_query() {
    let req = Request::builder()
        .uri("/echo?page=2&sort=asc")
        .header("api-key", "fake-key")
        .header(http::header::ACCEPT, "application/json")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.api_key.as_deref(), Some("fake-key"));
    assert_eq!(echo.accept.as_deref(), Some("application/json"));
    assert_eq!(echo.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(echo.query.get("sort").map(String::as_str), Some("asc"));
}

#[tokio::test]
async fn echo_post_returns_raw_body() {
    let resp = app()
        .oneshot(json_request("POST", "/echo", r#"{"a": 1}"#))
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, r#"{"a": 1}"#);
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
}

// --- flaky / error / hits ---

#[tokio::test]
async fn flaky_fails_then_recovers() {
    use tower::Service;

    let mut app = app().into_service();
    let uri = format!("/flaky/{ID}/2");

    for attempt in 1..=2 {
        let resp = ServiceExt::ready(&mut app).await.unwrap().call(get(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = body_json(resp).await;
        assert_eq!(body["attempt"], attempt);
    }

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["attempts"], 3);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/hits/{ID}")))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["hits"], 3);
}

#[tokio::test]
async fn error_returns_requested_status() {
    let resp = app().oneshot(get(&format!("/error/{ID}/404"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], 404);
}

#[tokio::test]
async fn hits_unknown_id_is_zero() {
    let resp = app().oneshot(get(&format!("/hits/{ID}"))).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["hits"], 0);
}

#[tokio::test]
async fn flaky_bad_uuid_returns_400() {
    let resp = app().oneshot(get("/flaky/not-a-uuid/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- odd bodies ---

#[tokio::test]
async fn text_is_not_json() {
    let resp = app().oneshot(get("/text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"plain text");
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn collide_carries_a_status_key() {
    let resp = app().oneshot(get("/collide")).await.unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["status"], "from-server");
}

#[tokio::test]
async fn slow_waits_before_answering() {
    let started = std::time::Instant::now();
    let resp = app().oneshot(get("/slow/50")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(started.elapsed() >= std::time::Duration::from_millis(50));
}

#[tokio::test]
async fn bytes_returns_invalid_utf8_with_requested_status() {
    let resp = app().oneshot(get(&format!("/bytes/{ID}/201"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_bytes(resp).await;
    assert!(std::str::from_utf8(&body).is_err());
}
