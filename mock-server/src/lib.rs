use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: String,
}

/// Per-id hit counters shared by the flaky and error routes.
pub type Hits = Arc<RwLock<HashMap<Uuid, u32>>>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/status", get(status))
        .route("/create", post(create))
        .route("/echo", get(echo_get).post(echo_post))
        .route("/flaky/{id}/{failures}", get(flaky).post(flaky))
        .route("/error/{id}/{code}", get(error))
        .route("/bytes/{id}/{code}", get(bytes).post(bytes))
        .route("/hits/{id}", get(hit_count))
        .route("/slow/{ms}", get(slow))
        .route("/text", get(text))
        .route("/array", get(array))
        .route("/collide", get(collide))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}

async fn create(Json(input): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "message": "created", "received": input })),
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn echo(method: &str, headers: &HeaderMap, query: BTreeMap<String, String>, body: String) -> Echo {
    Echo {
        method: method.to_string(),
        query,
        api_key: header_value(headers, "api-key"),
        content_type: header_value(headers, "content-type"),
        accept: header_value(headers, "accept"),
        body,
    }
}

async fn echo_get(headers: HeaderMap, Query(query): Query<BTreeMap<String, String>>) -> Json<Echo> {
    Json(echo("GET", &headers, query, String::new()))
}

async fn echo_post(
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: String,
) -> Json<Echo> {
    Json(echo("POST", &headers, query, body))
}

async fn record_hit(hits: &Hits, id: Uuid) -> u32 {
    let mut hits = hits.write().await;
    let count = hits.entry(id).or_insert(0);
    *count += 1;
    *count
}

async fn flaky(
    State(hits): State<Hits>,
    Path((id, failures)): Path<(Uuid, u32)>,
) -> (StatusCode, Json<Value>) {
    let attempt = record_hit(&hits, id).await;
    if attempt <= failures {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "unavailable", "attempt": attempt })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "ok", "attempts": attempt })))
}

async fn error(
    State(hits): State<Hits>,
    Path((id, code)): Path<(Uuid, u16)>,
) -> (StatusCode, Json<Value>) {
    record_hit(&hits, id).await;
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": status.as_u16() })))
}

/// JSON-looking body that is not valid UTF-8, counted like `/error`.
async fn bytes(
    State(hits): State<Hits>,
    Path((id, code)): Path<(Uuid, u16)>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], Vec<u8>) {
    record_hit(&hits, id).await;
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::OK);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        b"{\"msg\": \"\xff\xfe\"}".to_vec(),
    )
}

async fn hit_count(State(hits): State<Hits>, Path(id): Path<Uuid>) -> Json<Value> {
    let hits = hits.read().await;
    Json(json!({ "hits": hits.get(&id).copied().unwrap_or(0) }))
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "message": "slow", "delay_ms": ms }))
}

async fn text() -> &'static str {
    "plain text"
}

async fn array() -> Json<Value> {
    Json(json!([1, 2, 3]))
}

async fn collide() -> Json<Value> {
    Json(json!({ "status": "from-server", "message": "ok" }))
}
