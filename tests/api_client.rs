use std::collections::HashMap;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chatline::sync::AsyncStatus;
use chatline::utils::parse_base_url;
use chatline::{ApiClient, ApiError, ChatSync, CreateMessageRequest, MessageFilter, MessageTransport};
use serde_json::{Value, json};
use url::Url;

const TOKEN: &str = "secret-token";

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    parse_base_url(&format!("http://{addr}/api")).unwrap()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn client(base: Url) -> ApiClient {
    ApiClient::new(base, TOKEN).unwrap()
}

async fn list(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad token" }))).into_response();
    }
    let mut keys: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    keys.sort();
    Json(json!([
        { "id": "2", "author": "B", "message": keys.join("&"), "createdAt": "2024-01-01T00:00:02Z" },
        { "id": "1", "author": "A", "message": "hi", "createdAt": "2024-01-01T00:00:01Z" },
    ]))
    .into_response()
}

async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["message"].as_str().is_some_and(|m| m.len() > 10) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!([{ "field": "message", "message": "too long" }])),
        )
            .into_response();
    }
    Json(json!({
        "id": "3",
        "author": body["author"],
        "message": body["message"],
        "createdAt": "2024-01-01T00:00:03Z",
    }))
    .into_response()
}

fn chat_router() -> Router {
    Router::new().route("/api/messages", get(list).post(create))
}

#[tokio::test]
async fn fetch_sends_bearer_and_only_present_params() {
    let api = client(serve(chat_router()).await);
    let filter = MessageFilter { limit: Some(20), after: Some("2024-01-01T00:00:00Z".into()), before: None };
    let messages = api.fetch_messages(&filter).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message, "after=2024-01-01T00:00:00Z&limit=20");
    assert_eq!(messages[1].created_at, "2024-01-01T00:00:01Z");
}

#[tokio::test]
async fn wrong_token_maps_json_message() {
    let base = serve(chat_router()).await;
    let api = ApiClient::new(base, "nope").unwrap();
    let err = api.fetch_messages(&MessageFilter::default()).await.unwrap_err();
    assert_eq!(err.status(), 401);
    assert_eq!(err.message(), "bad token");
    assert_eq!(err.endpoint(), "/api/messages");
}

#[tokio::test]
async fn create_returns_server_copy() {
    let api = client(serve(chat_router()).await);
    let created = api.create_message(&CreateMessageRequest::new("You", "hello")).await.unwrap();
    assert_eq!(created.id, "3");
    assert_eq!(created.author, "You");
    assert_eq!(created.message, "hello");
}

#[tokio::test]
async fn create_validation_errors_are_per_field() {
    let api = client(serve(chat_router()).await);
    let err = api
        .create_message(&CreateMessageRequest::new("You", "far too long a message"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));
    assert_eq!(err.status(), 400);
    assert_eq!(err.field_error("message"), Some("too long"));
}

#[tokio::test]
async fn text_error_body_becomes_message() {
    let router = Router::new().route(
        "/api/messages",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance window") }),
    );
    let api = client(serve(router).await);
    let err = api.fetch_messages(&MessageFilter::default()).await.unwrap_err();
    assert_eq!(err, ApiError::Http {
        endpoint: "/api/messages".into(),
        status: 503,
        message: "maintenance window".into(),
    });
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status_text() {
    let router = Router::new().route("/api/messages", get(|| async { StatusCode::NOT_FOUND }));
    let api = client(serve(router).await);
    let err = api.fetch_messages(&MessageFilter::default()).await.unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.message(), "Not Found");
}

#[tokio::test]
async fn no_content_is_empty_for_fetch_but_an_error_for_create() {
    let router = Router::new().route(
        "/api/messages",
        get(|| async { StatusCode::NO_CONTENT }).post(|| async { StatusCode::NO_CONTENT }),
    );
    let api = client(serve(router).await);
    assert!(api.fetch_messages(&MessageFilter::default()).await.unwrap().is_empty());

    let err = api.create_message(&CreateMessageRequest::new("You", "hi")).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.status(), 0);
}

#[tokio::test]
async fn empty_ok_body_is_an_empty_batch() {
    let router = Router::new().route(
        "/api/messages",
        get(|| async { (StatusCode::OK, "") }).post(|| async { (StatusCode::OK, "  ") }),
    );
    let api = client(serve(router).await);
    assert!(api.fetch_messages(&MessageFilter::default()).await.unwrap().is_empty());

    let err = api.create_message(&CreateMessageRequest::new("You", "hi")).await.unwrap_err();
    assert_eq!(err.status(), 0);
}

#[tokio::test]
async fn malformed_success_body_is_status_zero() {
    let router = Router::new().route("/api/messages", get(|| async { Json(json!({ "oops": true })) }));
    let api = client(serve(router).await);
    let err = api.fetch_messages(&MessageFilter::default()).await.unwrap_err();
    assert_eq!(err.status(), 0);
    assert_eq!(err.endpoint(), "/api/messages");
}

#[tokio::test]
async fn unreachable_server_is_status_zero() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(parse_base_url(&format!("http://{addr}")).unwrap());
    let err = api.fetch_messages(&MessageFilter::default()).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.status(), 0);
    assert_eq!(err.endpoint(), "/messages");
}

#[tokio::test]
async fn sync_core_over_http() {
    let sync = ChatSync::new(client(serve(chat_router()).await));
    sync.initial_load().await;
    let snap = sync.snapshot();
    assert_eq!(snap.load_status(), AsyncStatus::Success);
    assert_eq!(snap.messages.iter().map(|m| m.id()).collect::<Vec<_>>(), ["1", "2"]);
    assert_eq!(snap.messages[1].message(), "limit=50");

    assert!(sync.send_message(&CreateMessageRequest::new("You", "hello")).await);
    assert!(!sync.send_message(&CreateMessageRequest::new("You", "much too long")).await);

    let snap = sync.snapshot();
    assert_eq!(snap.messages.iter().map(|m| m.id()).collect::<Vec<_>>(), ["1", "2", "3"]);
    assert_eq!(snap.send_status(), AsyncStatus::Error);
    assert_eq!(snap.send_error().and_then(|e| e.field_error("message")), Some("too long"));
}
