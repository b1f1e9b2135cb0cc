//! Integration tests for the local view API, backed by an in-process fake of
//! the remote recommendation service.

use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use moodboard::clients::{
    HttpRecommender, SpotifyClient, TokenStore, local_storage::SessionToken,
};
use moodboard::view_api::{AppState, build_router};
use moodboard::{Moodboard, PlaylistFlow};
use rspotify::{Credentials, OAuth, scopes};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot` method
use url::Url;

fn song(name: &str) -> Value {
    json!({
        "name": name,
        "artist": "X",
        "image": format!("https://img/{name}"),
        "url": format!("https://open.spotify.com/track/{name}"),
        "uri": format!("spotify:track:{name}")
    })
}

/// Stand-in for the remote service: two recommendations, three similar songs,
/// and a playlist endpoint that only accepts the token `tok`.
async fn spawn_remote() -> Url {
    let remote = Router::new()
        .route(
            "/recommend",
            post(|Json(body): Json<Value>| async move {
                assert!(body.get("mood").is_some() || body.get("image").is_some());
                Json(json!({ "songs": [song("A"), song("B")], "claudeMood": "happy" }))
            }),
        )
        .route(
            "/similar",
            post(|Json(_): Json<Value>| async move {
                Json(json!({ "songs": [song("B"), song("C"), song("D")] }))
            }),
        )
        .route(
            "/create-playlist",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .is_some_and(|v| v == "Bearer tok");
                if authorized && body["uris"].as_array().is_some_and(|u| !u.is_empty()) {
                    (
                        StatusCode::OK,
                        Json(json!({ "url": "https://open.spotify.com/playlist/p" })),
                    )
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad token" })))
                }
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, remote).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Test helper: build the view API around a fresh board and an empty token store
async fn setup_app(dir: &tempfile::TempDir) -> (Router, TokenStore) {
    let recommender = HttpRecommender::new(spawn_remote().await, Duration::from_secs(5)).unwrap();
    let store = TokenStore::new(dir.path().join("session.json"));
    let spotify = SpotifyClient::new(
        Credentials::new_pkce("client-id"),
        OAuth {
            redirect_uri: "http://127.0.0.1:3000/callback".into(),
            scopes: scopes!("playlist-modify-public", "playlist-modify-private"),
            ..Default::default()
        },
    );
    let state = AppState::new(
        Moodboard::new(recommender),
        PlaylistFlow::new(Some(spotify), store.clone()),
    );
    (build_router(state), store)
}

/// Test helper: send a request and parse the JSON response
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, serde_json::from_slice(&bytes).expect("Should parse JSON"))
}

fn names(board: &Value) -> Vec<&str> {
    board["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_submit_mood_fills_board() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;

    let (status, body) = send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["A", "B"]);
    assert_eq!(body["claudeMood"], "happy");
    assert_eq!(body["loading"], false);

    let (_, board) = send(&app, "GET", "/board", None).await;
    assert_eq!(board, body);
}

#[tokio::test]
async fn test_invalid_mood_is_rejected_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;

    let (status, body) = send(&app, "POST", "/submit", Some(json!({ "mood": "123" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
    assert!(names(&body).is_empty());
}

#[tokio::test]
async fn test_submit_image_requires_base64() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;

    let (status, _) = send(&app, "POST", "/submit", Some(json!({ "image": "not base64!" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/submit", Some(json!({ "image": "aGk=" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["A", "B"]);
}

#[tokio::test]
async fn test_like_appends_only_new_songs() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;

    let (status, body) = send(&app, "POST", "/like/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["A", "B", "C", "D"]);
}

#[tokio::test]
async fn test_dislike_replaces_single_song() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;

    let (status, body) = send(&app, "POST", "/dislike/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["A", "C"]);
}

#[tokio::test]
async fn test_feedback_on_unknown_index_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;

    let (status, body) = send(&app, "POST", "/like/7", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("position 7"));
}

#[tokio::test]
async fn test_playlist_without_token_returns_authorize_url() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;

    let (status, body) = send(&app, "POST", "/playlist", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let url = body["authorizeUrl"].as_str().unwrap();
    assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
    assert!(url.contains("response_type=token"));
}

#[tokio::test]
async fn test_playlist_with_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    let (app, store) = setup_app(&dir).await;
    store.store(&SessionToken::new("tok", Some(3600))).await.unwrap();
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;

    let (status, body) = send(&app, "POST", "/playlist", Some(json!({ "name": "Mine" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://open.spotify.com/playlist/p");
}

#[tokio::test]
async fn test_session_rejects_redirect_without_token() {
    let dir = tempfile::tempdir().unwrap();
    let (app, store) = setup_app(&dir).await;

    let (status, _) = send(
        &app,
        "POST",
        "/session",
        Some(json!({ "redirectUrl": "http://127.0.0.1:3000/callback#error=access_denied" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_session_rejects_malformed_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;

    let (status, body) = send(
        &app,
        "POST",
        "/session",
        Some(json!({ "redirectUrl": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_board_reports_not_loading_after_failed_action() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = setup_app(&dir).await;
    send(&app, "POST", "/submit", Some(json!({ "mood": "happy" }))).await;
    send(&app, "POST", "/like/9", None).await;

    let (_, board) = send(&app, "GET", "/board", None).await;
    assert_eq!(board["loading"], false);
    assert_eq!(names(&board), ["A", "B"]);
}
