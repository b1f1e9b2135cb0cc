//! Local HTTP API that exposes one [`Moodboard`] to a browser front-end.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::board::{BoardSnapshot, Moodboard};
use crate::clients::{entities::MoodInput, errors::Error, recommender::RecommendationApi};
use crate::playlist::PlaylistFlow;

pub struct AppState<A> {
    // held across each action so feedback requests never overlap
    board: Mutex<Moodboard<A>>,
    playlists: PlaylistFlow,
}

impl<A> AppState<A> {
    pub fn new(board: Moodboard<A>, playlists: PlaylistFlow) -> Arc<Self> {
        Arc::new(AppState {
            board: Mutex::new(board),
            playlists,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum SubmitBody {
    Mood(String),
    Image(String),
}

#[derive(Deserialize, Debug, Default)]
struct PlaylistBody {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize, Debug)]
struct PlaylistCreated {
    url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    redirect_url: String,
}

/// Error response: `{"error": ...}` with a status derived from the failure.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        match self.0 {
            Error::AuthorizationRequired { url } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": message, "authorizeUrl": url })),
            )
                .into_response(),
            err => {
                let status = match err {
                    Error::InvalidMood(_)
                    | Error::InvalidInput(_)
                    | Error::IndexOutOfRange { .. }
                    | Error::NothingToSave
                    | Error::Authorization(_) => StatusCode::BAD_REQUEST,
                    ref e if e.is_upstream() => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("Request failed: {message}");
                }
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

type Shared<A> = State<Arc<AppState<A>>>;

pub fn build_router<A>(state: Arc<AppState<A>>) -> Router
where
    A: RecommendationApi + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/board", get(board::<A>))
        .route("/submit", post(submit::<A>))
        .route("/like/{index}", post(like::<A>))
        .route("/dislike/{index}", post(dislike::<A>))
        .route("/playlist", post(playlist::<A>))
        .route("/session", post(session::<A>))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn board<A>(State(state): Shared<A>) -> Json<BoardSnapshot>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    Json(state.board.lock().await.snapshot())
}

async fn submit<A>(
    State(state): Shared<A>,
    Json(body): Json<SubmitBody>,
) -> Result<Response, ApiError>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    let input = match body {
        SubmitBody::Mood(mood) => MoodInput::Text(mood),
        SubmitBody::Image(encoded) => MoodInput::Image(STANDARD.decode(encoded).map_err(|e| {
            Error::InvalidInput(format!("Image is not valid base64: {e}"))
        })?),
    };
    let mut board = state.board.lock().await;
    match board.submit(input).await {
        Ok(()) => Ok(Json(board.snapshot()).into_response()),
        Err(Error::InvalidMood(msg)) => {
            debug!("Rejected mood input: {msg}");
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(board.snapshot())).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn like<A>(
    State(state): Shared<A>,
    Path(index): Path<usize>,
) -> Result<Json<BoardSnapshot>, ApiError>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    let mut board = state.board.lock().await;
    board.like(index).await?;
    Ok(Json(board.snapshot()))
}

async fn dislike<A>(
    State(state): Shared<A>,
    Path(index): Path<usize>,
) -> Result<Json<BoardSnapshot>, ApiError>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    let mut board = state.board.lock().await;
    board.dislike(index).await?;
    Ok(Json(board.snapshot()))
}

async fn playlist<A>(
    State(state): Shared<A>,
    Json(body): Json<PlaylistBody>,
) -> Result<Json<PlaylistCreated>, ApiError>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    let board = state.board.lock().await;
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| board.default_playlist_name());
    let url = state.playlists.save(&*board, &name).await?;
    Ok(Json(PlaylistCreated { url }))
}

async fn session<A>(
    State(state): Shared<A>,
    Json(body): Json<SessionBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    A: RecommendationApi + Send + Sync + 'static,
{
    let user = state
        .playlists
        .complete_authorization(&body.redirect_url)
        .await?;
    Ok(Json(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(status_of(Error::NothingToSave), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::IndexOutOfRange { index: 3, len: 1 }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn url_errors_are_server_faults() {
        assert_eq!(
            status_of(Error::Url(url::ParseError::EmptyHost)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let err = Error::UnexpectedResponse {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }
}
