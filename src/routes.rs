//! HTTP surface.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /api/news?page=&limit=` | page of the published list |
//! | `GET /api/top5` | first five articles, without audio |
//! | `GET /api/rashifal` | all forecasts, 404 while empty |
//! | `GET /api/rashifal/{sign}` | one forecast, sign matched case-insensitively |
//! | `GET/POST /api/post` | the submission ledger, unmerged |
//! | `PUT/DELETE /api/post/{id}` | edit or remove a submission |
//! | `POST /api/convert-tts` | uncached speech for arbitrary text |
//! | `GET /api/status` | refresh phase and counts |
//!
//! Errors are `{ "message": ... }` with a matching status code.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument, warn};

use crate::ledger::{LedgerError, NewSubmission, SubmissionPatch};
use crate::models::{Article, ArticleSummary, NewsPage, RashifalEntry};
use crate::refresh::RefreshPhase;
use crate::speech::SpeechError;
use crate::state::AppState;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;
const TOP_N: usize = 5;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/news", get(list_news))
        .route("/top5", get(top5))
        .route("/rashifal", get(rashifal))
        .route("/rashifal/{sign}", get(rashifal_sign))
        .route("/post", get(list_posts).post(create_post))
        .route("/post/{id}", put(update_post).delete(delete_post))
        .route("/convert-tts", post(convert_tts))
        .route("/status", get(status));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, MessageResponse::new(self.to_string())).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(_) => ApiError::NotFound(e.to_string()),
            LedgerError::DuplicateId(_) => ApiError::Conflict(e.to_string()),
            LedgerError::EmptyId | LedgerError::EmptyTitle | LedgerError::InvalidDate(_) => {
                ApiError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

async fn list_news(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<NewsPage>> {
    let Query(params) = params?;
    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(Json(state.store.list(page, limit)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopResponse {
    pub top5_news: Vec<ArticleSummary>,
}

async fn top5(State(state): State<Arc<AppState>>) -> Json<TopResponse> {
    Json(TopResponse {
        top5_news: state.store.top(TOP_N),
    })
}

async fn rashifal(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<RashifalEntry>>> {
    let entries = state.forecasts.list();
    if entries.is_empty() {
        return Err(ApiError::NotFound("No rashifal found".to_string()));
    }
    Ok(Json(entries.as_ref().clone()))
}

async fn rashifal_sign(
    State(state): State<Arc<AppState>>,
    Path(sign): Path<String>,
) -> ApiResult<Json<RashifalEntry>> {
    state
        .forecasts
        .find(&sign)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No rashifal for {sign}")))
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Json<Vec<Article>> {
    Json(state.ledger.list())
}

#[instrument(level = "info", skip_all)]
async fn create_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(input) = payload?;
    let article = state.ledger.create(input).await?;
    info!(id = %article.id, "Submission accepted");
    Ok((
        StatusCode::CREATED,
        MessageResponse::new("News added successfully"),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub message: String,
    pub updated_item: Article,
}

#[instrument(level = "info", skip(state, payload))]
async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<SubmissionPatch>, JsonRejection>,
) -> ApiResult<Json<UpdateResponse>> {
    let Json(patch) = payload?;
    let updated_item = state.ledger.update(&id, patch).await?;
    Ok(Json(UpdateResponse {
        message: "News updated successfully".to_string(),
        updated_item,
    }))
}

#[instrument(level = "info", skip(state))]
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.ledger.delete(&id)?;
    Ok(MessageResponse::new("News deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TtsResponse {
    pub audio: String,
}

#[instrument(level = "info", skip_all)]
async fn convert_tts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> ApiResult<Json<TtsResponse>> {
    let Json(request) = payload?;
    match state.speech.request(&request.text, request.locale.as_deref()).await {
        Ok(audio) => Ok(Json(TtsResponse { audio })),
        Err(SpeechError::EmptyText) => Err(ApiError::BadRequest("Text is required".to_string())),
        Err(e) => {
            warn!(error = %e, "TTS passthrough failed");
            Err(ApiError::Upstream(format!("Failed to convert text to speech: {e}")))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub phase: RefreshPhase,
    pub last_refresh: Option<DateTime<Utc>>,
    pub article_count: usize,
    pub submitted_count: usize,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.store.snapshot();
    Json(StatusResponse {
        phase: state.scheduler.phase(),
        last_refresh: snapshot.published_at,
        article_count: snapshot.articles.len(),
        submitted_count: state.ledger.len(),
    })
}
