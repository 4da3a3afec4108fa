use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    error::{AppResult, FeedError},
    middleware::RequestId,
    models::{Bucket, Candidate, Category, ItemId, UserId},
    routes::AppState,
    services::feed::{ClassifyOutcome, FeedController, FeedSnapshot, FeedState},
};

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub bucket: Bucket,
}

/// Candidate as rendered by clients, with the poster resolved to a full URL
#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub id: ItemId,
    pub title: String,
    pub overview: String,
    pub year: String,
    pub rating: f64,
    pub rating_formatted: String,
    pub category: Category,
    pub poster_url: Option<String>,
    pub genre_refs: BTreeSet<i64>,
}

impl CandidateResponse {
    pub fn new(candidate: Candidate, image_base_url: &str) -> Self {
        Self {
            poster_url: candidate.poster_url(image_base_url),
            rating_formatted: candidate.rating_formatted(),
            id: candidate.id,
            title: candidate.title,
            overview: candidate.overview,
            year: candidate.year,
            rating: candidate.rating,
            category: candidate.category,
            genre_refs: candidate.genre_refs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub state: FeedState,
    pub current: Option<CandidateResponse>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub outcome: ClassifyOutcome,
    pub next: Option<CandidateResponse>,
}

async fn feed_response(
    state: &AppState,
    controller: &FeedController,
    feed_state: FeedState,
) -> FeedResponse {
    FeedResponse {
        state: feed_state,
        current: controller
            .current()
            .await
            .map(|c| CandidateResponse::new(c, &state.image_base_url)),
    }
}

/// Handler for starting a feed session
pub async fn start(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<CategoryRequest>,
) -> AppResult<Json<FeedResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        category = %request.category,
        "Starting feed"
    );

    let controller = state.feeds.get_or_create(&user_id).await;
    let feed_state = controller.start(request.category).await?;

    Ok(Json(feed_response(&state, &controller, feed_state).await))
}

pub async fn switch_category(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<CategoryRequest>,
) -> AppResult<Json<FeedResponse>> {
    let controller = state.feeds.get_or_create(&user_id).await;
    let feed_state = controller.switch_category(request.category).await?;

    Ok(Json(feed_response(&state, &controller, feed_state).await))
}

pub async fn current(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<Json<CandidateResponse>> {
    let controller = state
        .feeds
        .get(&user_id)
        .await
        .ok_or(FeedError::NoCurrentItem)?;
    let candidate = controller.current().await.ok_or(FeedError::NoCurrentItem)?;

    Ok(Json(CandidateResponse::new(candidate, &state.image_base_url)))
}

/// Handler for classifying the current candidate
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<ClassifyRequest>,
) -> AppResult<Json<ClassifyResponse>> {
    let controller = state
        .feeds
        .get(&user_id)
        .await
        .ok_or(FeedError::NoCurrentItem)?;
    let outcome = controller.classify(request.bucket).await?;

    if !outcome.persisted {
        tracing::warn!(
            request_id = %request_id,
            item_id = outcome.item_id,
            "Classification not persisted"
        );
    }

    let next = controller
        .current()
        .await
        .map(|c| CandidateResponse::new(c, &state.image_base_url));

    Ok(Json(ClassifyResponse { outcome, next }))
}

pub async fn state(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
) -> Json<FeedSnapshot> {
    match state.feeds.get(&user_id).await {
        Some(controller) => Json(controller.snapshot().await),
        None => Json(FeedSnapshot::uninitialized()),
    }
}

/// Handler for ending a feed session
pub async fn close(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(user_id): Extension<UserId>,
) -> StatusCode {
    let removed = state.feeds.remove(&user_id).await;
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        removed,
        "Feed session closed"
    );
    StatusCode::NO_CONTENT
}
