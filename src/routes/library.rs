use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Bucket, Category, Decision, ItemId, UserId},
    routes::AppState,
    services::library,
};

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub item_id: ItemId,
    pub category: Category,
    pub bucket: Bucket,
    pub title: String,
    pub year: String,
    pub rating: f64,
    pub poster_url: Option<String>,
    pub genre_refs: Vec<i64>,
    pub decided_at: DateTime<Utc>,
}

impl DecisionResponse {
    fn new(decision: Decision, image_base_url: &str) -> Self {
        let poster_url = decision.metadata.poster_url(image_base_url);

        Self {
            item_id: decision.item_id,
            category: decision.category,
            bucket: decision.bucket,
            title: decision.metadata.title,
            year: decision.metadata.year,
            rating: decision.metadata.rating,
            poster_url,
            genre_refs: decision.metadata.genre_refs,
            decided_at: decision.decided_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketResponse {
    pub category: Category,
    pub bucket: Bucket,
    pub count: usize,
    pub items: Vec<DecisionResponse>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
    Path((category, bucket)): Path<(Category, Bucket)>,
) -> AppResult<Json<BucketResponse>> {
    let decisions = library::list(state.store.as_ref(), &user_id, category, bucket).await?;

    Ok(Json(BucketResponse {
        category,
        bucket,
        count: decisions.len(),
        items: decisions
            .into_iter()
            .map(|d| DecisionResponse::new(d, &state.image_base_url))
            .collect(),
    }))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
    Path((category, bucket, item_id)): Path<(Category, Bucket, ItemId)>,
) -> AppResult<StatusCode> {
    library::remove(state.store.as_ref(), &user_id, category, item_id, bucket).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Moves an item from the watchlist to watched
pub async fn mark_watched(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<UserId>,
    Path((category, bucket, item_id)): Path<(Category, Bucket, ItemId)>,
) -> AppResult<Json<DecisionResponse>> {
    if bucket != Bucket::Watchlisted {
        return Err(AppError::InvalidInput(format!(
            "only watchlist items can be marked watched, not {}",
            bucket
        )));
    }

    let moved =
        library::mark_watched_from_watchlist(state.store.as_ref(), &user_id, category, item_id)
            .await?;
    Ok(Json(DecisionResponse::new(moved, &state.image_base_url)))
}
