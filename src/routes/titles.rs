use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::Category,
    routes::{feed::CandidateResponse, AppState},
    services::title_search,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    category: Category,
    q: String,
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<CandidateResponse>>> {
    let titles =
        title_search::search_titles(state.catalog.as_ref(), params.category, &params.q).await?;
    Ok(Json(
        titles
            .into_iter()
            .map(|c| CandidateResponse::new(c, &state.image_base_url))
            .collect(),
    ))
}
