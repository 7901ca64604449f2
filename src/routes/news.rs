use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{FetchNewsRequest, FetchNewsResponse};
use crate::services::news_cache::SqlNewsCache;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/fetch-news", post(fetch_news))
}

/// POST /api/fetch-news
///
/// Daily news with sentiment for each company over the trailing window.
/// Cached days are served from the database unless `force_refresh` is set.
async fn fetch_news(
    State(state): State<AppState>,
    Json(request): Json<FetchNewsRequest>,
) -> Result<Json<FetchNewsResponse>, AppError> {
    let companies = request.normalized_companies();
    info!(
        "POST /api/fetch-news - {} companies (force_refresh={})",
        companies.len(),
        request.force_refresh
    );

    if companies.is_empty() {
        warn!("Rejecting fetch-news request without companies");
        return Err(AppError::Validation("No companies provided".to_string()));
    }

    let store = SqlNewsCache::new(state.pool.clone());
    let data = state
        .news_service
        .get_news(&store, &companies, request.force_refresh)
        .await?;

    info!("Returning {} news items", data.len());
    Ok(Json(FetchNewsResponse {
        success: true,
        data,
        message: "Data retrieved successfully".to_string(),
    }))
}
