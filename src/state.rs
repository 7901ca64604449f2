use std::sync::Arc;
use sqlx::SqlitePool;
use crate::services::news_service::NewsService;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub news_service: Arc<NewsService>,
}
