use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::news_cache_queries;
use crate::errors::AppError;
use crate::models::{CreateNewsRecord, NewsRecord};

/// Outcome of a cache read.
///
/// `Unavailable` is a storage fault; callers treat it exactly like `Miss`
/// but it stays distinguishable for logging.
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(NewsRecord),
    Miss,
    Unavailable(String),
}

impl CacheLookup {
    pub fn into_record(self) -> Option<NewsRecord> {
        match self {
            CacheLookup::Hit(record) => Some(record),
            CacheLookup::Miss | CacheLookup::Unavailable(_) => None,
        }
    }
}

/// Keyed (company, calendar day) store for daily news records
#[async_trait]
pub trait NewsCacheStore: Send + Sync {
    /// Never fails: backend faults come back as `CacheLookup::Unavailable`.
    async fn lookup(&self, company: &str, date: NaiveDate) -> CacheLookup;

    /// Insert a new row. A failed write leaves nothing behind.
    async fn store(&self, data: &CreateNewsRecord) -> Result<NewsRecord, AppError>;
}

/// Cache store backed by the `news_cache` table
#[derive(Clone)]
pub struct SqlNewsCache {
    pool: SqlitePool,
}

impl SqlNewsCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsCacheStore for SqlNewsCache {
    async fn lookup(&self, company: &str, date: NaiveDate) -> CacheLookup {
        match news_cache_queries::fetch_by_company_and_date(&self.pool, company, date).await {
            Ok(Some(record)) => CacheLookup::Hit(record),
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                error!("Error retrieving cached news for {} on {}: {}", company, date, e);
                CacheLookup::Unavailable(e.to_string())
            }
        }
    }

    async fn store(&self, data: &CreateNewsRecord) -> Result<NewsRecord, AppError> {
        let record = news_cache_queries::insert(&self.pool, data)
            .await
            .map_err(|e| {
                error!("Error caching news for {} on {}: {}", data.company, data.date, e);
                AppError::Db(e)
            })?;
        info!("Cached news for {} on {} (row {})", record.company, record.date, record.id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::news_cache_queries::test_support::memory_pool;
    use crate::models::Sentiment;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn create() -> CreateNewsRecord {
        CreateNewsRecord {
            company: "Initech".to_string(),
            date: day(),
            summary: "Layoffs announced".to_string(),
            sentiment: Sentiment::Negative,
            links: vec![],
        }
    }

    #[tokio::test]
    async fn test_lookup_miss_then_hit() {
        let cache = SqlNewsCache::new(memory_pool().await);

        assert!(matches!(cache.lookup("Initech", day()).await, CacheLookup::Miss));

        cache.store(&create()).await.unwrap();

        match cache.lookup("Initech", day()).await {
            CacheLookup::Hit(record) => {
                assert_eq!(record.sentiment_label(), Some(Sentiment::Negative));
                assert!(record.decode_links().unwrap().is_empty());
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_storage_fault_degrades_to_unavailable() {
        let pool = memory_pool().await;
        let cache = SqlNewsCache::new(pool.clone());
        pool.close().await;

        let lookup = cache.lookup("Initech", day()).await;
        assert!(matches!(lookup, CacheLookup::Unavailable(_)));
        assert!(lookup.into_record().is_none());

        assert!(matches!(cache.store(&create()).await, Err(AppError::Db(_))));
    }
}
