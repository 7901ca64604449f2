use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{env_lookup, parse_or};
use crate::errors::{AppError, ConfigError};
use crate::models::{CreateNewsRecord, NewsQueryResult, NewsRecord, Sentiment};
use crate::services::news_cache::NewsCacheStore;
use crate::services::news_provider::{fetch_or_placeholder, FetchOutcome, NewsProvider};
use crate::services::pacing::PacingPolicy;
use crate::services::sentiment_service::SentimentClassifier;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_PACING_DELAY_MS: u64 = 500;

/// Longest accepted window; one cell per company per day is fetched.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Configuration for the news reconciliation loop
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Number of calendar days ending today, inclusive
    pub window_days: u32,
    /// Minimum gap between consecutive provider calls
    pub pacing_delay: Duration,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            pacing_delay: Duration::from_millis(DEFAULT_PACING_DELAY_MS),
        }
    }
}

impl NewsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_days = parse_or(&lookup, "NEWS_WINDOW_DAYS", DEFAULT_WINDOW_DAYS)?;
        if window_days == 0 || window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid {
                var: "NEWS_WINDOW_DAYS",
                value: window_days.to_string(),
            });
        }
        let pacing_ms = parse_or(&lookup, "NEWS_PACING_DELAY_MS", DEFAULT_PACING_DELAY_MS)?;

        Ok(Self {
            window_days,
            pacing_delay: Duration::from_millis(pacing_ms),
        })
    }
}

/// Per-company, per-day cache-or-fetch reconciliation over a trailing window
pub struct NewsService {
    config: NewsConfig,
    provider: Arc<dyn NewsProvider>,
    pacer: Arc<dyn PacingPolicy>,
    classifier: SentimentClassifier,
}

impl NewsService {
    pub fn new(
        config: NewsConfig,
        provider: Arc<dyn NewsProvider>,
        pacer: Arc<dyn PacingPolicy>,
    ) -> Self {
        info!(
            "Initializing news service (provider: {}, window: {} days)",
            provider.name(),
            config.window_days
        );
        Self {
            config,
            provider,
            pacer,
            classifier: SentimentClassifier::new(),
        }
    }

    /// Inclusive window `[today - (window_days - 1), today]`, oldest first.
    pub fn date_window(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let days = i64::from(self.config.window_days);
        (0..days)
            .rev()
            .map(|offset| today - ChronoDuration::days(offset))
            .collect()
    }

    /// News for every company over the window ending today (local time).
    pub async fn get_news(
        &self,
        store: &dyn NewsCacheStore,
        companies: &[String],
        force_refresh: bool,
    ) -> Result<Vec<NewsQueryResult>, AppError> {
        let today = Local::now().date_naive();
        self.get_news_as_of(store, companies, force_refresh, today).await
    }

    /// Same as [`get_news`](Self::get_news) with an explicit anchor day.
    ///
    /// Only an empty company list is an error. Per-cell failures degrade
    /// in place; anything else abandons the pass and yields an empty list.
    pub async fn get_news_as_of(
        &self,
        store: &dyn NewsCacheStore,
        companies: &[String],
        force_refresh: bool,
        today: NaiveDate,
    ) -> Result<Vec<NewsQueryResult>, AppError> {
        if companies.is_empty() {
            return Err(AppError::Validation("No companies provided".to_string()));
        }

        match self.reconcile(store, companies, force_refresh, today).await {
            Ok(news) => Ok(news),
            Err(e) => {
                error!("Error in get_news: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn reconcile(
        &self,
        store: &dyn NewsCacheStore,
        companies: &[String],
        force_refresh: bool,
        today: NaiveDate,
    ) -> Result<Vec<NewsQueryResult>, AppError> {
        let window = self.date_window(today);
        let mut all_news = Vec::with_capacity(companies.len() * window.len());
        let mut hits = 0usize;

        for company in companies {
            for &date in &window {
                let cached = if force_refresh {
                    None
                } else {
                    store.lookup(company, date).await.into_record()
                };

                match cached {
                    Some(record) => {
                        all_news.push(cached_result(record)?);
                        hits += 1;
                    }
                    None => all_news.push(self.fetch_fresh(store, company, date).await),
                }
            }
        }

        info!(
            "Reconciled {} items for {} companies ({} from cache, force_refresh={})",
            all_news.len(),
            companies.len(),
            hits,
            force_refresh
        );

        sort_newest_first(&mut all_news);
        Ok(all_news)
    }

    async fn fetch_fresh(
        &self,
        store: &dyn NewsCacheStore,
        company: &str,
        date: NaiveDate,
    ) -> NewsQueryResult {
        self.pacer.wait_turn().await;

        let date_str = date.format("%Y-%m-%d").to_string();
        let (news, sentiment) =
            match fetch_or_placeholder(self.provider.as_ref(), company, &date_str).await {
                FetchOutcome::Fetched(news) => {
                    let sentiment = self.classifier.classify(&news.summary);
                    (news, sentiment)
                }
                // Failure placeholders are labelled neutral without scoring the error text.
                FetchOutcome::Failed(news) => (news, Sentiment::Neutral),
            };

        let record = CreateNewsRecord {
            company: company.to_string(),
            date,
            summary: news.summary,
            sentiment,
            links: news.links,
        };

        if let Err(e) = store.store(&record).await {
            warn!("News for {} on {} was not cached: {}", company, date_str, e);
        }

        NewsQueryResult {
            date: record.date,
            company: record.company,
            summary: record.summary,
            sentiment: record.sentiment,
            links: record.links,
            cached: false,
        }
    }
}

fn cached_result(record: NewsRecord) -> Result<NewsQueryResult, AppError> {
    let links = record.decode_links()?;
    let sentiment = record.sentiment_label().unwrap_or_else(|| {
        warn!(
            "Cached row {} has unrecognised sentiment {:?}; reporting neutral",
            record.id, record.sentiment
        );
        Sentiment::Neutral
    });

    Ok(NewsQueryResult {
        date: record.date,
        company: record.company,
        summary: record.summary.unwrap_or_default(),
        sentiment,
        links,
        cached: true,
    })
}

/// Descending by date, ties broken by descending company name.
fn sort_newest_first(items: &mut [NewsQueryResult]) {
    items.sort_by(|a, b| (b.date, &b.company).cmp(&(a.date, &a.company)));
}
