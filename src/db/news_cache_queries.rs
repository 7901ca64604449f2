use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::{CreateNewsRecord, NewsRecord};

/// Earliest cached row for a company on a calendar day
pub async fn fetch_by_company_and_date(
    pool: &SqlitePool,
    company: &str,
    date: NaiveDate,
) -> Result<Option<NewsRecord>, sqlx::Error> {
    sqlx::query_as::<_, NewsRecord>(
        r#"
        SELECT id, company, date, summary, sentiment, links, created_at, updated_at
        FROM news_cache
        WHERE company = ? AND date = ?
        ORDER BY id ASC
        LIMIT 1
        "#
    )
    .bind(company)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Insert a cache row inside its own transaction; dropped on error so nothing partial is kept.
pub async fn insert(
    pool: &SqlitePool,
    data: &CreateNewsRecord,
) -> Result<NewsRecord, sqlx::Error> {
    let links = serde_json::to_string(&data.links)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to encode links: {}", e)))?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let record = sqlx::query_as::<_, NewsRecord>(
        r#"
        INSERT INTO news_cache (company, date, summary, sentiment, links, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, company, date, summary, sentiment, links, created_at, updated_at
        "#
    )
    .bind(&data.company)
    .bind(data.date)
    .bind(&data.summary)
    .bind(data.sentiment.as_str())
    .bind(links)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(record)
}
