pub mod news_cache_queries;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Open the cache database and bring its schema up to date.
///
/// `sqlite::memory:` databases live per connection, so callers using one
/// should pass `max_connections = 1`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready ({} max connections)", max_connections);

    Ok(pool)
}
