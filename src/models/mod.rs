mod health;
mod news;

pub use health::{ApiStatus, HealthStatus};
pub use news::{
    CreateNewsRecord, FetchNewsRequest, FetchNewsResponse, NewsQueryResult, NewsRecord, Sentiment,
};
