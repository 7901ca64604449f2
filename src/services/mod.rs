pub mod news_cache;
pub mod news_provider;
pub mod news_service;
pub mod pacing;
pub mod sentiment_service;
