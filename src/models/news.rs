use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sentiment classification for a daily news summary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment label: {}", other)),
        }
    }
}

/// Row in the `news_cache` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsRecord {
    pub id: i64,
    pub company: String,
    pub date: NaiveDate,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    /// JSON-encoded array of citation URLs
    pub links: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsRecord {
    pub fn decode_links(&self) -> Result<Vec<String>, serde_json::Error> {
        match self.links.as_deref() {
            Some(raw) => serde_json::from_str(raw),
            None => Ok(Vec::new()),
        }
    }

    pub fn sentiment_label(&self) -> Option<Sentiment> {
        self.sentiment.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Input for inserting a cache row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNewsRecord {
    pub company: String,
    pub date: NaiveDate,
    pub summary: String,
    pub sentiment: Sentiment,
    pub links: Vec<String>,
}

/// One (company, date) item returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsQueryResult {
    pub date: NaiveDate,
    pub company: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub links: Vec<String>,
    pub cached: bool,
}

/// Request body for `POST /api/fetch-news`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchNewsRequest {
    pub companies: Vec<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl FetchNewsRequest {
    /// Trimmed company names with blank entries dropped.
    pub fn normalized_companies(&self) -> Vec<String> {
        self.companies
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchNewsResponse {
    pub success: bool,
    pub data: Vec<NewsQueryResult>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(links: Option<&str>, sentiment: Option<&str>) -> NewsRecord {
        NewsRecord {
            id: 1,
            company: "Acme".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            summary: Some("Quiet day.".to_string()),
            sentiment: sentiment.map(str::to_string),
            links: links.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert!("bullish".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_decode_links() {
        let r = record(Some(r#"["https://a.example","https://b.example"]"#), None);
        assert_eq!(
            r.decode_links().unwrap(),
            vec!["https://a.example", "https://b.example"]
        );

        assert!(record(None, None).decode_links().unwrap().is_empty());
        assert!(record(Some("not json"), None).decode_links().is_err());
    }

    #[test]
    fn test_sentiment_label_parsing() {
        assert_eq!(record(None, Some("negative")).sentiment_label(), Some(Sentiment::Negative));
        assert_eq!(record(None, Some("???")).sentiment_label(), None);
        assert_eq!(record(None, None).sentiment_label(), None);
    }

    #[test]
    fn test_request_defaults_and_normalization() {
        let req: FetchNewsRequest =
            serde_json::from_str(r#"{"companies":[" Acme ","","  ","Globex"]}"#).unwrap();
        assert!(!req.force_refresh);
        assert_eq!(req.normalized_companies(), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_query_result_date_format() {
        let item = NewsQueryResult {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            company: "Acme".to_string(),
            summary: String::new(),
            sentiment: Sentiment::Neutral,
            links: vec![],
            cached: true,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["date"], "2024-03-05");
        assert_eq!(value["sentiment"], "neutral");
        assert_eq!(value["cached"], true);
    }
}
