use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::{env_lookup, parse_or};
use crate::errors::{ConfigError, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "llama-3.1-sonar-large-128k-online";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prefix of the summary placed in a cell whose provider call failed
pub const FETCH_FAILURE_PREFIX: &str = "Unable to fetch news:";

/// Configuration for the news provider client
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// The API key is mandatory; everything else has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("PERPLEXITY_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingVar("PERPLEXITY_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("PERPLEXITY_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("PERPLEXITY_MODEL") {
            config.model = model;
        }
        config.timeout = Duration::from_secs(parse_or(
            &lookup,
            "PROVIDER_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        Ok(config)
    }
}

/// Prose summary plus citation links for one company on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderNews {
    pub summary: String,
    pub links: Vec<String>,
}

/// External text-generation service answering "what happened to X on day D"
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_daily_news(&self, company: &str, date: &str) -> Result<ProviderNews, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Result of a provider call after failures have been folded into a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(ProviderNews),
    /// Synthetic result carrying the failure message and no links
    Failed(ProviderNews),
}

/// Call the provider once. Errors never escape: they become a placeholder
/// summary naming the cause.
pub async fn fetch_or_placeholder(
    provider: &dyn NewsProvider,
    company: &str,
    date: &str,
) -> FetchOutcome {
    info!("Fetching news for {} on {} via {}", company, date, provider.name());
    match provider.fetch_daily_news(company, date).await {
        Ok(news) => FetchOutcome::Fetched(news),
        Err(e) => {
            error!("Error fetching news for {} on {}: {}", company, date, e);
            FetchOutcome::Failed(ProviderNews {
                summary: format!("{} {}", FETCH_FAILURE_PREFIX, e),
                links: Vec::new(),
            })
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// System + user prompt asking for verified business news from one specific day.
pub fn build_messages(company: &str, date: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: format!(
                "You are an AI assistant. Please provide news about {} for the specific date \
                 in a clear, concise format. Focus on business and investment-relevant \
                 information such as stock performance, financial results, business \
                 developments, and market analysis.",
                company
            ),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!(
                "What are the key business and investment-related news updates about {} \
                 for {}? Please provide only verified news from this specific date.",
                company, date
            ),
        },
    ]
}

/// Pull the first choice's text and any citation links out of a completion body.
fn parse_completion(body: &str) -> Result<ProviderNews, ProviderError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let summary = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)?;

    // Citations are plain URL strings; tolerate `{ "url": ... }` objects too.
    let links = response
        .citations
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| match c {
            serde_json::Value::String(url) => Some(url),
            serde_json::Value::Object(obj) => obj
                .get("url")
                .and_then(|u| u.as_str())
                .map(str::to_string),
            _ => None,
        })
        .collect();

    Ok(ProviderNews { summary, links })
}

/// Perplexity chat-completions client (OpenAI-compatible API)
pub struct PerplexityProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl PerplexityProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key,
            base_url: config.base_url,
            model: config.model,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl NewsProvider for PerplexityProvider {
    async fn fetch_daily_news(&self, company: &str, date: &str) -> Result<ProviderNews, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: build_messages(company, date),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let news = parse_completion(&body)?;
        info!(
            "Provider returned {} chars and {} citations for {} on {}",
            news.summary.len(),
            news.links.len(),
            company,
            date
        );
        Ok(news)
    }

    fn name(&self) -> &'static str {
        "perplexity"
    }
}
