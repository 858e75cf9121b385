use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time;

use crate::domain::article::ArticleCandidate;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);
const SEARCH_LOOKBACK_HOURS: i64 = 24;

/// Source of raw article candidates.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Recent breaking items in one of the provider's fixed categories.
    async fn fetch_top_headlines(
        &self,
        category: &str,
        page_size: u32,
        country: &str,
    ) -> anyhow::Result<Vec<ArticleCandidate>>;

    /// Free-text search over items published after `since`, newest first.
    async fn fetch_everything(
        &self,
        query: &str,
        since: DateTime<Utc>,
        page_size: u32,
    ) -> anyhow::Result<Vec<ArticleCandidate>>;
}

/// How candidates are fetched for one interest tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    TopHeadlines { category: &'static str },
    Everything { query: String, since: DateTime<Utc> },
}

impl NewsQuery {
    /// Known tags map to a provider category; anything else becomes a search
    /// over the last 24 hours.
    pub fn for_interest(interest: &str, now: DateTime<Utc>) -> NewsQuery {
        match provider_category(interest) {
            Some(category) => NewsQuery::TopHeadlines { category },
            None => NewsQuery::Everything {
                query: interest.to_string(),
                since: now - Duration::hours(SEARCH_LOOKBACK_HOURS),
            },
        }
    }
}

pub fn provider_category(interest: &str) -> Option<&'static str> {
    match interest {
        "tech" | "technology" => Some("technology"),
        "science" => Some("science"),
        "health" => Some("health"),
        "sports" => Some("sports"),
        "business" => Some("business"),
        "entertainment" | "arts" => Some("entertainment"),
        _ => None,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum NewsApiError {
    #[error("Failed to reach the news provider.")]
    RequestError(#[from] reqwest::Error),
    #[error("The news provider rejected the request ({code}): {message}")]
    ProviderError { code: String, message: String },
}

pub struct NewsApiClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NewsApiSource {
    name: Option<String>,
}

impl NewsApiArticle {
    fn into_candidate(self) -> Option<ArticleCandidate> {
        let url = self.url.filter(|url| !url.trim().is_empty())?;
        let published_at = self
            .published_at
            .and_then(|published_at| DateTime::parse_from_rfc3339(&published_at).ok())
            .map(|published_at| published_at.with_timezone(&Utc));

        Some(ArticleCandidate {
            title: self.title,
            description: self.description,
            url,
            source_name: self
                .source
                .and_then(|source| source.name)
                .unwrap_or_default(),
            published_at,
            image_url: self.url_to_image,
        })
    }
}

impl NewsApiClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> NewsApiClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        NewsApiClient {
            http_client,
            base_url,
            api_key,
        }
    }

    #[tracing::instrument(name = "Fetching top headlines", skip(self))]
    pub async fn top_headlines(
        &self,
        category: &str,
        page_size: u32,
        country: &str,
    ) -> Result<Vec<ArticleCandidate>, NewsApiError> {
        let url = format!("{}/v2/top-headlines", self.base_url);
        let page_size = page_size.to_string();

        self.get_articles(
            &url,
            &[
                ("category", category),
                ("country", country),
                ("pageSize", page_size.as_str()),
            ],
        )
        .await
    }

    #[tracing::instrument(name = "Searching recent articles", skip(self))]
    pub async fn everything(
        &self,
        query: &str,
        since: DateTime<Utc>,
        page_size: u32,
    ) -> Result<Vec<ArticleCandidate>, NewsApiError> {
        let url = format!("{}/v2/everything", self.base_url);
        let from = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = page_size.to_string();

        self.get_articles(
            &url,
            &[
                ("q", query),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ],
        )
        .await
    }

    async fn get_articles(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<ArticleCandidate>, NewsApiError> {
        let body: NewsApiResponse = self
            .http_client
            .get(url)
            .header("X-Api-Key", self.api_key.expose_secret())
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.status != "ok" {
            return Err(NewsApiError::ProviderError {
                code: body.code.unwrap_or_else(|| String::from("unknown")),
                message: body.message.unwrap_or_default(),
            });
        }

        Ok(body
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_candidate)
            .collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch_top_headlines(
        &self,
        category: &str,
        page_size: u32,
        country: &str,
    ) -> anyhow::Result<Vec<ArticleCandidate>> {
        Ok(self.top_headlines(category, page_size, country).await?)
    }

    async fn fetch_everything(
        &self,
        query: &str,
        since: DateTime<Utc>,
        page_size: u32,
    ) -> anyhow::Result<Vec<ArticleCandidate>> {
        Ok(self.everything(query, since, page_size).await?)
    }
}
