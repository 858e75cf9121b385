use chrono::{DateTime, Utc};

/// A raw article as returned by the news provider, before curation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArticleCandidate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// An article that made it through curation, tagged with the interest it
/// was found under.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DigestItem {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub category: String,
}
