use crate::config::CurationSettings;
use crate::domain::article::{ArticleCandidate, DigestItem};

pub const DEFAULT_ITEMS_PER_INTEREST: usize = 2;

/// Keyword and source lists used to tell good news apart from noise.
///
/// Every entry is stored lowercased and trimmed, so matching is a plain
/// substring search against lowercased article text.
#[derive(Debug, Clone)]
pub struct CurationRules {
    positive_keywords: Vec<String>,
    exclusion_keywords: Vec<String>,
    trusted_sources: Vec<String>,
    max_items_per_interest: usize,
}

impl CurationRules {
    pub fn new(
        positive_keywords: Vec<String>,
        exclusion_keywords: Vec<String>,
        trusted_sources: Vec<String>,
        max_items_per_interest: usize,
    ) -> CurationRules {
        CurationRules {
            positive_keywords: normalize(positive_keywords),
            exclusion_keywords: normalize(exclusion_keywords),
            trusted_sources: normalize(trusted_sources),
            max_items_per_interest,
        }
    }

    /// Filters, ranks and caps the candidates fetched for one interest.
    ///
    /// Candidates without a title or description are unusable and dropped.
    /// The rest must mention a positive keyword and no excluded keyword,
    /// either in their text or in their source name. Trusted sources are
    /// moved to the front; otherwise fetch order is kept.
    pub fn select_good_news(
        &self,
        interest: &str,
        candidates: Vec<ArticleCandidate>,
    ) -> Vec<DigestItem> {
        let mut items: Vec<DigestItem> = candidates
            .into_iter()
            .filter_map(|candidate| self.classify(interest, candidate))
            .collect();

        items.sort_by_key(|item| !self.is_trusted(&item.source_name));
        items.truncate(self.max_items_per_interest);

        items
    }

    pub fn is_trusted(&self, source_name: &str) -> bool {
        let source = source_name.to_lowercase();

        self.trusted_sources
            .iter()
            .any(|trusted| source.contains(trusted.as_str()))
    }

    fn classify(&self, interest: &str, candidate: ArticleCandidate) -> Option<DigestItem> {
        let title = non_blank(candidate.title)?;
        let description = non_blank(candidate.description)?;
        let text = format!("{} {}", title, description).to_lowercase();
        let source = candidate.source_name.to_lowercase();

        if contains_any(&text, &self.exclusion_keywords)
            || contains_any(&source, &self.exclusion_keywords)
        {
            return None;
        }

        if !contains_any(&text, &self.positive_keywords) {
            return None;
        }

        Some(DigestItem {
            title,
            description,
            url: candidate.url,
            source_name: candidate.source_name,
            published_at: candidate.published_at,
            image_url: candidate.image_url,
            category: interest.to_string(),
        })
    }
}

impl From<&CurationSettings> for CurationRules {
    fn from(settings: &CurationSettings) -> Self {
        CurationRules::new(
            settings.positive_keywords.clone(),
            settings.exclusion_keywords.clone(),
            settings.trusted_sources.clone(),
            settings.max_items_per_interest,
        )
    }
}

fn normalize(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
