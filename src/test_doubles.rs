//! In-memory collaborators for exercising the pipeline without Postgres or HTTP.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::article::ArticleCandidate;
use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailSender;
use crate::news_client::NewsProvider;
use crate::subscriber_store::SubscriberStore;

pub fn subscriber(email: &str, interests: &[&str], timezone: &str) -> Subscriber {
    Subscriber {
        id: Uuid::new_v4(),
        email: email.to_string(),
        interests: interests.iter().map(|interest| interest.to_string()).collect(),
        timezone: timezone.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        last_digest_on: None,
    }
}

pub fn candidate(title: &str, description: &str, source: &str) -> ArticleCandidate {
    ArticleCandidate {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        url: format!("https://news.test/{}", title.to_lowercase().replace(' ', "-")),
        source_name: source.to_string(),
        published_at: None,
        image_url: None,
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    pub subscribers: Mutex<Vec<Subscriber>>,
    pub fail_reads: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl InMemoryStore {
    pub fn with_subscribers(subscribers: Vec<Subscriber>) -> InMemoryStore {
        InMemoryStore {
            subscribers: Mutex::new(subscribers),
            ..Default::default()
        }
    }

    pub fn unavailable() -> InMemoryStore {
        InMemoryStore {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn get_all(&self) -> anyhow::Result<Vec<Subscriber>> {
        self.record("get_all");
        if self.fail_reads {
            anyhow::bail!("connection refused");
        }
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Subscriber>> {
        self.record("get_by_email");
        if self.fail_reads {
            anyhow::bail!("connection refused");
        }
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .find(|subscriber| subscriber.email == email)
            .cloned())
    }

    async fn insert(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()> {
        self.record("insert");
        let mut created = subscriber(
            new_subscriber.email.as_ref(),
            &[],
            new_subscriber.timezone.as_ref(),
        );
        created.interests = new_subscriber.interests.as_strings();
        self.subscribers.lock().unwrap().push(created);
        Ok(())
    }

    async fn update_preferences(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()> {
        self.record("update_preferences");
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(existing) = subscribers
            .iter_mut()
            .find(|subscriber| subscriber.email == new_subscriber.email.as_ref())
        {
            existing.interests = new_subscriber.interests.as_strings();
            existing.timezone = new_subscriber.timezone.as_ref().to_string();
            existing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn claim_delivery(&self, email: &str, date: NaiveDate) -> anyhow::Result<bool> {
        self.record("claim_delivery");
        let mut subscribers = self.subscribers.lock().unwrap();
        let Some(existing) = subscribers
            .iter_mut()
            .find(|subscriber| subscriber.email == email)
        else {
            return Ok(false);
        };
        if existing.last_digest_on.map_or(false, |last| last >= date) {
            return Ok(false);
        }
        existing.last_digest_on = Some(date);
        Ok(true)
    }
}

/// Serves canned candidates keyed by provider category or search query.
#[derive(Default)]
pub struct StubNewsProvider {
    pub articles: HashMap<String, Vec<ArticleCandidate>>,
    pub failing: HashSet<String>,
    pub requests: Mutex<Vec<String>>,
}

impl StubNewsProvider {
    pub fn with_articles(key: &str, articles: Vec<ArticleCandidate>) -> StubNewsProvider {
        let mut provider = StubNewsProvider::default();
        provider.articles.insert(key.to_string(), articles);
        provider
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, key: &str) -> anyhow::Result<Vec<ArticleCandidate>> {
        self.requests.lock().unwrap().push(key.to_string());
        if self.failing.contains(key) {
            anyhow::bail!("provider unavailable for {}", key);
        }
        Ok(self.articles.get(key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl NewsProvider for StubNewsProvider {
    async fn fetch_top_headlines(
        &self,
        category: &str,
        _page_size: u32,
        _country: &str,
    ) -> anyhow::Result<Vec<ArticleCandidate>> {
        self.respond(category)
    }

    async fn fetch_everything(
        &self,
        query: &str,
        _since: DateTime<Utc>,
        _page_size: u32,
    ) -> anyhow::Result<Vec<ArticleCandidate>> {
        self.respond(query)
    }
}

#[derive(Default)]
pub struct RecordingSender {
    pub failing_recipients: HashSet<String>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(recipient, _)| recipient.clone())
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        _subject: &str,
        html_content: &str,
    ) -> anyhow::Result<String> {
        if self.failing_recipients.contains(recipient.as_ref()) {
            anyhow::bail!("mailbox unavailable");
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((recipient.as_ref().to_string(), html_content.to_string()));
        Ok(format!("email-{}", sent.len()))
    }
}
