//! Decides which subscribers are due for their morning digest and delivers it.
//!
//! The same [`DigestScheduler`] backs every entry point: the in-process
//! timer, the manual trigger endpoint and the one-shot job binary.

mod timer;

pub use timer::spawn_digest_timer;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::curation::CurationRules;
use crate::digest::{render_digest_html, DIGEST_SUBJECT};
use crate::domain::article::{ArticleCandidate, DigestItem};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailSender;
use crate::news_client::{NewsProvider, NewsQuery};
use crate::subscriber_store::SubscriberStore;

/// Local wall-clock window in which a subscriber is due, `[start, end)`
/// minutes within `hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryWindow {
    pub hour: u32,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl Default for DeliveryWindow {
    fn default() -> Self {
        DeliveryWindow {
            hour: 7,
            start_minute: 30,
            end_minute: 45,
        }
    }
}

impl DeliveryWindow {
    pub fn contains<T: Timelike>(&self, local_time: &T) -> bool {
        local_time.hour() == self.hour
            && local_time.minute() >= self.start_minute
            && local_time.minute() < self.end_minute
    }

    /// Whether a subscriber in `timezone` is due at `now`. Unknown zones are
    /// never due.
    pub fn is_due(&self, timezone: &str, now: DateTime<Utc>) -> bool {
        local_time(timezone, now)
            .map(|local| self.contains(&local))
            .unwrap_or(false)
    }
}

pub fn local_time(timezone: &str, now: DateTime<Utc>) -> Result<DateTime<Tz>, SchedulerError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| SchedulerError::InvalidTimezone(timezone.to_string()))?;

    Ok(now.with_timezone(&tz))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Timer,
    Manual,
    Job,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerSource::Timer => "timer",
            TriggerSource::Manual => "manual",
            TriggerSource::Job => "job",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    pub trigger: TriggerSource,
    pub evaluated: usize,
    pub invalid_timezone: usize,
    pub due: usize,
    pub already_delivered: usize,
    pub empty: usize,
    pub sent: usize,
    pub failed: usize,
}

impl CycleReport {
    fn new(trigger: TriggerSource) -> CycleReport {
        CycleReport {
            trigger,
            evaluated: 0,
            invalid_timezone: 0,
            due: 0,
            already_delivered: 0,
            empty: 0,
            sent: 0,
            failed: 0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("A digest cycle is already running.")]
    CycleInProgress,
    #[error("{0} is not a supported timezone.")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone)]
pub struct DigestOptions {
    pub window: DeliveryWindow,
    pub max_interests: usize,
    pub page_size: u32,
    pub country: String,
}

impl Default for DigestOptions {
    fn default() -> Self {
        DigestOptions {
            window: DeliveryWindow::default(),
            max_interests: 3,
            page_size: 20,
            country: String::from("us"),
        }
    }
}

impl From<&Settings> for DigestOptions {
    fn from(settings: &Settings) -> Self {
        DigestOptions {
            window: settings.digest.get_delivery_window(),
            max_interests: settings.digest.max_interests_per_digest,
            page_size: settings.news_api.page_size,
            country: settings.news_api.country.clone(),
        }
    }
}

pub struct DigestScheduler {
    store: Arc<dyn SubscriberStore>,
    news_provider: Arc<dyn NewsProvider>,
    email_sender: Arc<dyn EmailSender>,
    rules: CurationRules,
    options: DigestOptions,
    cycle_lock: Mutex<()>,
}

impl DigestScheduler {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        news_provider: Arc<dyn NewsProvider>,
        email_sender: Arc<dyn EmailSender>,
        rules: CurationRules,
        options: DigestOptions,
    ) -> DigestScheduler {
        DigestScheduler {
            store,
            news_provider,
            email_sender,
            rules,
            options,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Runs one delivery cycle at `now`.
    ///
    /// Failures are contained to the unit they happen in: a failed fetch
    /// empties one interest, a failed send skips one subscriber and a failed
    /// store read ends the cycle with nothing processed.
    #[tracing::instrument(name = "Running a digest cycle", skip(self, trigger), fields(trigger = %trigger))]
    pub async fn run_cycle(
        &self,
        now: DateTime<Utc>,
        trigger: TriggerSource,
    ) -> Result<CycleReport, SchedulerError> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| SchedulerError::CycleInProgress)?;
        let mut report = CycleReport::new(trigger);

        let subscribers = match self.store.get_all().await {
            Ok(subscribers) => subscribers,
            Err(err) => {
                tracing::error!("Failed to load subscribers: {:?}", err);
                Vec::new()
            }
        };

        for subscriber in subscribers {
            report.evaluated += 1;

            let local_now = match local_time(&subscriber.timezone, now) {
                Ok(local_now) => local_now,
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", subscriber.email, err);
                    report.invalid_timezone += 1;
                    continue;
                }
            };

            if !self.options.window.contains(&local_now) {
                continue;
            }
            report.due += 1;

            self.deliver(&subscriber, local_now.date_naive(), now, &mut report)
                .await;
        }

        tracing::info!(
            "Digest cycle finished: {} evaluated, {} due, {} sent, {} failed",
            report.evaluated,
            report.due,
            report.sent,
            report.failed
        );

        Ok(report)
    }

    #[tracing::instrument(
        name = "Delivering a digest",
        skip(self, subscriber, now, report),
        fields(subscriber_email = %subscriber.email)
    )]
    async fn deliver(
        &self,
        subscriber: &Subscriber,
        local_date: NaiveDate,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let recipient = match SubscriberEmail::parse(subscriber.email.clone()) {
            Ok(recipient) => recipient,
            Err(err) => {
                tracing::error!("Stored subscriber has an invalid email: {}", err);
                report.failed += 1;
                return;
            }
        };

        match self.store.claim_delivery(&subscriber.email, local_date).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Digest already delivered on {}", local_date);
                report.already_delivered += 1;
                return;
            }
            Err(err) => {
                tracing::error!("Failed to claim the daily delivery: {:?}", err);
                report.failed += 1;
                return;
            }
        }

        let items = self.build_digest(&subscriber.interests, now).await;

        if items.is_empty() {
            tracing::info!("No good news found, nothing to send");
            report.empty += 1;
            return;
        }

        let html_body = render_digest_html(&items);

        match self
            .email_sender
            .send_email(&recipient, DIGEST_SUBJECT, &html_body)
            .await
        {
            Ok(email_id) => {
                tracing::info!("Digest with {} items sent as {}", items.len(), email_id);
                report.sent += 1;
            }
            Err(err) => {
                tracing::error!("Failed to send the digest: {:?}", err);
                report.failed += 1;
            }
        }
    }

    /// Collects digest items for the first few interests of a subscriber.
    pub async fn build_digest(&self, interests: &[String], now: DateTime<Utc>) -> Vec<DigestItem> {
        let mut digest = Vec::new();

        for interest in interests.iter().take(self.options.max_interests) {
            match self.fetch_candidates(interest, now).await {
                Ok(candidates) => digest.extend(self.rules.select_good_news(interest, candidates)),
                Err(err) => {
                    tracing::error!("Failed to fetch news for {}: {:?}", interest, err);
                }
            }
        }

        digest
    }

    async fn fetch_candidates(
        &self,
        interest: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ArticleCandidate>> {
        match NewsQuery::for_interest(interest, now) {
            NewsQuery::TopHeadlines { category } => {
                self.news_provider
                    .fetch_top_headlines(category, self.options.page_size, &self.options.country)
                    .await
            }
            NewsQuery::Everything { query, since } => {
                self.news_provider
                    .fetch_everything(&query, since, self.options.page_size)
                    .await
            }
        }
    }
}
