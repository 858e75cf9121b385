//! Runs a single digest cycle and exits. Meant for an external scheduler
//! (cron, a platform job runner) in deployments with the in-process timer
//! disabled.

use chrono::Utc;
use std::sync::Arc;

use good_news_digest::config::get_configuration;
use good_news_digest::scheduler::TriggerSource;
use good_news_digest::startup::{build_scheduler, get_connection_db_pool};
use good_news_digest::subscriber_store::PgSubscriberStore;
use good_news_digest::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(String::from("digest_job"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration()?;
    let db_pool = get_connection_db_pool(&config.database);
    let scheduler = build_scheduler(&config, Arc::new(PgSubscriberStore::new(db_pool)));

    let report = scheduler.run_cycle(Utc::now(), TriggerSource::Job).await?;

    tracing::info!(
        "Digest job finished: {} sent, {} empty, {} failed",
        report.sent,
        report.empty,
        report.failed
    );

    Ok(())
}
