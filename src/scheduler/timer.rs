use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{DigestScheduler, TriggerSource};

/// Runs a digest cycle every `cadence`, starting immediately.
pub fn spawn_digest_timer(scheduler: Arc<DigestScheduler>, cadence: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        // A cycle that overruns the cadence should not trigger a burst of catch-up ticks
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if let Err(err) = scheduler.run_cycle(Utc::now(), TriggerSource::Timer).await {
                tracing::warn!("Skipping scheduled digest cycle: {}", err);
            }
        }
    })
}
