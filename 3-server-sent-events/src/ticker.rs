use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use fanout::Broker;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Broadcasts `Tick at <time>` every `period` until the task is aborted.
/// Ticks are push-only and never enter the history log.
pub fn spawn(broker: Broker, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let text = format!(
                "Tick at {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            let report = broker.broadcast(text);
            debug!(delivered = report.delivered, "tick broadcast");
        }
    })
}
