use std::time::Duration;

use fanout::Broker;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::info;

const NOTICES: [&str; 5] = [
    "System notification: All services operational",
    "Update available: New features deployed",
    "Reminder: Check your notifications",
    "Alert: High activity detected",
    "Info: Database backup completed",
];

/// Publishes the canned notices round-robin, one per `period`, until the
/// returned task is aborted.
pub fn spawn(broker: Broker, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for notice in NOTICES.iter().cycle() {
            ticker.tick().await;
            let message = broker.publish(*notice);
            info!(id = message.id, text = %message.text, "auto-generated message");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn publishes_notices_in_rotation() {
        let broker = Broker::default();
        let task = spawn(broker.clone(), Duration::from_secs(15));

        time::sleep(Duration::from_secs(14)).await;
        assert!(broker.messages().is_empty());

        time::sleep(Duration::from_secs(90)).await;
        let texts: Vec<_> = broker.messages().into_iter().map(|m| m.text).collect();
        task.abort();

        assert_eq!(texts.len(), 6);
        assert_eq!(texts[0], NOTICES[0]);
        assert_eq!(texts[5], NOTICES[0]);
        assert_eq!(texts[4], NOTICES[4]);
    }
}
