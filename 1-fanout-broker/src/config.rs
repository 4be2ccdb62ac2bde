use std::time::Duration;

use clap::Args;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sizing knobs for a [`Broker`](crate::Broker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Messages retained for pull readers.
    pub history_capacity: usize,
    /// Payloads buffered per push subscriber before new ones are dropped.
    pub queue_capacity: usize,
    /// How often a long-poll waiter rechecks the history log.
    pub poll_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Command-line flags shared by every broker-backed server.
#[derive(Args, Debug, Clone)]
pub struct BrokerArgs {
    /// Number of published messages kept for polling clients.
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Per-subscriber queue size; payloads beyond it are dropped for that subscriber.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Long-poll recheck interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub poll_interval_ms: u64,
}

impl From<&BrokerArgs> for BrokerConfig {
    fn from(args: &BrokerArgs) -> Self {
        Self {
            history_capacity: args.history_capacity,
            queue_capacity: args.queue_capacity,
            poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
        }
    }
}
