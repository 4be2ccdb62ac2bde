use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info};

use crate::{
    config::BrokerConfig,
    history::HistoryLog,
    message::{Message, MessageId, Payload},
    registry::{FanOut, Registry, SubscriberId},
    waiter,
};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// In-process fan-out broker shared by every transport adapter.
///
/// Cloning is cheap and every clone talks to the same state. Pull adapters
/// read the history log through [`Broker::query_since`] and
/// [`Broker::wait`]; push adapters call [`Broker::register`] once per
/// connection and drain the returned [`Subscription`].
#[derive(Clone)]
pub struct Broker {
    shared: Arc<Shared>,
}

struct Shared {
    // Dispatch lock: register, unregister and fan-out all go through it, and
    // publish holds it across the history append so queued ids stay ordered.
    registry: Mutex<Registry>,
    history: RwLock<HistoryLog>,
    published: Notify,
    dropped: AtomicU64,
    poll_interval: Duration,
}

/// Point-in-time counters for health and diagnostics output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    pub subscribers: usize,
    pub resident_messages: usize,
    pub last_id: MessageId,
    /// Payloads discarded so far because a subscriber queue was full.
    pub dropped: u64,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        // A zero interval would turn every wait into a busy loop.
        let poll_interval = config.poll_interval.max(MIN_POLL_INTERVAL);
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::new(config.queue_capacity)),
                history: RwLock::new(HistoryLog::new(config.history_capacity)),
                published: Notify::new(),
                dropped: AtomicU64::new(0),
                poll_interval,
            }),
        }
    }

    /// Records `text` in the history log and offers it to every current
    /// subscriber.
    pub fn publish(&self, text: impl Into<String>) -> Message {
        let (message, report) = {
            let registry = self.registry();
            let message = self
                .shared
                .history
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .append(text.into());
            let report = registry.fan_out(&message.payload());
            (message, report)
        };

        self.shared.published.notify_waiters();
        self.record(report);
        debug!(id = message.id, delivered = report.delivered, "message published");
        message
    }

    /// Offers `payload` to the subscribers registered right now without
    /// touching the history log. Never blocks on a slow subscriber.
    pub fn broadcast(&self, payload: impl Into<Payload>) -> FanOut {
        let payload = payload.into();
        let report = self.registry().fan_out(&payload);
        self.record(report);
        report
    }

    /// Every resident message newer than `since`, oldest first.
    pub fn query_since(&self, since: MessageId) -> Vec<Message> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .since(since)
    }

    /// The whole retained history.
    pub fn messages(&self) -> Vec<Message> {
        self.query_since(0)
    }

    /// Like [`Broker::query_since`], but when nothing newer is resident waits
    /// up to `timeout` for a publish. An empty result means the wait timed out.
    pub async fn wait(&self, since: MessageId, timeout: Duration) -> Vec<Message> {
        waiter::wait_for(
            || self.query_since(since),
            &self.shared.published,
            self.shared.poll_interval,
            timeout,
        )
        .await
    }

    /// Adds a push subscriber with a fresh bounded queue.
    pub fn register(&self) -> Subscription {
        let (id, receiver, total) = {
            let mut registry = self.registry();
            let (id, receiver) = registry.insert();
            (id, receiver, registry.len())
        };

        info!(subscriber = %id, total, "subscriber registered");
        Subscription {
            id,
            receiver,
            broker: self.clone(),
        }
    }

    /// Removes a subscriber. Unknown or already removed handles are ignored;
    /// the return value says whether anything was removed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, total) = {
            let mut registry = self.registry();
            let removed = registry.remove(id);
            (removed, registry.len())
        };

        if removed {
            info!(subscriber = %id, total, "subscriber unregistered");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    pub fn stats(&self) -> BrokerStats {
        let subscribers = self.subscriber_count();
        let history = self
            .shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        BrokerStats {
            subscribers,
            resident_messages: history.len(),
            last_id: history.last_id(),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, report: FanOut) {
        if report.dropped > 0 {
            self.shared
                .dropped
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

/// A registered push subscriber.
///
/// Yields payloads in the order they were queued and ends once the
/// subscriber is unregistered. Dropping it unregisters, so an adapter that
/// bails out early still releases its registry entry.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Payload>,
    broker: Broker,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next queued payload, or `None` after the subscriber was unregistered
    /// and its queue drained.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`]; `None` when the queue
    /// is currently empty or closed.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.receiver.try_recv().ok()
    }

    pub fn unregister(&self) -> bool {
        self.broker.unregister(self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.unregister(self.id);
    }
}
