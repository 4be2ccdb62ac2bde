//! Live push subscribers and their bounded delivery queues.
//!
//! The registry is plain data; the broker owns it behind its dispatch lock,
//! which is what serializes register, unregister and fan-out.

use std::{collections::HashMap, fmt};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::message::Payload;

/// Opaque handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of delivering one payload to a snapshot of subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Subscribers whose queue accepted the payload.
    pub delivered: usize,
    /// Subscribers whose queue was full; the payload was discarded for them.
    pub dropped: usize,
}

#[derive(Debug)]
pub(crate) struct Registry {
    queues: HashMap<SubscriberId, mpsc::Sender<Payload>>,
    queue_capacity: usize,
    next_id: u64,
}

impl Registry {
    pub(crate) fn new(queue_capacity: usize) -> Self {
        Self {
            queues: HashMap::new(),
            queue_capacity: queue_capacity.max(1),
            next_id: 1,
        }
    }

    pub(crate) fn insert(&mut self) -> (SubscriberId, mpsc::Receiver<Payload>) {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        self.queues.insert(id, sender);
        (id, receiver)
    }

    /// Removes the entry, dropping its sender so the receiver drains what is
    /// already queued and then observes end-of-stream.
    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        self.queues.remove(&id).is_some()
    }

    /// Offers `payload` to every registered queue without waiting on any of
    /// them.
    pub(crate) fn fan_out(&self, payload: &Payload) -> FanOut {
        let mut report = FanOut::default();
        for (id, queue) in &self.queues {
            match queue.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %id, "queue full, dropping payload");
                    report.dropped += 1;
                }
                // Receiver already gone; its owner is about to unregister.
                Err(TrySendError::Closed(_)) => {}
            }
        }
        report
    }

    pub(crate) fn len(&self) -> usize {
        self.queues.len()
    }
}
