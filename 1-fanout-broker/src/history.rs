//! Bounded, append-only record of recently published messages.
//!
//! The log always holds a contiguous suffix of everything ever published,
//! oldest first. Once it grows past its capacity the oldest entries are
//! evicted; pull readers asking for an evicted id simply start from the
//! oldest resident message.

use std::collections::VecDeque;

use crate::message::{Message, MessageId};

#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<Message>,
    capacity: usize,
    next_id: MessageId,
}

impl HistoryLog {
    /// Creates an empty log retaining at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Assigns the next id, appends the message and evicts any surplus.
    pub fn append(&mut self, text: String) -> Message {
        let message = Message::new(self.next_id, text);
        self.next_id += 1;

        self.entries.push_back(message.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        message
    }

    /// Returns every resident message with an id greater than `since`, in
    /// ascending id order.
    pub fn since(&self, since: MessageId) -> Vec<Message> {
        // Entries are sorted by id, so the cut point is a binary search.
        let start = self.entries.partition_point(|message| message.id <= since);
        self.entries.range(start..).cloned().collect()
    }

    /// Id of the most recently appended message, or `0` if nothing was
    /// published yet.
    pub fn last_id(&self) -> MessageId {
        self.next_id - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
