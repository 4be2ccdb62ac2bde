use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic identifier assigned at publish time. The first message is `1`,
/// so `0` doubles as "everything retained" for pull readers.
pub type MessageId = u64;

/// Body handed to push subscribers. Shared so a fan-out clones a pointer per
/// subscriber rather than the text itself.
pub type Payload = Arc<str>;

/// A published message as recorded in the history log.
///
/// Serializes to the `{id, text, timestamp}` envelope the HTTP adapters put on
/// the wire, with `timestamp` in RFC3339.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(id: MessageId, text: String) -> Self {
        Self {
            id,
            text,
            timestamp: Utc::now(),
        }
    }

    pub fn payload(&self) -> Payload {
        Arc::from(self.text.as_str())
    }
}
