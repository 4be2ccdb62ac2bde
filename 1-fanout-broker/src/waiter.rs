//! Bounded-wait reads for pull transports.
//!
//! A waiter rechecks its query every poll interval until it returns
//! something or the deadline passes. Publishers also ping a [`Notify`], so a
//! waiter usually wakes as soon as new data lands instead of at the next
//! tick. Either way data that is already available is returned without
//! sleeping, and running out the clock yields an empty batch.

use std::time::Duration;

use tokio::{
    select,
    sync::Notify,
    time::{self, Instant},
};

use crate::message::Message;

pub(crate) async fn wait_for<F>(
    query: F,
    published: &Notify,
    interval: Duration,
    timeout: Duration,
) -> Vec<Message>
where
    F: Fn() -> Vec<Message>,
{
    // A timeout too large to represent is a wait without a deadline.
    let deadline = Instant::now().checked_add(timeout);

    loop {
        // Arm the notification before querying so a publish landing between
        // the query and the sleep still wakes us.
        let notified = published.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let messages = query();
        if !messages.is_empty() {
            return messages;
        }

        let nap = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Vec::new();
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        select! {
            _ = &mut notified => {}
            _ = time::sleep(nap) => {}
        }
    }
}
