//! In-process message fan-out shared by the delivery demos.
//!
//! Producers [`Broker::publish`] text; the broker assigns an id, records it in
//! a bounded history log and offers it to every registered push subscriber.
//! The crate is split by responsibility:
//!
//! - [`history`] keeps the last N messages for pull readers.
//! - [`registry`] tracks push subscribers and their bounded queues, dropping
//!   payloads for a subscriber whose queue is full.
//! - `waiter` implements the bounded wait behind long polling.
//! - [`broker`] ties the three together behind one dispatch lock.
//! - [`config`] and [`telemetry`] hold the knobs and logging setup the server
//!   binaries share; [`serve`] is their accept loop, with optional TLS.

pub mod broker;
pub mod config;
pub mod history;
pub mod message;
pub mod registry;
pub mod serve;
pub mod telemetry;
mod waiter;

pub use broker::{Broker, BrokerStats, Subscription};
pub use config::{BrokerArgs, BrokerConfig};
pub use message::{Message, MessageId, Payload};
pub use registry::{FanOut, SubscriberId};
pub use serve::{Protocols, TlsArgs, TlsInfo};
