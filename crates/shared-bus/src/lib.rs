//! # Shared Bus - Exchange Event Distribution
//!
//! Every committed state transition is emitted as an [`ExchangeEvent`]
//! through the [`EventSink`] port. Sinks are composable:
//!
//! ```text
//! ┌──────────────┐   emit()   ┌──────────────┐ ──► InMemoryEventBus ──► subscribers
//! │   Service    │ ─────────► │ FanOutSink   │
//! └──────────────┘            └──────────────┘ ──► JsonLinesEventLog ──► events.jsonl
//! ```
//!
//! Delivery is best effort. A sink failure is logged and never propagates
//! into the operation that produced the event.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod log;
pub mod publisher;

// Re-export main types
pub use events::{EventFilter, EventTopic, ExchangeEvent};
pub use log::{AppendOnlyEventLog, EventLogError, EventRecord, JsonLinesEventLog};
pub use publisher::{
    EventSink, FanOutSink, InMemoryEventBus, NullSink, Subscription, SubscriptionError,
};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
