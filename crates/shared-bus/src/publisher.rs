//! # Event Sinks and Subscriptions
//!
//! Services call [`EventSink::emit`] after a transition has committed.
//! Emission never fails the caller: a sink that cannot deliver logs the
//! problem and drops the event.
//!
//! Watchers hold a [`Subscription`] on an [`InMemoryEventBus`]. A watcher
//! that falls more than the channel capacity behind loses the oldest
//! events; [`Subscription::missed`] says how many.

use crate::events::{EventFilter, ExchangeEvent};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Port through which services emit events.
pub trait EventSink: Send + Sync {
    /// Emit an event. Delivery is best effort.
    fn emit(&self, event: ExchangeEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ExchangeEvent) {}
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<ExchangeEvent>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, order_id = ?filter.order_id, "New subscription created");
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
            missed: 0,
        }
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the total number of events published.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for InMemoryEventBus {
    fn emit(&self, event: ExchangeEvent) {
        let name = event.name();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Event published"),
            Err(_) => debug!(event = name, "Event dropped (no receivers)"),
        }
    }
}

/// Sink that forwards every event to several sinks in order.
#[derive(Default, Clone)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOutSink {
    /// Create an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a downstream sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of downstream sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no downstream sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanOutSink {
    fn emit(&self, event: ExchangeEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped and every queued event has been read.
    #[error("Event bus closed")]
    Closed,
}

/// Filtered receiving end of an [`InMemoryEventBus`].
pub struct Subscription {
    receiver: broadcast::Receiver<ExchangeEvent>,
    filter: EventFilter,
    missed: u64,
}

impl Subscription {
    /// Wait for the next event that passes the filter. `None` once the bus
    /// is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<ExchangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => self.record_lag(count),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next queued event that passes the filter, without waiting.
    pub fn try_recv(&mut self) -> Result<Option<ExchangeEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(count)) => self.record_lag(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Events this subscriber lost by falling behind, matching or not.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Filter applied to incoming events.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn record_lag(&mut self, count: u64) {
        self.missed += count;
        warn!(lost = count, total = self.missed, "Subscriber fell behind");
    }
}
