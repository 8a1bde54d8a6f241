//! Backpressure for subscriber streams
//!
//! Each subscriber owns a bounded queue; the publish side never blocks.
//! On overflow the policy depends on the topic: order book and BBO
//! snapshots are coalescible (the next snapshot supersedes the dropped
//! one), so the newest event is dropped; a dropped trade can never be
//! reconstructed from later events, so the trades topic disconnects the
//! lagging subscriber instead.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::events::{MarketEvent, Topic};

/// Policy applied when a subscriber's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the event being published; the subscriber keeps its queue
    DropNewest,
    /// Disconnect the subscriber; never drop silently
    Disconnect,
}

impl OverflowPolicy {
    /// The policy mandated for a topic
    pub fn for_topic(topic: Topic) -> Self {
        match topic {
            Topic::Orderbook | Topic::Bbo => OverflowPolicy::DropNewest,
            Topic::Trades => OverflowPolicy::Disconnect,
        }
    }
}

/// Outcome of offering one event to one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Event enqueued
    Delivered,
    /// Queue full; event dropped under `DropNewest`
    Dropped,
    /// Subscriber must be removed (overflow under `Disconnect`, or the
    /// receiver side is gone)
    Disconnected,
}

/// One subscriber's bounded outbound queue with its topic filter
#[derive(Debug)]
pub struct SubscriberQueue {
    id: u64,
    topic: Topic,
    sender: mpsc::Sender<MarketEvent>,
    policy: OverflowPolicy,
    events_dropped: u64,
}

impl SubscriberQueue {
    pub fn new(id: u64, topic: Topic, sender: mpsc::Sender<MarketEvent>) -> Self {
        Self {
            id,
            topic,
            sender,
            policy: OverflowPolicy::for_topic(topic),
            events_dropped: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Whether this subscriber's topic filter accepts the event
    pub fn wants(&self, event: &MarketEvent) -> bool {
        match event.topic() {
            Some(topic) => topic == self.topic,
            None => true,
        }
    }

    /// Offer an event without blocking
    pub fn offer(&mut self, event: MarketEvent) -> OfferOutcome {
        match self.sender.try_send(event) {
            Ok(()) => OfferOutcome::Delivered,
            Err(TrySendError::Full(_)) => match self.policy {
                OverflowPolicy::DropNewest => {
                    self.events_dropped += 1;
                    debug!(
                        subscriber_id = self.id,
                        topic = %self.topic,
                        total_dropped = self.events_dropped,
                        "subscriber queue full, dropping newest event"
                    );
                    OfferOutcome::Dropped
                }
                OverflowPolicy::Disconnect => {
                    warn!(
                        subscriber_id = self.id,
                        topic = %self.topic,
                        "subscriber queue full on non-droppable topic, disconnecting"
                    );
                    OfferOutcome::Disconnected
                }
            },
            Err(TrySendError::Closed(_)) => OfferOutcome::Disconnected,
        }
    }

    /// Events dropped for this subscriber so far
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped
    }

    /// Whether the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
