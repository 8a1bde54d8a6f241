//! Event multiplexer
//!
//! Fans completed engine batches out to topic subscribers. A single
//! publish path accepts tagged events; subscribers hold bounded queues
//! and a topic filter. Publishing never blocks and never runs inside an
//! engine's critical section: the engine assembles the batch under its
//! book lock, releases it, then hands the batch here.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backpressure::{OfferOutcome, SubscriberQueue};
use crate::events::{EventBatch, MarketEvent, MarketEventPayload, Topic};
use types::ids::Symbol;

/// Default bound for each subscriber queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Multiplexer configuration
#[derive(Debug, Clone)]
pub struct MultiplexerConfig {
    /// Capacity of each subscriber's bounded queue
    pub queue_capacity: usize,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// A live subscription to one topic
///
/// Dropping the subscription cancels it; the multiplexer reclaims the
/// queue on the next publish that touches it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    topic: Topic,
    receiver: mpsc::Receiver<MarketEvent>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Receive the next event; `None` once the stream has ended
    /// (shutdown, or this subscriber was disconnected for lagging).
    pub async fn recv(&mut self) -> Option<MarketEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking receive
    pub fn try_recv(&mut self) -> Option<MarketEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Counters observable via [`EventMultiplexer::stats`]
#[derive(Debug, Default)]
struct MuxCounters {
    events_published: AtomicU64,
    events_dropped: AtomicU64,
    subscribers_disconnected: AtomicU64,
}

/// Point-in-time view of the multiplexer counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxStats {
    pub events_published: u64,
    pub events_dropped: u64,
    pub subscribers_disconnected: u64,
}

/// Fan-out hub for orderbook, trade, and BBO events
pub struct EventMultiplexer {
    subscribers: Mutex<Vec<SubscriberQueue>>,
    next_subscriber_id: AtomicU64,
    queue_capacity: usize,
    closed: AtomicBool,
    counters: MuxCounters,
}

impl EventMultiplexer {
    pub fn new(config: MultiplexerConfig) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
            queue_capacity: config.queue_capacity,
            closed: AtomicBool::new(false),
            counters: MuxCounters::default(),
        }
    }

    /// Subscribe to a topic with a fresh bounded queue
    ///
    /// After shutdown the returned stream ends immediately.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_capacity);

        if !self.closed.load(Ordering::Acquire) {
            let mut subs = self.lock_subscribers();
            subs.push(SubscriberQueue::new(id, topic, sender));
            debug!(subscriber_id = id, topic = %topic, "subscriber registered");
        }
        // When closed, the sender is simply dropped and the stream ends.

        Subscription {
            id,
            topic,
            receiver,
        }
    }

    /// Publish one engine batch in the mandated order:
    /// trades (match order) → orderbook snapshot → BBO change.
    pub fn publish_batch(&self, batch: EventBatch) {
        if self.closed.load(Ordering::Acquire) || batch.is_empty() {
            return;
        }

        let mut subs = self.lock_subscribers();

        for trade in batch.trades {
            let event = MarketEvent::new(
                batch.sequence,
                trade.timestamp,
                batch.symbol.clone(),
                MarketEventPayload::TradeExecuted { trade },
            );
            self.fan_out(&mut subs, &event);
        }

        if let Some(book) = batch.book {
            let event = MarketEvent::new(
                batch.sequence,
                batch.timestamp,
                batch.symbol.clone(),
                MarketEventPayload::BookUpdated { book },
            );
            self.fan_out(&mut subs, &event);
        }

        if let Some(bbo) = batch.bbo {
            let event = MarketEvent::new(
                batch.sequence,
                batch.timestamp,
                batch.symbol,
                MarketEventPayload::BboChanged { bbo },
            );
            self.fan_out(&mut subs, &event);
        }
    }

    /// Publish a terminal halt event to every subscriber of the symbol
    pub fn publish_halt(&self, symbol: Symbol, sequence: u64, timestamp: i64, reason: String) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        warn!(symbol = %symbol, %reason, "publishing terminal halt event");
        let event = MarketEvent::new(
            sequence,
            timestamp,
            symbol,
            MarketEventPayload::SymbolHalted { reason },
        );
        let mut subs = self.lock_subscribers();
        self.fan_out(&mut subs, &event);
    }

    /// Deliver one event to every matching subscriber, removing the ones
    /// that disconnected (lagging trades consumer or dropped receiver).
    fn fan_out(&self, subs: &mut Vec<SubscriberQueue>, event: &MarketEvent) {
        subs.retain_mut(|sub| {
            if !sub.wants(event) {
                return true;
            }
            match sub.offer(event.clone()) {
                OfferOutcome::Delivered => {
                    self.counters.events_published.fetch_add(1, Ordering::Relaxed);
                    true
                }
                OfferOutcome::Dropped => {
                    self.counters.events_dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
                OfferOutcome::Disconnected => {
                    self.counters
                        .subscribers_disconnected
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(
                        subscriber_id = sub.id(),
                        topic = %sub.topic(),
                        "removing subscriber"
                    );
                    false
                }
            }
        });
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        let mut subs = self.lock_subscribers();
        subs.retain(|s| !s.is_closed());
        subs.iter().filter(|s| s.topic() == topic).count()
    }

    /// Current counter values
    pub fn stats(&self) -> MuxStats {
        MuxStats {
            events_published: self.counters.events_published.load(Ordering::Relaxed),
            events_dropped: self.counters.events_dropped.load(Ordering::Relaxed),
            subscribers_disconnected: self
                .counters
                .subscribers_disconnected
                .load(Ordering::Relaxed),
        }
    }

    /// Refuse further publishes and end every subscriber stream
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let mut subs = self.lock_subscribers();
        let drained = subs.len();
        subs.clear();
        info!(subscribers = drained, "event multiplexer shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<SubscriberQueue>> {
        // Subscriber queues hold no invariant that survives a panic; a
        // poisoned lock is safe to re-enter.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventMultiplexer {
    fn default() -> Self {
        Self::new(MultiplexerConfig::default())
    }
}
