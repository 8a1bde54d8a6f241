//! Engine registry
//!
//! Process-wide map from symbol to matching engine, lazily created on
//! first submission. The map is read-mostly and guarded by an RwLock;
//! each engine sits behind its own mutex, so independent symbols match
//! in parallel while a single symbol stays linearizable. Event
//! publication happens strictly after the engine lock is released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{info, warn};

use market_data::events::Topic;
use market_data::multiplexer::{EventMultiplexer, MultiplexerConfig, MuxStats, Subscription};
use types::book::{Bbo, BookSnapshot};
use types::errors::{EngineError, ValidationError};
use types::ids::{OrderId, Symbol};
use types::order::{Order, OrderRequest};
use types::trade::Trade;

use crate::clock::MonotonicClock;
use crate::config::EngineConfig;
use crate::engine::{Submission, SymbolEngine};

type EngineHandle = Arc<Mutex<SymbolEngine>>;

/// Process-wide dispatch point for submissions, cancels, and reads
pub struct EngineRegistry {
    engines: RwLock<HashMap<String, EngineHandle>>,
    multiplexer: Arc<EventMultiplexer>,
    clock: MonotonicClock,
    config: EngineConfig,
    /// Cleared on shutdown; new submissions are refused afterwards
    accepting: AtomicBool,
}

impl EngineRegistry {
    /// Initialize the registry; ready once the clock is running
    pub fn new(config: EngineConfig) -> Self {
        let multiplexer = Arc::new(EventMultiplexer::new(MultiplexerConfig {
            queue_capacity: config.subscriber_queue_capacity,
        }));
        info!(
            snapshot_depth = config.snapshot_depth,
            recent_trades_capacity = config.recent_trades_capacity,
            "engine registry initialized"
        );
        Self {
            engines: RwLock::new(HashMap::new()),
            multiplexer,
            clock: MonotonicClock::new(),
            config,
            accepting: AtomicBool::new(true),
        }
    }

    /// Readiness: clock and id source initialized, not shut down
    pub fn ready(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Submit an order to the engine owning its symbol
    pub fn submit(&self, request: &OrderRequest) -> Result<Submission, EngineError> {
        if !self.ready() {
            return Err(EngineError::ShuttingDown);
        }
        let symbol = Symbol::try_new(request.symbol.as_str())
            .ok_or(ValidationError::EmptySymbol)
            .map_err(EngineError::Validation)?;

        let timestamp = self.clock.now_nanos();
        let handle = self.engine_for(&symbol);
        let outcome = self.lock_engine(&handle, &symbol)?.submit(request, timestamp);

        match outcome {
            Ok((submission, batch)) => {
                // Engine lock already released: safe to fan out.
                self.multiplexer.publish_batch(batch);
                Ok(submission)
            }
            Err(err) => {
                self.propagate_halt(&handle, &symbol, &err, timestamp);
                Err(err)
            }
        }
    }

    /// Cancel a resting order; false when unknown or not resting
    pub fn cancel(&self, symbol: &str, order_id: &OrderId) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(handle) = self.existing_engine(symbol) else {
            return false;
        };
        let Some(sym) = Symbol::try_new(symbol) else {
            return false;
        };

        let timestamp = self.clock.now_nanos();
        let Ok(mut engine) = self.lock_engine(&handle, &sym) else {
            return false;
        };
        let outcome = engine.cancel(order_id, timestamp);
        drop(engine);

        match outcome {
            Ok(Some(batch)) => {
                self.multiplexer.publish_batch(batch);
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.propagate_halt(&handle, &sym, &err, timestamp);
                false
            }
        }
    }

    /// Depth snapshot; empty for symbols that never traded
    pub fn snapshot(&self, symbol: &str, depth: Option<usize>) -> Option<BookSnapshot> {
        let sym = Symbol::try_new(symbol)?;
        let depth = depth.unwrap_or(self.config.snapshot_depth);
        match self.existing_engine(symbol) {
            Some(handle) => self
                .lock_engine(&handle, &sym)
                .ok()
                .map(|engine| engine.snapshot(depth)),
            None => Some(BookSnapshot::empty(sym)),
        }
    }

    /// Best bid and offer; empty for symbols that never traded
    pub fn bbo(&self, symbol: &str) -> Option<Bbo> {
        let sym = Symbol::try_new(symbol)?;
        match self.existing_engine(symbol) {
            Some(handle) => self.lock_engine(&handle, &sym).ok().map(|e| e.bbo()),
            None => Some(Bbo::empty(sym)),
        }
    }

    /// Most recent trades, newest first
    pub fn recent_trades(&self, symbol: &str, limit: usize) -> Vec<Trade> {
        let Some(sym) = Symbol::try_new(symbol) else {
            return Vec::new();
        };
        match self.existing_engine(symbol) {
            Some(handle) => self
                .lock_engine(&handle, &sym)
                .map(|engine| engine.recent_trades(limit))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Look up a resting order
    pub fn order(&self, symbol: &str, order_id: &OrderId) -> Option<Order> {
        let sym = Symbol::try_new(symbol)?;
        let handle = self.existing_engine(symbol)?;
        self.lock_engine(&handle, &sym)
            .ok()
            .and_then(|engine| engine.resting(order_id))
    }

    /// Subscribe to one of the streaming topics
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.multiplexer.subscribe(topic)
    }

    /// Fan-out counters (published, dropped, disconnected)
    pub fn stream_stats(&self) -> MuxStats {
        self.multiplexer.stats()
    }

    /// Number of materialized symbol engines
    pub fn symbol_count(&self) -> usize {
        self.read_engines().len()
    }

    /// Refuse new submissions and end all subscriber streams
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        self.multiplexer.shutdown();
        info!("engine registry shut down");
    }

    /// Get or lazily create the engine owning a symbol
    fn engine_for(&self, symbol: &Symbol) -> EngineHandle {
        if let Some(handle) = self.read_engines().get(symbol.as_str()) {
            return handle.clone();
        }

        let mut engines = match self.engines.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        engines
            .entry(symbol.as_str().to_string())
            .or_insert_with(|| {
                info!(symbol = %symbol, "creating matching engine");
                Arc::new(Mutex::new(SymbolEngine::new(symbol.clone(), &self.config)))
            })
            .clone()
    }

    /// Existing engine for a symbol; reads never materialize engines
    fn existing_engine(&self, symbol: &str) -> Option<EngineHandle> {
        self.read_engines().get(symbol).cloned()
    }

    fn read_engines(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, EngineHandle>> {
        match self.engines.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Lock one engine; a poisoned mutex means a submission panicked
    /// mid-mutation, so the symbol is treated as quarantined.
    fn lock_engine<'a>(
        &self,
        handle: &'a EngineHandle,
        symbol: &Symbol,
    ) -> Result<MutexGuard<'a, SymbolEngine>, EngineError> {
        handle.lock().map_err(|_| {
            warn!(symbol = %symbol, "engine mutex poisoned, treating symbol as halted");
            EngineError::Halted {
                symbol: symbol.to_string(),
            }
        })
    }

    /// On an invariant violation, emit the terminal event for the symbol
    fn propagate_halt(
        &self,
        handle: &EngineHandle,
        symbol: &Symbol,
        err: &EngineError,
        timestamp: i64,
    ) {
        if let EngineError::Invariant { detail, .. } = err {
            let sequence = handle
                .lock()
                .map(|engine| engine.current_sequence())
                .unwrap_or(0);
            self.multiplexer
                .publish_halt(symbol.clone(), sequence, timestamp, detail.clone());
        }
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
