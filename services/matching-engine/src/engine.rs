//! Per-symbol matching engine
//!
//! State machine turning an accepted order into a sequence of trades and
//! a resulting order state, under strict price-time priority. All book
//! mutation for one symbol happens here, inside the owner's critical
//! section; the completed event batch is published by the caller after
//! the lock is released.

use serde::Serialize;
use tracing::{debug, error, info};

use market_data::events::EventBatch;
use market_data::trades::TradeHistory;
use types::book::{Bbo, BookSnapshot};
use types::errors::{EngineError, RejectReason, ValidationError};
use types::ids::{OrderId, Symbol};
use types::numeric::Quantity;
use types::order::{Order, OrderRequest, OrderStatus, OrderType, Side};
use types::trade::Trade;

use crate::book::{OrderBook, RestingOrder};
use crate::config::EngineConfig;
use crate::matching::{crossing, MatchExecutor};

/// Result of one submission, returned to the submitter
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub trades: Vec<Trade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,
}

impl Submission {
    fn from_order(order: &Order, trades: Vec<Trade>) -> Self {
        Self {
            order_id: order.order_id,
            status: order.status,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity,
            trades,
            reject_reason: None,
        }
    }
}

/// Matching engine instance owning one symbol's book
///
/// Not internally synchronized: the registry wraps each instance in its
/// own mutex, held for the duration of one submission.
#[derive(Debug)]
pub struct SymbolEngine {
    symbol: Symbol,
    book: OrderBook,
    executor: MatchExecutor,
    /// Per-symbol submission sequence (orders and cancels)
    next_sequence: u64,
    history: TradeHistory,
    last_bbo: Bbo,
    snapshot_depth: usize,
    /// Set when an invariant violation quarantined this symbol
    halted: Option<String>,
}

impl SymbolEngine {
    pub fn new(symbol: Symbol, config: &EngineConfig) -> Self {
        Self {
            book: OrderBook::new(symbol.clone()),
            executor: MatchExecutor::new(symbol.clone()),
            next_sequence: 0,
            history: TradeHistory::new(config.recent_trades_capacity),
            last_bbo: Bbo::empty(symbol.clone()),
            snapshot_depth: config.snapshot_depth,
            halted: None,
            symbol,
        }
    }

    /// Submit an order: validate, accept, match, dispose per type
    ///
    /// Returns the submission result plus the event batch to publish
    /// once this engine's lock has been released.
    pub fn submit(
        &mut self,
        request: &OrderRequest,
        timestamp: i64,
    ) -> Result<(Submission, EventBatch), EngineError> {
        self.check_halted()?;
        validate(request)?;

        // Acceptance: assign id, per-symbol sequence, ingestion time.
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let price = match request.order_type {
            OrderType::Market => None,
            _ => request.price,
        };
        let mut order = Order::new(
            self.symbol.clone(),
            request.side,
            request.order_type,
            request.quantity,
            price,
            sequence,
            timestamp,
        );
        info!(
            symbol = %self.symbol,
            order_id = %order.order_id,
            side = %order.side,
            order_type = %order.order_type,
            quantity = %order.quantity,
            sequence,
            "order accepted"
        );

        // FOK pre-check: strictly non-mutating liquidity simulation.
        if order.order_type == OrderType::Fok {
            let available = self
                .book
                .matchable_quantity(order.side, order.price, order.quantity);
            if available < order.quantity {
                order.status = OrderStatus::Rejected;
                info!(
                    symbol = %self.symbol,
                    order_id = %order.order_id,
                    %available,
                    required = %order.quantity,
                    "fok order rejected, insufficient matchable liquidity"
                );
                let mut submission = Submission::from_order(&order, Vec::new());
                submission.reject_reason = Some(RejectReason::FokUnfillable);
                return Ok((
                    submission,
                    EventBatch::empty(self.symbol.clone(), sequence, timestamp),
                ));
            }
        }

        let trades = self.run_match_loop(&mut order);

        // Dispose of the remainder per order type.
        let mut rested = false;
        if !order.is_filled() {
            match order.order_type {
                OrderType::Limit => {
                    if !order.has_fills() {
                        order.status = OrderStatus::Open;
                    }
                    // Only limit orders carry a price past validation.
                    if let Some(limit) = order.price {
                        self.book.add_resting(
                            order.side,
                            limit,
                            RestingOrder {
                                order_id: order.order_id,
                                sequence: order.sequence,
                                quantity: order.quantity,
                                remaining_quantity: order.remaining_quantity,
                                timestamp: order.timestamp,
                            },
                        );
                        rested = true;
                    }
                }
                OrderType::Market | OrderType::Ioc | OrderType::Fok => {
                    order.status = OrderStatus::Cancelled;
                    info!(
                        symbol = %self.symbol,
                        order_id = %order.order_id,
                        remainder = %order.remaining_quantity,
                        "unfilled remainder cancelled"
                    );
                }
            }
        }

        for trade in &trades {
            self.history.record(trade.clone());
        }

        let mutated = !trades.is_empty() || rested;
        if mutated {
            self.book.set_last_sequence(sequence);
        }
        self.integrity_gate()?;

        let batch = if mutated {
            self.batch(sequence, timestamp, trades.clone())
        } else {
            EventBatch::empty(self.symbol.clone(), sequence, timestamp)
        };

        Ok((Submission::from_order(&order, trades), batch))
    }

    /// Cancel a resting order by id
    ///
    /// Returns the event batch for the mutation, or None when the id is
    /// unknown or no longer resting.
    pub fn cancel(
        &mut self,
        order_id: &OrderId,
        timestamp: i64,
    ) -> Result<Option<EventBatch>, EngineError> {
        self.check_halted()?;

        let Some((side, price, removed)) = self.book.cancel(order_id) else {
            return Ok(None);
        };

        // A cancel is a book mutation: it consumes a sequence number.
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.book.set_last_sequence(sequence);
        info!(
            symbol = %self.symbol,
            %order_id,
            side = %side,
            price = %price,
            remainder = %removed.remaining_quantity,
            "order cancelled"
        );

        self.integrity_gate()?;
        Ok(Some(self.batch(sequence, timestamp, Vec::new())))
    }

    /// Aggregated depth snapshot
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        self.book.snapshot(depth)
    }

    /// Current best bid and offer
    pub fn bbo(&self) -> Bbo {
        self.book.bbo()
    }

    /// Most recent trades, newest first
    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        self.history.recent(limit)
    }

    /// Look up a resting order
    pub fn resting(&self, order_id: &OrderId) -> Option<Order> {
        self.book.resting(order_id)
    }

    /// Last assigned per-symbol submission sequence
    pub fn current_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The match loop: consume the best matchable opposing level first,
    /// level-FIFO within, until the taker is filled or nothing crosses.
    fn run_match_loop(&mut self, order: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        while order.remaining_quantity.is_positive() {
            let Some(best_price) = self.book.opposite_best_price(order.side) else {
                break;
            };
            if !crossing::crosses(order.side, order.price, best_price) {
                break;
            }
            let Some(fill) = self.book.taker_fill(order.side, order.remaining_quantity) else {
                break;
            };

            let trade = self.executor.execute_trade(
                fill.maker_order_id,
                order.order_id,
                order.side,
                fill.price,
                fill.quantity,
                order.timestamp,
            );
            order.add_fill(fill.quantity);
            debug!(
                symbol = %self.symbol,
                trade_id = %trade.trade_id,
                price = %trade.price,
                quantity = %trade.quantity,
                maker_remaining = %fill.maker_remaining,
                "trade executed"
            );
            trades.push(trade);
        }

        trades
    }

    /// Assemble the post-mutation batch: snapshot plus BBO when changed
    fn batch(&mut self, sequence: u64, timestamp: i64, trades: Vec<Trade>) -> EventBatch {
        let book = self.book.snapshot(self.snapshot_depth);
        let bbo = self.book.bbo();
        let bbo_changed = if bbo != self.last_bbo {
            self.last_bbo = bbo.clone();
            Some(bbo)
        } else {
            None
        };
        EventBatch {
            symbol: self.symbol.clone(),
            sequence,
            timestamp,
            trades,
            book: Some(book),
            bbo: bbo_changed,
        }
    }

    fn check_halted(&self) -> Result<(), EngineError> {
        if self.halted.is_some() {
            return Err(EngineError::Halted {
                symbol: self.symbol.to_string(),
            });
        }
        Ok(())
    }

    /// Detect invariant violations and quarantine the symbol
    ///
    /// The crossed-book check is O(1) and runs on every mutation; the
    /// full structural walk runs in debug builds.
    fn integrity_gate(&mut self) -> Result<(), EngineError> {
        let mut detail = None;
        if self.book.is_crossed() {
            detail = Some("book crossed at rest".to_string());
        }
        if detail.is_none() && cfg!(debug_assertions) {
            detail = self.book.check_integrity().err();
        }

        if let Some(detail) = detail {
            error!(symbol = %self.symbol, %detail, "invariant violation, halting symbol");
            self.halted = Some(detail.clone());
            return Err(EngineError::Invariant {
                symbol: self.symbol.to_string(),
                detail,
            });
        }
        Ok(())
    }
}

/// Validate a request before acceptance; no state changes on rejection
fn validate(request: &OrderRequest) -> Result<(), ValidationError> {
    if !request.quantity.is_positive() {
        return Err(ValidationError::NonPositiveQuantity);
    }
    if request.order_type.requires_price() && request.price.is_none() {
        return Err(ValidationError::MissingPrice(request.order_type));
    }
    Ok(())
}
