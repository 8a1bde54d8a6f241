//! Order book for a single symbol
//!
//! Pairs the two sides with an order-id index for cancellation lookup.
//! All mutation goes through the owning symbol engine; the book is never
//! crossed at rest.

use std::collections::HashMap;

use types::book::{Bbo, BookSnapshot};
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side};

use super::ask_book::AskBook;
use super::bid_book::BidBook;
use super::price_level::RestingOrder;
use super::LevelFill;

/// Central book state for one symbol
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// order_id → owning side and price level, for cancel lookup
    id_index: HashMap<OrderId, (Side, Price)>,
    /// Last per-symbol submission sequence applied to the book
    last_sequence: u64,
}

impl OrderBook {
    /// Create an empty book for the given symbol
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            id_index: HashMap::new(),
            last_sequence: 0,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Rest a limit remainder on its side and index it
    pub fn add_resting(&mut self, side: Side, price: Price, order: RestingOrder) {
        self.id_index.insert(order.order_id, (side, price));
        match side {
            Side::Buy => self.bids.insert(price, order),
            Side::Sell => self.asks.insert(price, order),
        }
    }

    /// Cancel a resting order by id
    ///
    /// Unlinks it from its price level (dropping the level if it
    /// empties) and from the index. Returns None for unknown or
    /// non-resting ids.
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<(Side, Price, RestingOrder)> {
        let (side, price) = self.id_index.remove(order_id)?;
        let removed = match side {
            Side::Buy => self.bids.remove(price, order_id),
            Side::Sell => self.asks.remove(price, order_id),
        }?;
        Some((side, price, removed))
    }

    /// Consume one fill from the best opposing level for a taker
    ///
    /// A fully filled maker is unlinked from the index; an emptied level
    /// is removed by the side book.
    pub fn taker_fill(&mut self, taker_side: Side, max_quantity: Quantity) -> Option<LevelFill> {
        let fill = match taker_side {
            Side::Buy => self.asks.fill_best(max_quantity),
            Side::Sell => self.bids.fill_best(max_quantity),
        }?;
        if fill.maker_remaining.is_zero() {
            self.id_index.remove(&fill.maker_order_id);
        }
        Some(fill)
    }

    /// Best price on the side opposing the taker
    pub fn opposite_best_price(&self, taker_side: Side) -> Option<Price> {
        match taker_side {
            Side::Buy => self.asks.best_price(),
            Side::Sell => self.bids.best_price(),
        }
    }

    /// Matchable liquidity opposing a taker, for the FOK pre-check
    pub fn matchable_quantity(
        &self,
        taker_side: Side,
        limit: Option<Price>,
        required: Quantity,
    ) -> Quantity {
        match taker_side {
            Side::Buy => self.asks.matchable_quantity(limit, required),
            Side::Sell => self.bids.matchable_quantity(limit, required),
        }
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// Current best bid and offer
    pub fn bbo(&self) -> Bbo {
        let bid = self.bids.best();
        let ask = self.asks.best();
        Bbo {
            symbol: self.symbol.clone(),
            best_bid: bid.map(|(p, _)| p),
            best_bid_quantity: bid.map(|(_, q)| q),
            best_ask: ask.map(|(p, _)| p),
            best_ask_quantity: ask.map(|(_, q)| q),
        }
    }

    /// Aggregated depth snapshot, top `depth` levels per side
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.depth(depth),
            asks: self.asks.depth(depth),
            sequence: self.last_sequence,
        }
    }

    /// Whether an order currently rests in this book
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.id_index.contains_key(order_id)
    }

    /// Rebuild the full order view of a resting order
    ///
    /// Only limit remainders rest, so the type is always limit and the
    /// status derives from the fill state.
    pub fn resting(&self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = *self.id_index.get(order_id)?;
        let level = match side {
            Side::Buy => self.bids.level(price),
            Side::Sell => self.asks.level(price),
        }?;
        let entry = level.iter().find(|o| &o.order_id == order_id)?;

        let status = if entry.remaining_quantity < entry.quantity {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        };
        Some(Order {
            order_id: entry.order_id,
            symbol: self.symbol.clone(),
            side,
            order_type: OrderType::Limit,
            quantity: entry.quantity,
            filled_quantity: entry.quantity - entry.remaining_quantity,
            remaining_quantity: entry.remaining_quantity,
            price: Some(price),
            sequence: entry.sequence,
            timestamp: entry.timestamp,
            status,
        })
    }

    /// Number of resting orders across both sides
    pub fn resting_count(&self) -> usize {
        self.id_index.len()
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn set_last_sequence(&mut self, sequence: u64) {
        self.last_sequence = sequence;
    }

    /// O(1) crossed-book detection
    pub fn is_crossed(&self) -> bool {
        match (self.bids.best_price(), self.asks.best_price()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Full structural verification
    ///
    /// Walks every level checking the cached aggregates, queue FIFO
    /// order, and index consistency. O(book); used by the engine's
    /// invariant gate in debug builds and by tests.
    pub fn check_integrity(&self) -> Result<(), String> {
        if self.is_crossed() {
            return Err("book crossed at rest".to_string());
        }

        let mut seen = 0usize;
        for (side, levels) in [
            (Side::Buy, self.bids.iter().collect::<Vec<_>>()),
            (Side::Sell, self.asks.iter().collect::<Vec<_>>()),
        ] {
            for (price, level) in levels {
                if level.is_empty() {
                    return Err(format!("empty level retained at {price}"));
                }
                let mut sum = Quantity::zero();
                let mut last_sequence = 0u64;
                for entry in level.iter() {
                    if !entry.remaining_quantity.is_positive() {
                        return Err(format!(
                            "order {} resting with non-positive remainder",
                            entry.order_id
                        ));
                    }
                    if entry.sequence <= last_sequence {
                        return Err(format!("FIFO order violated at {price}"));
                    }
                    last_sequence = entry.sequence;
                    sum = sum + entry.remaining_quantity;

                    match self.id_index.get(&entry.order_id) {
                        Some((indexed_side, indexed_price))
                            if *indexed_side == side && *indexed_price == *price => {}
                        _ => {
                            return Err(format!("order {} not indexed", entry.order_id));
                        }
                    }
                    seen += 1;
                }
                if sum != level.total_quantity() {
                    return Err(format!(
                        "level aggregate mismatch at {price}: cached {} actual {sum}",
                        level.total_quantity()
                    ));
                }
            }
        }

        if seen != self.id_index.len() {
            return Err(format!(
                "index size {} does not match {} resting orders",
                self.id_index.len(),
                seen
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol() -> Symbol {
        Symbol::new("BTC-USDT")
    }

    fn resting(seq: u64, qty: &str) -> RestingOrder {
        let quantity = Quantity::from_str(qty).unwrap();
        RestingOrder {
            order_id: OrderId::new(),
            sequence: seq,
            quantity,
            remaining_quantity: quantity,
            timestamp: 1_708_123_456_789_000_000,
        }
    }

    #[test]
    fn test_add_and_cancel() {
        let mut book = OrderBook::new(symbol());
        let order = resting(1, "1.0");
        let order_id = order.order_id;
        book.add_resting(Side::Buy, Price::from_u64(100), order);

        assert!(book.contains(&order_id));
        assert_eq!(book.resting_count(), 1);

        let (side, price, removed) = book.cancel(&order_id).unwrap();
        assert_eq!(side, Side::Buy);
        assert_eq!(price, Price::from_u64(100));
        assert_eq!(removed.order_id, order_id);

        assert!(!book.contains(&order_id));
        assert!(book.best_bid().is_none(), "empty level dropped");
        assert!(book.cancel(&order_id).is_none());
    }

    #[test]
    fn test_bbo_reflects_both_sides() {
        let mut book = OrderBook::new(symbol());
        book.add_resting(Side::Buy, Price::from_u64(100), resting(1, "0.6"));
        book.add_resting(Side::Sell, Price::from_u64(102), resting(2, "1.2"));

        let bbo = book.bbo();
        assert_eq!(bbo.best_bid, Some(Price::from_u64(100)));
        assert_eq!(bbo.best_bid_quantity, Some(Quantity::from_str("0.6").unwrap()));
        assert_eq!(bbo.best_ask, Some(Price::from_u64(102)));
        assert!(!bbo.is_crossed());
    }

    #[test]
    fn test_taker_fill_unindexes_filled_maker() {
        let mut book = OrderBook::new(symbol());
        let maker = resting(1, "1.0");
        let maker_id = maker.order_id;
        book.add_resting(Side::Sell, Price::from_u64(101), maker);

        // Partial fill keeps the maker indexed
        let fill = book
            .taker_fill(Side::Buy, Quantity::from_str("0.4").unwrap())
            .unwrap();
        assert_eq!(fill.price, Price::from_u64(101));
        assert!(book.contains(&maker_id));

        // Exhausting fill unlinks it
        let fill = book
            .taker_fill(Side::Buy, Quantity::from_str("0.6").unwrap())
            .unwrap();
        assert!(fill.maker_remaining.is_zero());
        assert!(!book.contains(&maker_id));
        assert!(book.taker_fill(Side::Buy, Quantity::from_u64(1)).is_none());
    }

    #[test]
    fn test_snapshot_shape() {
        let mut book = OrderBook::new(symbol());
        book.add_resting(Side::Buy, Price::from_u64(101), resting(1, "0.5"));
        book.add_resting(Side::Buy, Price::from_u64(100), resting(2, "0.6"));
        book.add_resting(Side::Sell, Price::from_u64(103), resting(3, "1.0"));
        book.set_last_sequence(3);

        let snap = book.snapshot(10);
        assert_eq!(snap.sequence, 3);
        // Bids descending, asks ascending
        assert_eq!(snap.bids[0].0, Price::from_u64(101));
        assert_eq!(snap.bids[1].0, Price::from_u64(100));
        assert_eq!(snap.asks[0].0, Price::from_u64(103));
    }

    #[test]
    fn test_resting_lookup_rebuilds_order() {
        let mut book = OrderBook::new(symbol());
        let entry = resting(7, "2.0");
        let order_id = entry.order_id;
        book.add_resting(Side::Sell, Price::from_u64(105), entry);

        let order = book.resting(&order_id).unwrap();
        assert_eq!(order.order_id, order_id);
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.sequence, 7);
        assert!(order.check_invariant());

        // Partially fill it and look again
        book.taker_fill(Side::Buy, Quantity::from_str("0.5").unwrap());
        let order = book.resting(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_quantity, Quantity::from_str("0.5").unwrap());
        assert_eq!(order.remaining_quantity, Quantity::from_str("1.5").unwrap());
    }

    #[test]
    fn test_check_integrity_clean_book() {
        let mut book = OrderBook::new(symbol());
        book.add_resting(Side::Buy, Price::from_u64(100), resting(1, "1.0"));
        book.add_resting(Side::Buy, Price::from_u64(100), resting(2, "2.0"));
        book.add_resting(Side::Sell, Price::from_u64(101), resting(3, "1.5"));

        assert!(book.check_integrity().is_ok());
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_check_integrity_detects_crossed_book() {
        let mut book = OrderBook::new(symbol());
        book.add_resting(Side::Buy, Price::from_u64(102), resting(1, "1.0"));
        book.add_resting(Side::Sell, Price::from_u64(101), resting(2, "1.0"));

        assert!(book.is_crossed());
        assert!(book.check_integrity().is_err());
    }
}
