//! End-to-end matching scenarios against the registry
//!
//! Exercises the full path: dispatch, match loop, order-type disposal,
//! cancellation, event fan-out, and the cross-submission invariants
//! (no crossed book, conservation, price-time priority, FIFO).

use matching_engine::{EngineConfig, EngineRegistry};

use market_data::events::{MarketEventPayload, Topic};
use types::numeric::{Price, Quantity};
use types::order::{OrderRequest, OrderStatus, OrderType, Side};

fn qty(s: &str) -> Quantity {
    Quantity::from_str(s).unwrap()
}

fn px(s: &str) -> Price {
    Price::from_str(s).unwrap()
}

fn limit(symbol: &str, side: Side, quantity: &str, price: &str) -> OrderRequest {
    OrderRequest::limit(symbol, side, qty(quantity), px(price))
}

fn market(symbol: &str, side: Side, quantity: &str) -> OrderRequest {
    OrderRequest::market(symbol, side, qty(quantity))
}

fn request(
    symbol: &str,
    side: Side,
    order_type: OrderType,
    quantity: &str,
    price: &str,
) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        side,
        order_type,
        quantity: qty(quantity),
        price: Some(px(price)),
    }
}

/// S1: a limit order on an empty book rests untouched.
#[test]
fn s1_resting_limit() {
    let registry = EngineRegistry::default();

    let result = registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "100"))
        .unwrap();

    assert_eq!(result.status, OrderStatus::Open);
    assert!(result.filled_quantity.is_zero());
    assert_eq!(result.remaining_quantity, qty("1.0"));
    assert!(result.trades.is_empty());

    let snap = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(snap.bids, vec![(px("100"), qty("1.0"))]);
    assert!(snap.asks.is_empty());
}

/// S2: a crossing sell partially fills the resting bid at the bid's price.
#[test]
fn s2_cross_partial_maker_fill() {
    let registry = EngineRegistry::default();
    registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "100"))
        .unwrap();

    let result = registry
        .submit(&limit("BTC-USDT", Side::Sell, "0.4", "99"))
        .unwrap();

    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.price, px("100"), "execution at the maker's price");
    assert_eq!(trade.quantity, qty("0.4"));
    assert_eq!(trade.aggressor_side, Side::Sell);

    let snap = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(snap.bids, vec![(px("100"), qty("0.6"))]);
    assert!(snap.asks.is_empty());
}

/// S3 and S4: market sweep, then IOC with a limit the deeper level
/// cannot satisfy.
#[test]
fn s3_s4_market_sweep_then_ioc() {
    let registry = EngineRegistry::default();
    registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "100"))
        .unwrap();
    registry
        .submit(&limit("BTC-USDT", Side::Sell, "0.4", "99"))
        .unwrap();

    // S3: buy limit 2.0 @ 101 rests (asks empty)...
    let rested = registry
        .submit(&limit("BTC-USDT", Side::Buy, "2.0", "101"))
        .unwrap();
    assert_eq!(rested.status, OrderStatus::Open);

    // ...then a market sell 1.5 sweeps the best bid only.
    let swept = registry.submit(&market("BTC-USDT", Side::Sell, "1.5")).unwrap();
    assert_eq!(swept.status, OrderStatus::Filled);
    assert_eq!(swept.trades.len(), 1);
    assert_eq!(swept.trades[0].price, px("101"));
    assert_eq!(swept.trades[0].quantity, qty("1.5"));

    let snap = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(
        snap.bids,
        vec![(px("101"), qty("0.5")), (px("100"), qty("0.6"))]
    );

    // S4: sell IOC 1.0 @ 100.5 fills 0.5 at 101; the 100 level does not
    // satisfy the limit, so the remainder is cancelled.
    let ioc = registry
        .submit(&request("BTC-USDT", Side::Sell, OrderType::Ioc, "1.0", "100.5"))
        .unwrap();
    assert_eq!(ioc.status, OrderStatus::Cancelled);
    assert_eq!(ioc.filled_quantity, qty("0.5"));
    assert_eq!(ioc.remaining_quantity, qty("0.5"));
    assert_eq!(ioc.trades.len(), 1);
    assert_eq!(ioc.trades[0].price, px("101"));
    assert_eq!(ioc.trades[0].quantity, qty("0.5"));

    let snap = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(snap.bids, vec![(px("100"), qty("0.6"))]);
}

/// S5: FOK with insufficient liquidity is rejected with zero trades and
/// an untouched book.
#[test]
fn s5_fok_insufficient() {
    let registry = EngineRegistry::default();
    registry
        .submit(&limit("BTC-USDT", Side::Buy, "0.6", "100"))
        .unwrap();
    let before = registry.snapshot("BTC-USDT", None).unwrap();

    let result = registry
        .submit(&request("BTC-USDT", Side::Sell, OrderType::Fok, "1.0", "100"))
        .unwrap();

    assert_eq!(result.status, OrderStatus::Rejected);
    assert!(result.trades.is_empty());
    assert!(result.filled_quantity.is_zero());
    let reject = serde_json::to_value(&result).unwrap();
    assert_eq!(reject["reject_reason"], "fok_unfillable");

    let after = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(before.bids, after.bids);
    assert_eq!(before.asks, after.asks);
    assert_eq!(before.sequence, after.sequence, "book untouched");
}

/// S6: FIFO at one price level.
#[test]
fn s6_fifo_at_price() {
    let registry = EngineRegistry::default();
    let first = registry
        .submit(&limit("BTC-USDT", Side::Buy, "1", "100"))
        .unwrap();
    let second = registry
        .submit(&limit("BTC-USDT", Side::Buy, "2", "100"))
        .unwrap();
    let third = registry
        .submit(&limit("BTC-USDT", Side::Buy, "3", "100"))
        .unwrap();

    let result = registry.submit(&market("BTC-USDT", Side::Sell, "2.5")).unwrap();

    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].quantity, qty("1"));
    assert_eq!(result.trades[0].maker_order_id, first.order_id);
    assert_eq!(result.trades[1].quantity, qty("1.5"));
    assert_eq!(result.trades[1].maker_order_id, second.order_id);

    // Survivors: 0.5 of the second order, all of the third, in FIFO order
    let snap = registry.snapshot("BTC-USDT", None).unwrap();
    assert_eq!(snap.bids, vec![(px("100"), qty("3.5"))]);

    let second_view = registry.order("BTC-USDT", &second.order_id).unwrap();
    assert_eq!(second_view.status, OrderStatus::PartiallyFilled);
    assert_eq!(second_view.remaining_quantity, qty("0.5"));
    let third_view = registry.order("BTC-USDT", &third.order_id).unwrap();
    assert_eq!(third_view.status, OrderStatus::Open);
    assert!(registry.order("BTC-USDT", &first.order_id).is_none());
}

/// Conservation: original quantity always equals remaining plus the sum
/// of fills, across every order type.
#[test]
fn conservation_across_order_types() {
    let registry = EngineRegistry::default();
    registry
        .submit(&limit("BTC-USDT", Side::Sell, "0.7", "101"))
        .unwrap();
    registry
        .submit(&limit("BTC-USDT", Side::Sell, "0.9", "102"))
        .unwrap();

    for req in [
        limit("BTC-USDT", Side::Buy, "1.0", "101"),
        market("BTC-USDT", Side::Buy, "0.3"),
        request("BTC-USDT", Side::Buy, OrderType::Ioc, "2.0", "102"),
    ] {
        let result = registry.submit(&req).unwrap();
        let filled: Quantity = result
            .trades
            .iter()
            .fold(Quantity::zero(), |acc, t| acc + t.quantity);
        assert_eq!(filled, result.filled_quantity);
        assert_eq!(
            filled + result.remaining_quantity,
            req.quantity,
            "conservation violated for {:?}",
            req.order_type
        );
        for trade in &result.trades {
            assert_eq!(trade.taker_order_id, result.order_id);
        }
    }
}

/// The book is never crossed at rest, whatever sequence of limit orders
/// arrives.
#[test]
fn no_crossed_book_after_any_submission() {
    let registry = EngineRegistry::default();
    let submissions = [
        (Side::Buy, "1.0", "100"),
        (Side::Sell, "0.5", "99"),
        (Side::Sell, "2.0", "101"),
        (Side::Buy, "1.5", "101"),
        (Side::Buy, "0.3", "98"),
        (Side::Sell, "0.2", "97"),
    ];

    for (side, quantity, price) in submissions {
        registry
            .submit(&limit("BTC-USDT", side, quantity, price))
            .unwrap();
        let bbo = registry.bbo("BTC-USDT").unwrap();
        assert!(!bbo.is_crossed(), "book crossed after {side} {quantity}@{price}");
    }
}

/// Recent trades are served newest first and bounded by the ring.
#[test]
fn recent_trades_newest_first() {
    let registry = EngineRegistry::new(EngineConfig {
        recent_trades_capacity: 2,
        ..EngineConfig::default()
    });

    for _ in 0..3 {
        registry
            .submit(&limit("BTC-USDT", Side::Sell, "0.1", "100"))
            .unwrap();
        registry
            .submit(&limit("BTC-USDT", Side::Buy, "0.1", "100"))
            .unwrap();
    }

    let trades = registry.recent_trades("BTC-USDT", 10);
    assert_eq!(trades.len(), 2, "ring capacity bounds history");
    assert!(trades[0].sequence > trades[1].sequence, "newest first");
    assert_eq!(registry.recent_trades("BTC-USDT", 1).len(), 1);
}

/// Stream contract: per submission, trades precede the orderbook update,
/// which precedes the BBO update; BBO events only fire on change.
#[tokio::test]
async fn stream_ordering_per_submission() {
    let registry = EngineRegistry::default();
    let mut trades = registry.subscribe(Topic::Trades);
    let mut books = registry.subscribe(Topic::Orderbook);
    let mut bbos = registry.subscribe(Topic::Bbo);

    // Submission 1: rests, sets the BBO.
    registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "100"))
        .unwrap();
    // Submission 2: deeper bid, book update but no BBO change.
    registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "99"))
        .unwrap();
    // Submission 3: crossing sell, trade + book + BBO change.
    registry
        .submit(&limit("BTC-USDT", Side::Sell, "0.4", "99"))
        .unwrap();

    // Trades topic: exactly one event, from submission 3.
    let trade_event = trades.recv().await.unwrap();
    assert_eq!(trade_event.sequence, 3);
    let MarketEventPayload::TradeExecuted { trade } = &trade_event.payload else {
        panic!("expected a trade event");
    };
    assert_eq!(trade.price, px("100"), "executes at the best bid's price");

    // Orderbook topic: one snapshot per mutation, sequence-ordered.
    for expected_seq in 1..=3u64 {
        let event = books.recv().await.unwrap();
        assert_eq!(event.sequence, expected_seq);
        assert!(matches!(event.payload, MarketEventPayload::BookUpdated { .. }));
    }

    // BBO topic: submissions 1 and 3 changed the tuple; 2 did not.
    let first = bbos.recv().await.unwrap();
    assert_eq!(first.sequence, 1);
    let second = bbos.recv().await.unwrap();
    assert_eq!(second.sequence, 3, "unchanged BBO was not re-emitted");

    // Trade events for a submission carry its sequence, and the book
    // event for that submission was published after the trade.
    assert_eq!(trade_event.sequence, 3);

    registry.shutdown();
    assert!(bbos.recv().await.is_none());
}

/// Independent symbols match in parallel without interference.
#[test]
fn parallel_symbols() {
    use std::sync::Arc;
    use std::thread;

    let registry = Arc::new(EngineRegistry::default());
    let symbols = ["BTC-USDT", "ETH-USDC", "SOL-USDT", "DOGE-USDT"];

    let mut handles = Vec::new();
    for symbol in symbols {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                registry
                    .submit(&limit(symbol, Side::Buy, "1.0", "100"))
                    .unwrap();
                let result = registry
                    .submit(&limit(symbol, Side::Sell, "1.0", "100"))
                    .unwrap();
                assert_eq!(result.status, OrderStatus::Filled, "iteration {i}");
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for symbol in symbols {
        let snap = registry.snapshot(symbol, None).unwrap();
        assert!(snap.bids.is_empty() && snap.asks.is_empty());
        // 100 submissions per symbol, each pair fully matched
        assert_eq!(snap.sequence, 100);
        let trades = registry.recent_trades(symbol, 200);
        assert_eq!(trades.len(), 50);
    }
}

/// Cancel read path: found/not_found and stream publication.
#[tokio::test]
async fn cancel_publishes_book_update() {
    let registry = EngineRegistry::default();
    let mut books = registry.subscribe(Topic::Orderbook);

    let result = registry
        .submit(&limit("BTC-USDT", Side::Buy, "1.0", "100"))
        .unwrap();
    assert!(registry.cancel("BTC-USDT", &result.order_id));

    let placed = books.recv().await.unwrap();
    assert_eq!(placed.sequence, 1);
    let cancelled = books.recv().await.unwrap();
    assert_eq!(cancelled.sequence, 2, "cancel consumed a sequence");
    let MarketEventPayload::BookUpdated { book } = cancelled.payload else {
        panic!("expected a book update");
    };
    assert!(book.bids.is_empty());
}
