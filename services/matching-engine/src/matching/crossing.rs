//! Crossing detection
//!
//! Determines whether an incoming order can match a resting level.

use types::numeric::Price;
use types::order::Side;

/// Check if a taker crosses a resting level
///
/// For a buy with limit L, a level at price P is matchable iff P <= L;
/// for a sell, iff P >= L. A market order (no limit) matches any level.
pub fn crosses(taker_side: Side, taker_limit: Option<Price>, level_price: Price) -> bool {
    match (taker_side, taker_limit) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => level_price <= limit,
        (Side::Sell, Some(limit)) => level_price >= limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_crosses_at_or_below_limit() {
        let limit = Some(Price::from_u64(100));
        assert!(crosses(Side::Buy, limit, Price::from_u64(99)));
        assert!(crosses(Side::Buy, limit, Price::from_u64(100)));
        assert!(!crosses(Side::Buy, limit, Price::from_u64(101)));
    }

    #[test]
    fn test_sell_crosses_at_or_above_limit() {
        let limit = Some(Price::from_u64(100));
        assert!(crosses(Side::Sell, limit, Price::from_u64(101)));
        assert!(crosses(Side::Sell, limit, Price::from_u64(100)));
        assert!(!crosses(Side::Sell, limit, Price::from_u64(99)));
    }

    #[test]
    fn test_market_crosses_everything() {
        assert!(crosses(Side::Buy, None, Price::from_u64(1)));
        assert!(crosses(Side::Sell, None, Price::from_u64(1_000_000)));
    }
}
