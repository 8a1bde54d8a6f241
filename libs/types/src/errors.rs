//! Error taxonomy for the matching engine
//!
//! Validation errors surface synchronously in the submission path before
//! any state change; invariant violations quarantine the affected symbol.

use crate::order::OrderType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("symbol {symbol} is halted after an invariant violation")]
    Halted { symbol: String },

    #[error("invariant violation in {symbol}: {detail}")]
    Invariant { symbol: String, detail: String },

    #[error("engine is shutting down")]
    ShuttingDown,
}

/// Request validation errors
///
/// Rejected before the order is accepted: no id, no sequence, no book
/// mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("{0} order requires a price")]
    MissingPrice(OrderType),

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Reason attached to a rejected-but-accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// FOK pre-check found insufficient matchable liquidity
    FokUnfillable,
}
