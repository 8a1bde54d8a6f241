//! Matching Engine Core
//!
//! Per-symbol limit-order matching with strict price-time priority.
//!
//! A submission is dispatched to the engine owning its symbol, which runs
//! the match loop inside an exclusive critical section, then hands the
//! completed batch (trades, book snapshot, BBO change) to the market-data
//! multiplexer after releasing the book lock. Engines for distinct
//! symbols share nothing mutable and match in parallel.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; no pro-rata
//! - Execution price is always the resting maker's price
//! - The book is never left crossed at rest
//! - Deterministic matching (same inputs → same outputs)
//! - Conservation of quantity per order

pub mod book;
pub mod clock;
pub mod config;
pub mod engine;
pub mod matching;
pub mod registry;

pub use config::EngineConfig;
pub use engine::{Submission, SymbolEngine};
pub use registry::EngineRegistry;
