//! Pluggable page-placement policies.

/// Scalar best-fit and best-fit-over-tracked-pages variants.
pub mod best_fit;

/// Shared error type.
pub mod errors;

/// Bucket-index arithmetic shared by the histogram-backed next-fit variants.
pub mod histogram;

/// `HybridAONF`: threshold-switched append-only / histogram next-fit.
pub mod hybrid_aonf;

/// `NextFit` and `NextFitWithH`.
pub mod next_fit;

/// `NextFitWithHW`.
pub mod next_fit_with_hw;

/// The shared free-space predicate every variant uses.
pub mod predicate;

/// The stateless and small-state variants: one-record-per-page, first-fit,
/// last-to-first-fit, append-only, append-only-n, LRU.
pub mod simple;

/// The `Strategy` enum tying every variant together.
pub mod strategy;

pub use errors::{StrategyError, StrategyResult};
pub use strategy::Strategy;
