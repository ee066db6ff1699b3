use thiserror::Error;

/// Errors raised by a placement strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A histogram-backed strategy's scan found no page, despite the
    /// histogram reporting a populated bucket — the histogram is stale.
    #[error("histogram reported a candidate bucket but the scan found no matching page")]
    StaleHistogram,

    /// Error (de)serializing strategy state.
    #[error(transparent)]
    Binary(#[from] binary_helpers::bin_error::BinaryError),
}

pub type StrategyResult<T> = Result<T, StrategyError>;
