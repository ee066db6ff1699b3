//! Errors surfaced by the record manager.

use thiserror::Error;

/// Errors raised by [`crate::record_manager::RecordManager`].
///
/// Every kind below maps onto one of the failure modes a caller can act on;
/// `StructuralError` and `OutOfSlotSpace` are fatal for the manager instance
/// and leave it fit only for a read-only view, per the manager's error
/// propagation contract.
#[derive(Debug, Error)]
pub enum RecordManagerError {
    /// `get`/`update`/`remove` with an id that does not resolve to a record.
    #[error("no record exists for the given id")]
    NotFound,

    /// Input exceeds `maxObjectSize` for the manager's page size.
    #[error("record of {actual} bytes exceeds the maximum object size of {max} bytes")]
    RecordTooLarge { actual: usize, max: usize },

    /// An internal invariant was violated: double-insert of a recordNr, a
    /// documented-present slot missing, a two-hop link chain, a strategy
    /// returning a page that doesn't fit, a stale histogram, or a
    /// consistency-check mismatch. The manager instance must be considered
    /// corrupt once this surfaces.
    #[error("record manager invariant violated: {reason}")]
    StructuralError { reason: String },

    /// A page already holds the maximum of 32,767 records.
    #[error("page already holds the maximum of {max} records")]
    OutOfSlotSpace { max: u16 },

    /// The underlying page container failed; surfaced as-is.
    #[error("page container failure: {source}")]
    PersistenceError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type RecordManagerResult<T> = Result<T, RecordManagerError>;

impl From<page::PageError> for RecordManagerError {
    fn from(err: page::PageError) -> Self {
        use page::PageError::*;
        match err {
            RecordNotFound { record_nr } => RecordManagerError::StructuralError {
                reason: format!("no slot for record number {record_nr}"),
            },
            RecordNumberInUse { record_nr } => RecordManagerError::StructuralError {
                reason: format!("record number {record_nr} is already in use"),
            },
            OutOfSlotSpace { max } => RecordManagerError::OutOfSlotSpace { max },
            DoesNotFit { encoded, page_size } => RecordManagerError::StructuralError {
                reason: format!("encoded size {encoded} exceeds page size {page_size}"),
            },
            other => RecordManagerError::PersistenceError {
                source: Box::new(other),
            },
        }
    }
}

impl From<strategy::StrategyError> for RecordManagerError {
    fn from(err: strategy::StrategyError) -> Self {
        match err {
            strategy::StrategyError::StaleHistogram => RecordManagerError::StructuralError {
                reason: "histogram reported a candidate page but none fit".into(),
            },
            other => RecordManagerError::PersistenceError {
                source: Box::new(other),
            },
        }
    }
}

impl From<translator::TranslatorError> for RecordManagerError {
    fn from(err: translator::TranslatorError) -> Self {
        match err {
            translator::TranslatorError::UnknownId { .. } => RecordManagerError::NotFound,
            other => RecordManagerError::PersistenceError {
                source: Box::new(other),
            },
        }
    }
}

impl From<storage_api::StorageError> for RecordManagerError {
    fn from(err: storage_api::StorageError) -> Self {
        RecordManagerError::PersistenceError {
            source: Box::new(err),
        }
    }
}

impl From<binary_helpers::bin_error::BinaryError> for RecordManagerError {
    fn from(err: binary_helpers::bin_error::BinaryError) -> Self {
        RecordManagerError::PersistenceError {
            source: Box::new(err),
        }
    }
}
