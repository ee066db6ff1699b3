use thiserror::Error;

/// Maximum number of records (and link records) a single page may hold: `Short.MAX_VALUE` in the
/// Java source this format is modeled on.
pub const MAX_RECORDS_PER_PAGE: u16 = 32_767;

/// Errors raised by the page codec.
///
/// This crate does not try to distinguish "caller handed us a bogus id" from
/// "an internal invariant broke" — that classification depends on *why* the
/// caller expected the record to be there, which only the record manager
/// knows. The record manager maps these onto its own `NotFound` /
/// `StructuralError` / `OutOfSlotSpace` kinds.
#[derive(Debug, Error)]
pub enum PageError {
    /// No slot exists for the given record number.
    #[error("page has no slot for record number {record_nr}")]
    RecordNotFound { record_nr: u16 },

    /// A slot for the given record number already exists.
    #[error("record number {record_nr} is already in use on this page")]
    RecordNumberInUse { record_nr: u16 },

    /// The page already holds the maximum number of slots.
    #[error("page already holds the maximum of {max} records")]
    OutOfSlotSpace { max: u16 },

    /// The encoded page would not fit within `page_size` bytes.
    #[error("encoded page needs {encoded} bytes, but the page is only {page_size} bytes")]
    DoesNotFit { encoded: usize, page_size: usize },

    /// A raw buffer did not have the expected size.
    #[error("buffer has length {actual}, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The buffer's slot table is inconsistent (duplicate record numbers, offsets out of order, …).
    #[error("page slot table is corrupt: {reason}")]
    CorruptSlotTable { reason: String },

    /// Error while interpreting little-endian integers in the buffer.
    #[error(transparent)]
    Binary(#[from] binary_helpers::bin_error::BinaryError),
}

/// Result type used throughout the page codec.
pub type PageResult<T> = Result<T, PageError>;
