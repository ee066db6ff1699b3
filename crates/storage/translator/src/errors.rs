use thiserror::Error;

/// Errors raised by an id translator.
#[derive(Debug, Error)]
pub enum TranslatorError {
    /// No mapping exists for the given external id.
    #[error("no record is mapped to external id {id:?}")]
    UnknownId { id: crate::ExternalId },

    /// Error (de)serializing translator state.
    #[error(transparent)]
    Binary(#[from] binary_helpers::bin_error::BinaryError),
}

pub type TranslatorResult<T> = Result<T, TranslatorError>;
