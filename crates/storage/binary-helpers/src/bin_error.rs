use std::array::TryFromSliceError;
use thiserror::Error;

/// Errors raised while reading/writing fixed-width little-endian integers from/to byte slices.
#[derive(Error, Debug)]
pub enum BinaryError {
    /// The requested range does not fit inside the provided slice.
    #[error(
        "attempt to read/write {expected} bytes at offset {from_offset}, but the slice does not contain that range"
    )]
    SliceSizeMismatch { expected: usize, from_offset: usize },
    /// Error converting a slice into a fixed-size array.
    #[error("error converting a slice to a fixed-size array")]
    SliceConversionError(#[from] TryFromSliceError),
}
