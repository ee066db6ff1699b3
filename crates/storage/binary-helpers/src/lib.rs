//! Little-endian binary (de)serialization helpers shared by every on-disk layout in this repository.

/// Errors for binary (de)serialization helpers.
pub mod bin_error;

/// Narrowing conversions between `usize` and fixed-width integers.
pub mod conversions;

/// Little-endian integer reading/writing.
pub mod le;
