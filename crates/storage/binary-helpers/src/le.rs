use crate::bin_error::BinaryError;

/// A trait for types that can be serialized and deserialized in little-endian format.
/// Implemented for `u16`, `u32`, and `u64`.
pub trait LittleEndianInteger: Sized + Copy {
    /// The size of the type in bytes.
    const SIZE: usize;

    /// Converts a slice of bytes in little-endian format to the target integer type.
    fn from_le(source_bytes: &[u8]) -> Result<Self, BinaryError>;

    /// Serializes the integer into a slice of bytes in little-endian format.
    fn to_le(self, target_buffer: &mut [u8]) -> Result<(), BinaryError>;
}

macro_rules! impl_little_endian_integer {
    ($t:ty) => {
        impl LittleEndianInteger for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            fn from_le(source_bytes: &[u8]) -> Result<Self, BinaryError> {
                if source_bytes.len() != Self::SIZE {
                    return Err(BinaryError::SliceSizeMismatch {
                        from_offset: 0usize,
                        expected: Self::SIZE,
                    });
                }

                Ok(<$t>::from_le_bytes(source_bytes.try_into()?))
            }

            fn to_le(self, target_buffer: &mut [u8]) -> Result<(), BinaryError> {
                let self_bytes = &self.to_le_bytes();

                if self_bytes.len() != target_buffer.len() {
                    return Err(BinaryError::SliceSizeMismatch {
                        from_offset: 0usize,
                        expected: self_bytes.len(),
                    });
                }

                target_buffer.copy_from_slice(self_bytes);
                Ok(())
            }
        }
    };
}

impl_little_endian_integer!(u16);
impl_little_endian_integer!(u32);
impl_little_endian_integer!(u64);

/// Reads a value of type `T` from a byte slice in little-endian format.
pub fn read_le<T: LittleEndianInteger>(
    bytes: &[u8],
    start_offset: usize,
) -> Result<T, BinaryError> {
    let Some(slice) = bytes.get(start_offset..start_offset + T::SIZE) else {
        return Err(BinaryError::SliceSizeMismatch {
            expected: T::SIZE,
            from_offset: start_offset,
        });
    };

    T::from_le(slice)
}

/// Writes a value of type `T` into a byte slice in little-endian format.
pub fn write_le<T: LittleEndianInteger>(
    bytes: &mut [u8],
    start_offset: usize,
    value: T,
) -> Result<(), BinaryError> {
    let Some(slice) = bytes.get_mut(start_offset..start_offset + T::SIZE) else {
        return Err(BinaryError::SliceSizeMismatch {
            expected: T::SIZE,
            from_offset: start_offset,
        });
    };

    value.to_le(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_le_u16() {
        let bytes = [0x17, 0x00];
        assert_eq!(read_le::<u16>(&bytes, 0).unwrap(), 23);
    }

    #[test]
    fn read_le_u16_at_offset() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x17, 0x00];
        assert_eq!(read_le::<u16>(&bytes, 4).unwrap(), 23);
    }

    #[test]
    fn read_le_u32() {
        let bytes = [0x17, 0x00, 0x00, 0x00];
        assert_eq!(read_le::<u32>(&bytes, 0).unwrap(), 23);
    }

    #[test]
    fn read_le_u64() {
        let bytes = [0x17, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(read_le::<u64>(&bytes, 0).unwrap(), 23);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut bytes = [0u8; 4];
        write_le::<u32>(&mut bytes, 0, 0xDEAD_BEEF).unwrap();
        assert_eq!(read_le::<u32>(&bytes, 0).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn read_le_out_of_range_is_an_error() {
        let bytes = [0x00u8; 1];
        assert!(matches!(
            read_le::<u16>(&bytes, 0),
            Err(BinaryError::SliceSizeMismatch { .. })
        ));
    }
}
