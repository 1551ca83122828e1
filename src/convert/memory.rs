//! Raw debuggee memory access

use super::converter::Converter;
use super::primitive::Scalar;
use crate::error::ConvertError;

/// Reads bytes from the paused debuggee
pub trait MemoryReader {
    /// `None` when the range cannot be accessed; a shorter vector on a partial read
    fn read_bytes(&self, address: u64, len: usize) -> Option<Vec<u8>>;
}

impl<R: MemoryReader + ?Sized> MemoryReader for &R {
    fn read_bytes(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        (**self).read_bytes(address, len)
    }
}

/// Decode one instance at `address` with a single memory read
///
/// `out` must hold exactly `converter.value_count()` slots. On error its
/// contents are unspecified.
pub fn read<T: Scalar, R: MemoryReader + ?Sized>(
    reader: &R,
    address: u64,
    out: &mut [T],
    converter: &Converter<T>,
) -> Result<(), ConvertError> {
    let expected = converter.byte_size();
    let bytes = reader
        .read_bytes(address, expected)
        .ok_or(ConvertError::MemoryUnavailable { address })?;
    if bytes.len() < expected {
        return Err(ConvertError::ShortRead {
            address,
            expected,
            actual: bytes.len(),
        });
    }
    converter.copy(&bytes, 0, out);
    Ok(())
}

/// `read` into a newly allocated vector
pub fn read_values<T: Scalar, R: MemoryReader + ?Sized>(
    reader: &R,
    address: u64,
    converter: &Converter<T>,
) -> Result<Vec<T>, ConvertError> {
    let mut out = vec![T::default(); converter.value_count()];
    read(reader, address, &mut out, converter)?;
    Ok(out)
}
