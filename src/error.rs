//! Error types shared by the decoding and geometry layers
//!
//! Environmental failures (unknown spellings, unreadable memory) surface as
//! `ConvertError` values so callers can report "no data". Contract violations
//! such as a destination slice of the wrong length panic instead.

use crate::convert::Dialect;

/// Failure while building or running a decode plan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// Primitive spelling not present in the dialect's table
    #[error("unsupported type '{type_name}' ({dialect:?}, {byte_size} bytes)")]
    UnsupportedType {
        type_name: String,
        dialect: Dialect,
        byte_size: usize,
    },

    /// Struct member does not fit in the declared struct size
    #[error("member at offset {offset} with size {size} exceeds struct size {total}")]
    OutOfRange {
        offset: usize,
        size: usize,
        total: usize,
    },

    /// Debuggee returned fewer bytes than requested
    #[error("short read at 0x{address:x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        address: u64,
        expected: usize,
        actual: usize,
    },

    /// Debuggee memory could not be accessed at all
    #[error("memory at 0x{address:x} is unavailable")]
    MemoryUnavailable { address: u64 },

    /// Expression rejected by the debugger
    #[error("expression '{0}' is not valid in the current frame")]
    UnknownExpression(String),

    /// Expression evaluated but its textual value could not be interpreted
    #[error("cannot interpret value '{value}' of expression '{expr}'")]
    InvalidValue { expr: String, value: String },
}

/// Geometry that cannot be measured or projected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
