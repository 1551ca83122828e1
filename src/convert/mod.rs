//! Byte-to-value decoding framework
//!
//! Turns type names, sizes and offsets reported by a debugger into decode
//! plans, and runs those plans over bytes read from the debuggee in one shot.
//!
//! # Submodules
//! - `primitive` - Dialect spelling tables, physical primitives, output scalars
//! - `converter` - The `Converter` decode plan and its builders
//! - `memory` - Memory reader collaborator and one-shot reads
//! - `debugger` - Expression collaborator and value parsing
//! - `layout` - Plans discovered through debugger queries
//! - `snapshot` - Recorded debugger state for offline decoding

mod primitive;
mod converter;
mod memory;
mod debugger;
pub mod layout;
mod snapshot;

pub use primitive::{
    canonical_spelling,
    classify,
    Dialect,
    NumericClass,
    OutputKind,
    Primitive,
    Scalar,
};

pub use converter::{
    build_array_converter,
    build_struct_converter,
    build_transforming_converter,
    build_value_converter,
    require_value_converter,
    transforms,
    ArrayConverter,
    Converter,
    Member,
    StructConverter,
    TransformingConverter,
    ValueConverter,
};

pub use memory::{read, read_values, MemoryReader};

pub use debugger::{
    evaluate_valid,
    parse_double,
    parse_integer,
    parse_signed,
    Debugger,
    Expression,
};

pub use snapshot::Snapshot;
