//! Primitive spellings, physical kinds and output scalar types
//!
//! Classification is a plain table lookup keyed by dialect and canonical
//! spelling. The table only decides the numeric class of a spelling; the width
//! always comes from the size the debugger reports, so `long` decodes as 4 or 8
//! bytes depending on the debuggee.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// Source language of the current stack frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Cpp,
    CSharp,
    Basic,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Cpp, Dialect::CSharp, Dialect::Basic];

    pub fn table(self) -> &'static [(&'static str, NumericClass)] {
        match self {
            Dialect::Cpp => CPP_PRIMITIVES,
            Dialect::CSharp => CSHARP_PRIMITIVES,
            Dialect::Basic => BASIC_PRIMITIVES,
        }
    }

    /// Member access on a parenthesized expression
    pub fn member(self, expr: &str, member: &str) -> String {
        format!("({}).{}", expr, member)
    }

    /// Element access on a pointer or array expression
    pub fn element(self, expr: &str, index: u64) -> String {
        match self {
            Dialect::Basic => format!("({})({})", expr, index),
            Dialect::Cpp | Dialect::CSharp => format!("({})[{}]", expr, index),
        }
    }
}

/// Numeric class of a recognized spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericClass {
    Signed,
    Unsigned,
    Float,
    Decimal,
}

const CPP_PRIMITIVES: &[(&str, NumericClass)] = &[
    ("char", NumericClass::Signed),
    ("signed char", NumericClass::Signed),
    ("unsigned char", NumericClass::Unsigned),
    ("wchar_t", NumericClass::Unsigned),
    ("char16_t", NumericClass::Unsigned),
    ("char32_t", NumericClass::Unsigned),
    ("short", NumericClass::Signed),
    ("short int", NumericClass::Signed),
    ("signed short", NumericClass::Signed),
    ("unsigned short", NumericClass::Unsigned),
    ("unsigned short int", NumericClass::Unsigned),
    ("int", NumericClass::Signed),
    ("signed", NumericClass::Signed),
    ("signed int", NumericClass::Signed),
    ("unsigned", NumericClass::Unsigned),
    ("unsigned int", NumericClass::Unsigned),
    ("long", NumericClass::Signed),
    ("long int", NumericClass::Signed),
    ("signed long", NumericClass::Signed),
    ("unsigned long", NumericClass::Unsigned),
    ("unsigned long int", NumericClass::Unsigned),
    ("long long", NumericClass::Signed),
    ("long long int", NumericClass::Signed),
    ("unsigned long long", NumericClass::Unsigned),
    ("unsigned long long int", NumericClass::Unsigned),
    ("__int8", NumericClass::Signed),
    ("__int16", NumericClass::Signed),
    ("__int32", NumericClass::Signed),
    ("__int64", NumericClass::Signed),
    ("unsigned __int8", NumericClass::Unsigned),
    ("unsigned __int16", NumericClass::Unsigned),
    ("unsigned __int32", NumericClass::Unsigned),
    ("unsigned __int64", NumericClass::Unsigned),
    ("int8_t", NumericClass::Signed),
    ("int16_t", NumericClass::Signed),
    ("int32_t", NumericClass::Signed),
    ("int64_t", NumericClass::Signed),
    ("uint8_t", NumericClass::Unsigned),
    ("uint16_t", NumericClass::Unsigned),
    ("uint32_t", NumericClass::Unsigned),
    ("uint64_t", NumericClass::Unsigned),
    ("std::int8_t", NumericClass::Signed),
    ("std::int16_t", NumericClass::Signed),
    ("std::int32_t", NumericClass::Signed),
    ("std::int64_t", NumericClass::Signed),
    ("std::uint8_t", NumericClass::Unsigned),
    ("std::uint16_t", NumericClass::Unsigned),
    ("std::uint32_t", NumericClass::Unsigned),
    ("std::uint64_t", NumericClass::Unsigned),
    ("size_t", NumericClass::Unsigned),
    ("std::size_t", NumericClass::Unsigned),
    ("float", NumericClass::Float),
    ("double", NumericClass::Float),
    ("long double", NumericClass::Float),
];

const CSHARP_PRIMITIVES: &[(&str, NumericClass)] = &[
    ("sbyte", NumericClass::Signed),
    ("byte", NumericClass::Unsigned),
    ("short", NumericClass::Signed),
    ("ushort", NumericClass::Unsigned),
    ("int", NumericClass::Signed),
    ("uint", NumericClass::Unsigned),
    ("long", NumericClass::Signed),
    ("ulong", NumericClass::Unsigned),
    ("char", NumericClass::Unsigned),
    ("float", NumericClass::Float),
    ("double", NumericClass::Float),
    ("decimal", NumericClass::Decimal),
    ("System.SByte", NumericClass::Signed),
    ("System.Byte", NumericClass::Unsigned),
    ("System.Int16", NumericClass::Signed),
    ("System.UInt16", NumericClass::Unsigned),
    ("System.Int32", NumericClass::Signed),
    ("System.UInt32", NumericClass::Unsigned),
    ("System.Int64", NumericClass::Signed),
    ("System.UInt64", NumericClass::Unsigned),
    ("System.Char", NumericClass::Unsigned),
    ("System.Single", NumericClass::Float),
    ("System.Double", NumericClass::Float),
    ("System.Decimal", NumericClass::Decimal),
];

const BASIC_PRIMITIVES: &[(&str, NumericClass)] = &[
    ("SByte", NumericClass::Signed),
    ("Byte", NumericClass::Unsigned),
    ("Short", NumericClass::Signed),
    ("UShort", NumericClass::Unsigned),
    ("Integer", NumericClass::Signed),
    ("UInteger", NumericClass::Unsigned),
    ("Long", NumericClass::Signed),
    ("ULong", NumericClass::Unsigned),
    ("Char", NumericClass::Unsigned),
    ("Single", NumericClass::Float),
    ("Double", NumericClass::Float),
    ("Decimal", NumericClass::Decimal),
];

/// Collapse runs of whitespace so `unsigned  long` matches `unsigned long`
pub fn canonical_spelling(type_name: &str) -> String {
    type_name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look up the numeric class of a spelling in a dialect's table
pub fn classify(dialect: Dialect, type_name: &str) -> Option<NumericClass> {
    let spelling = canonical_spelling(type_name);
    dialect
        .table()
        .iter()
        .find(|(name, _)| *name == spelling)
        .map(|&(_, class)| class)
}

/// Physical primitive stored in debuggee memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// 16-byte .NET decimal: flags, hi32, lo64
    Decimal,
}

impl Primitive {
    pub fn from_class(class: NumericClass, byte_size: usize) -> Option<Self> {
        let primitive = match (class, byte_size) {
            (NumericClass::Signed, 1) => Primitive::I8,
            (NumericClass::Signed, 2) => Primitive::I16,
            (NumericClass::Signed, 4) => Primitive::I32,
            (NumericClass::Signed, 8) => Primitive::I64,
            (NumericClass::Unsigned, 1) => Primitive::U8,
            (NumericClass::Unsigned, 2) => Primitive::U16,
            (NumericClass::Unsigned, 4) => Primitive::U32,
            (NumericClass::Unsigned, 8) => Primitive::U64,
            (NumericClass::Float, 4) => Primitive::F32,
            (NumericClass::Float, 8) => Primitive::F64,
            (NumericClass::Decimal, 16) => Primitive::Decimal,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn byte_size(self) -> usize {
        match self {
            Primitive::I8 | Primitive::U8 => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 8,
            Primitive::Decimal => 16,
        }
    }

    /// Decode one value from the start of `src`
    pub fn decode<T: Scalar>(self, src: &[u8]) -> T {
        match self {
            Primitive::I8 => T::from_i64(src[0] as i8 as i64),
            Primitive::I16 => T::from_i64(LittleEndian::read_i16(src) as i64),
            Primitive::I32 => T::from_i64(LittleEndian::read_i32(src) as i64),
            Primitive::I64 => T::from_i64(LittleEndian::read_i64(src)),
            Primitive::U8 => T::from_u64(src[0] as u64),
            Primitive::U16 => T::from_u64(LittleEndian::read_u16(src) as u64),
            Primitive::U32 => T::from_u64(LittleEndian::read_u32(src) as u64),
            Primitive::U64 => T::from_u64(LittleEndian::read_u64(src)),
            Primitive::F32 => T::from_f64(LittleEndian::read_f32(src) as f64),
            Primitive::F64 => T::from_f64(LittleEndian::read_f64(src)),
            Primitive::Decimal => T::from_f64(decode_decimal(src)),
        }
    }

    /// Decode `dst.len()` consecutive values in one pass
    pub fn decode_slice<T: Scalar>(self, src: &[u8], dst: &mut [T]) {
        let size = self.byte_size();
        for (value, chunk) in dst.iter_mut().zip(src.chunks_exact(size)) {
            *value = self.decode(chunk);
        }
    }
}

fn decode_decimal(src: &[u8]) -> f64 {
    let flags = LittleEndian::read_u32(&src[0..4]);
    let hi = LittleEndian::read_u32(&src[4..8]);
    let lo = LittleEndian::read_u64(&src[8..16]);
    let mantissa = ((hi as u128) << 64) | lo as u128;
    let scale = ((flags >> 16) & 0xff) as i32;
    let magnitude = mantissa as f64 / 10f64.powi(scale);
    if flags & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Output scalar a decode plan writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Double,
    UInt64,
}

/// Output scalar types; every conversion is Rust's `as` cast
/// or rounding policy beyond it
pub trait Scalar: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const KIND: OutputKind;
    fn from_i64(v: i64) -> Self;
    fn from_u64(v: u64) -> Self;
    fn from_f64(v: f64) -> Self;
}

impl Scalar for f64 {
    const KIND: OutputKind = OutputKind::Double;

    fn from_i64(v: i64) -> Self {
        v as f64
    }
    fn from_u64(v: u64) -> Self {
        v as f64
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Scalar for u64 {
    const KIND: OutputKind = OutputKind::UInt64;

    fn from_i64(v: i64) -> Self {
        v as u64
    }
    fn from_u64(v: u64) -> Self {
        v
    }
    fn from_f64(v: f64) -> Self {
        v as u64
    }
}
