//! Decode plans over raw byte buffers
//!
//! A `Converter` describes how many bytes it consumes and how many output
//! slots it fills. Plans are built once per discovered type and are immutable
//! afterwards, so one plan can decode any number of instances.

use super::primitive::{classify, Dialect, Primitive, Scalar};
use crate::error::ConvertError;

/// Tagged decode plan
#[derive(Debug, Clone)]
pub enum Converter<T: Scalar> {
    Value(ValueConverter),
    Array(ArrayConverter<T>),
    Struct(StructConverter<T>),
    Transforming(TransformingConverter<T>),
}

impl<T: Scalar> Converter<T> {
    /// Number of output slots produced
    pub fn value_count(&self) -> usize {
        match self {
            Converter::Value(_) => 1,
            Converter::Array(array) => array.element.value_count() * array.count,
            Converter::Struct(s) => s.value_count,
            Converter::Transforming(t) => t.base.value_count(),
        }
    }

    /// Number of source bytes consumed
    pub fn byte_size(&self) -> usize {
        match self {
            Converter::Value(value) => value.primitive.byte_size(),
            Converter::Array(array) => array.element.byte_size() * array.count,
            Converter::Struct(s) => s.byte_size,
            Converter::Transforming(t) => t.base.byte_size(),
        }
    }

    /// Decode one instance starting at `src_offset` into `dst`
    ///
    /// # Panics
    /// If `dst.len() != self.value_count()` or `src` holds fewer than
    /// `src_offset + self.byte_size()` bytes.
    pub fn copy(&self, src: &[u8], src_offset: usize, dst: &mut [T]) {
        assert_eq!(
            dst.len(),
            self.value_count(),
            "destination length must equal the converter's value count"
        );
        assert!(
            src_offset + self.byte_size() <= src.len(),
            "source buffer too short: need {} bytes at offset {}, have {}",
            self.byte_size(),
            src_offset,
            src.len()
        );
        self.copy_unchecked(src, src_offset, dst);
    }

    fn copy_unchecked(&self, src: &[u8], src_offset: usize, dst: &mut [T]) {
        match self {
            Converter::Value(value) => {
                dst[0] = value.primitive.decode(&src[src_offset..]);
            }
            Converter::Array(array) => array.copy(src, src_offset, dst),
            Converter::Struct(s) => s.copy(src, src_offset, dst),
            Converter::Transforming(t) => {
                t.base.copy_unchecked(src, src_offset, dst);
                (t.transform)(dst);
            }
        }
    }

    /// Decode into a freshly allocated vector
    pub fn decode(&self, src: &[u8]) -> Vec<T> {
        let mut out = vec![T::default(); self.value_count()];
        self.copy(src, 0, &mut out);
        out
    }
}

/// Single primitive into a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueConverter {
    pub primitive: Primitive,
}

/// `count` contiguous repetitions of an element plan
#[derive(Debug, Clone)]
pub struct ArrayConverter<T: Scalar> {
    element: Box<Converter<T>>,
    count: usize,
}

impl<T: Scalar> ArrayConverter<T> {
    pub fn element(&self) -> &Converter<T> {
        &self.element
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn copy(&self, src: &[u8], src_offset: usize, dst: &mut [T]) {
        let elem_bytes = self.element.byte_size();
        let elem_values = self.element.value_count();
        let block = &src[src_offset..src_offset + elem_bytes * self.count];

        // Primitive elements are decoded in a single pass over the block
        if let Converter::Value(value) = self.element.as_ref() {
            value.primitive.decode_slice(block, dst);
            return;
        }

        for (i, out) in dst.chunks_exact_mut(elem_values.max(1)).enumerate().take(self.count) {
            self.element.copy_unchecked(block, i * elem_bytes, out);
        }
    }
}

/// Member of a struct plan
#[derive(Debug, Clone)]
pub struct Member<T: Scalar> {
    pub converter: Converter<T>,
    pub offset: usize,
}

impl<T: Scalar> Member<T> {
    pub fn new(converter: Converter<T>, offset: usize) -> Self {
        Self { converter, offset }
    }
}

/// Fixed list of members at byte offsets within a struct of known size
#[derive(Debug, Clone)]
pub struct StructConverter<T: Scalar> {
    byte_size: usize,
    members: Vec<Member<T>>,
    value_count: usize,
}

impl<T: Scalar> StructConverter<T> {
    pub fn members(&self) -> &[Member<T>] {
        &self.members
    }

    fn copy(&self, src: &[u8], src_offset: usize, dst: &mut [T]) {
        let mut pos = 0;
        for member in &self.members {
            let count = member.converter.value_count();
            member
                .converter
                .copy_unchecked(src, src_offset + member.offset, &mut dst[pos..pos + count]);
            pos += count;
        }
    }
}

/// Base plan followed by an in-place transform of the produced slots
#[derive(Debug, Clone)]
pub struct TransformingConverter<T: Scalar> {
    base: Box<Converter<T>>,
    transform: fn(&mut [T]),
}

/// Build a plan for a primitive spelling, `None` when the spelling or its
/// width is not recognized in `dialect`
pub fn build_value_converter<T: Scalar>(
    dialect: Dialect,
    type_name: &str,
    byte_size: usize,
) -> Option<Converter<T>> {
    let class = classify(dialect, type_name)?;
    let primitive = Primitive::from_class(class, byte_size)?;
    Some(Converter::Value(ValueConverter { primitive }))
}

/// Same as `build_value_converter` but reports the failing spelling
pub fn require_value_converter<T: Scalar>(
    dialect: Dialect,
    type_name: &str,
    byte_size: usize,
) -> Result<Converter<T>, ConvertError> {
    build_value_converter(dialect, type_name, byte_size).ok_or_else(|| {
        ConvertError::UnsupportedType {
            type_name: type_name.to_string(),
            dialect,
            byte_size,
        }
    })
}

pub fn build_array_converter<T: Scalar>(element: Converter<T>, count: usize) -> Converter<T> {
    Converter::Array(ArrayConverter {
        element: Box::new(element),
        count,
    })
}

/// Build a struct plan; every member must lie within `byte_size`
pub fn build_struct_converter<T: Scalar>(
    byte_size: usize,
    members: Vec<Member<T>>,
) -> Result<Converter<T>, ConvertError> {
    for member in &members {
        let size = member.converter.byte_size();
        let end = member.offset.checked_add(size);
        if end.map_or(true, |end| end > byte_size) {
            return Err(ConvertError::OutOfRange {
                offset: member.offset,
                size,
                total: byte_size,
            });
        }
    }
    let value_count = members.iter().map(|m| m.converter.value_count()).sum();
    Ok(Converter::Struct(StructConverter {
        byte_size,
        members,
        value_count,
    }))
}

pub fn build_transforming_converter<T: Scalar>(
    base: Converter<T>,
    transform: fn(&mut [T]),
) -> Converter<T> {
    Converter::Transforming(TransformingConverter {
        base: Box::new(base),
        transform,
    })
}

/// Post-decode transforms for `TransformingConverter`
pub mod transforms {
    /// Pointers read from a 32-bit debuggee through a 64-bit slot
    pub fn mask_to_32_bits(values: &mut [u64]) {
        for v in values {
            *v &= 0xffff_ffff;
        }
    }

    /// Reinterpret the low 32 bits of each slot as an IEEE single and store its bit
    /// pattern widened to a double
    pub fn f32_bits_to_f64_bits(values: &mut [u64]) {
        for v in values {
            *v = (f32::from_bits(*v as u32) as f64).to_bits();
        }
    }

    /// Swap each consecutive pair of slots, e.g. (lat, lon) stored order
    pub fn swap_pairs(values: &mut [f64]) {
        for pair in values.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }

    pub fn degrees_to_radians(values: &mut [f64]) {
        for v in values {
            *v = v.to_radians();
        }
    }
}
