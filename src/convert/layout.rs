//! Decode plans discovered through the debugger
//!
//! Offsets are measured as the distance between a member's address and its
//! parent's address, sizes come from `sizeof` and leaf kinds from the type
//! name reported for each member. No compile-time knowledge of the decoded
//! type is needed.

use super::converter::{build_array_converter, build_struct_converter, require_value_converter, Converter, Member};
use super::debugger::{evaluate_valid, Debugger};
use super::primitive::Scalar;
use crate::error::ConvertError;
use tracing::trace;

/// Placement of one member inside its parent
#[derive(Debug, Clone, PartialEq)]
pub struct MemberLayout {
    pub expr: String,
    pub type_name: String,
    pub offset: usize,
    pub size: usize,
}

pub fn address_of<D: Debugger + ?Sized>(debugger: &D, expr: &str) -> Result<u64, ConvertError> {
    debugger
        .address_of(expr)
        .ok_or_else(|| ConvertError::UnknownExpression(format!("&({})", expr)))
}

/// Size in bytes of the value of `expr`
pub fn size_of_value<D: Debugger + ?Sized>(debugger: &D, expr: &str) -> Result<usize, ConvertError> {
    let e = evaluate_valid(debugger, expr)?;
    let size = debugger
        .size_of(&e.type_name)
        .or_else(|| debugger.size_of(expr))
        .filter(|&s| s > 0)
        .ok_or_else(|| ConvertError::UnknownExpression(format!("sizeof({})", e.type_name)))?;
    Ok(size as usize)
}

/// Locate `member` of `expr`
pub fn member_layout<D: Debugger + ?Sized>(
    debugger: &D,
    expr: &str,
    member: &str,
) -> Result<MemberLayout, ConvertError> {
    let base = address_of(debugger, expr)?;
    let member_expr = debugger.dialect().member(expr, member);
    let e = evaluate_valid(debugger, &member_expr)?;
    let address = address_of(debugger, &member_expr)?;
    let offset = address.checked_sub(base).ok_or_else(|| ConvertError::InvalidValue {
        expr: member_expr.clone(),
        value: format!("0x{:x}", address),
    })?;
    let size = size_of_value(debugger, &member_expr)?;
    trace!(member = %member_expr, offset, size, type_name = %e.type_name, "member layout");
    Ok(MemberLayout {
        expr: member_expr,
        type_name: e.type_name,
        offset: offset as usize,
        size,
    })
}

/// Plan for a primitive-typed expression
pub fn value_converter<T: Scalar, D: Debugger + ?Sized>(
    debugger: &D,
    expr: &str,
) -> Result<Converter<T>, ConvertError> {
    let e = evaluate_valid(debugger, expr)?;
    let size = size_of_value(debugger, expr)?;
    require_value_converter(debugger.dialect(), &e.type_name, size)
}

/// Plan for `expr` built from already planned members
pub fn struct_converter<T: Scalar, D: Debugger + ?Sized>(
    debugger: &D,
    expr: &str,
    members: Vec<(&str, Converter<T>)>,
) -> Result<Converter<T>, ConvertError> {
    let total = size_of_value(debugger, expr)?;
    let mut planned = Vec::with_capacity(members.len());
    for (name, converter) in members {
        let layout = member_layout(debugger, expr, name)?;
        planned.push(Member::new(converter, layout.offset));
    }
    build_struct_converter(total, planned)
}

/// Plan for a struct whose listed members are all primitives
pub fn primitive_struct_converter<T: Scalar, D: Debugger + ?Sized>(
    debugger: &D,
    expr: &str,
    members: &[String],
) -> Result<Converter<T>, ConvertError> {
    let dialect = debugger.dialect();
    let mut planned = Vec::with_capacity(members.len());
    for name in members {
        let member_expr = dialect.member(expr, name);
        planned.push((name.as_str(), value_converter(debugger, &member_expr)?));
    }
    struct_converter(debugger, expr, planned)
}

/// Plan for `count` contiguous elements, given the plan for one element
///
/// The element stride is the element's `sizeof`, which includes trailing
/// padding the element plan itself may not cover.
pub fn array_converter<T: Scalar, D: Debugger + ?Sized>(
    debugger: &D,
    element_expr: &str,
    element: Converter<T>,
    count: usize,
) -> Result<Converter<T>, ConvertError> {
    let stride = size_of_value(debugger, element_expr)?;
    let element = if element.byte_size() == stride {
        element
    } else {
        build_struct_converter(stride, vec![Member::new(element, 0)])?
    };
    Ok(build_array_converter(element, count))
}
