//! Debugger expression collaborator and textual value parsing

use super::primitive::Dialect;
use crate::error::ConvertError;

/// Result of evaluating an expression in the current frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub is_valid: bool,
    pub value: String,
    pub type_name: String,
}

impl Expression {
    pub fn valid(value: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            value: value.into(),
            type_name: type_name.into(),
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Expression/type-query channel of a paused debugger
pub trait Debugger {
    fn evaluate(&self, expr: &str) -> Expression;

    /// Language of the current stack frame
    fn dialect(&self) -> Dialect;

    /// Integers are displayed in hexadecimal
    fn hex_display(&self) -> bool {
        false
    }

    fn address_of(&self, expr: &str) -> Option<u64> {
        let e = self.evaluate(&format!("&({})", expr));
        if !e.is_valid {
            return None;
        }
        // Pointers are shown in hex regardless of the display mode
        parse_integer(&e.value, true)
    }

    fn size_of(&self, type_or_expr: &str) -> Option<i32> {
        let e = self.evaluate(&format!("sizeof({})", type_or_expr));
        if !e.is_valid {
            return None;
        }
        parse_signed(&e.value, self.hex_display()).and_then(|v| i32::try_from(v).ok())
    }
}

impl<D: Debugger + ?Sized> Debugger for &D {
    fn evaluate(&self, expr: &str) -> Expression {
        (**self).evaluate(expr)
    }
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }
    fn hex_display(&self) -> bool {
        (**self).hex_display()
    }
    fn address_of(&self, expr: &str) -> Option<u64> {
        (**self).address_of(expr)
    }
    fn size_of(&self, type_or_expr: &str) -> Option<i32> {
        (**self).size_of(type_or_expr)
    }
}

/// Evaluate and reject invalid expressions
pub fn evaluate_valid<D: Debugger + ?Sized>(debugger: &D, expr: &str) -> Result<Expression, ConvertError> {
    let e = debugger.evaluate(expr);
    if e.is_valid {
        Ok(e)
    } else {
        Err(ConvertError::UnknownExpression(expr.to_string()))
    }
}

/// First token of a displayed value, without `{...}` or quoted annotations
fn leading_token(value: &str) -> &str {
    let value = value.trim();
    let end = value
        .find(|c: char| c.is_whitespace() || c == '{' || c == '\'' || c == '"')
        .unwrap_or(value.len());
    &value[..end]
}

fn strip_integer_suffix(token: &str) -> &str {
    token.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'))
}

/// Parse an unsigned integer as shown by the debugger
///
/// Accepts decimal, `0x`/`&H` prefixed hex and, in hex display mode, bare hex
/// digits. Negative values wrap to their two's complement.
pub fn parse_integer(value: &str, hex_display: bool) -> Option<u64> {
    parse_signed(value, hex_display)
        .map(|v| v as u64)
        .or_else(|| parse_magnitude(leading_token(value), hex_display))
}

/// Parse a signed integer as shown by the debugger
pub fn parse_signed(value: &str, hex_display: bool) -> Option<i64> {
    let token = leading_token(value);
    if let Some(rest) = token.strip_prefix('-') {
        return parse_magnitude(rest, hex_display)
            .and_then(|m| i64::try_from(m).ok())
            .map(|m| -m);
    }
    parse_magnitude(token, hex_display).and_then(|m| i64::try_from(m).ok())
}

fn parse_magnitude(token: &str, hex_display: bool) -> Option<u64> {
    let hex = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .or_else(|| token.strip_prefix("&H"));
    if let Some(digits) = hex {
        let digits = digits.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L' | '&'));
        return u64::from_str_radix(digits, 16).ok();
    }
    let token = strip_integer_suffix(token);
    if token.is_empty() {
        return None;
    }
    if hex_display {
        u64::from_str_radix(token, 16).ok()
    } else {
        token.parse().ok()
    }
}

/// Parse a floating point value as shown by the debugger
pub fn parse_double(value: &str, hex_display: bool) -> Option<f64> {
    let token = leading_token(value);
    let trimmed = token.trim_end_matches(|c: char| matches!(c, 'f' | 'F' | 'D' | 'M' | 'R'));
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    parse_signed(value, hex_display).map(|v| v as f64)
}
