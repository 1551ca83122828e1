//! Periodic coordinate normalization
//!
//! All comparisons of periodic coordinates go through these helpers before
//! subtracting, so raw stored values never produce spurious large deltas.

use super::types::Unit;
use std::f64::consts::PI;

/// Half period: pi or 180; infinite for unit-less coordinates
pub fn half_angle(unit: Unit) -> f64 {
    match unit {
        Unit::Radian => PI,
        Unit::Degree => 180.0,
        Unit::None => f64::INFINITY,
    }
}

/// Full period: 2pi or 360; infinite for unit-less coordinates
pub fn full_angle(unit: Unit) -> f64 {
    2.0 * half_angle(unit)
}

/// Map `x` into `[-pi, pi]` (or `[-180, 180]`)
pub fn normalized_angle_signed(x: f64, unit: Unit) -> f64 {
    if unit == Unit::None {
        return x;
    }
    let pi = half_angle(unit);
    if (-pi..=pi).contains(&x) {
        return x;
    }
    (x + pi).rem_euclid(2.0 * pi) - pi
}

/// Map `x` into `[0, 2pi)` (or `[0, 360)`)
pub fn normalized_angle_unsigned(x: f64, unit: Unit) -> f64 {
    if unit == Unit::None {
        return x;
    }
    let two_pi = full_angle(unit);
    let r = x.rem_euclid(two_pi);
    // rem_euclid may round up to the modulus for tiny negative inputs
    if r >= two_pi {
        0.0
    } else {
        r
    }
}

/// Shortest signed difference `to - from`; a half-period difference is
/// reported as negative so it extends the minimum side
pub fn subtract_angle(to: f64, from: f64, unit: Unit) -> f64 {
    let d = normalized_angle_signed(to - from, unit);
    let pi = half_angle(unit);
    if d == pi {
        -pi
    } else {
        d
    }
}

/// Rewrite coordinate 0 of consecutive values so no step exceeds half a period
///
/// The first value is kept as stored; each following value becomes the
/// previous one plus the shortest signed difference, with the half-period
/// tie going to the minimum side as in `subtract_angle`.
pub fn unwrap_angles(xs: &[f64], unit: Unit) -> Vec<f64> {
    let mut out = Vec::with_capacity(xs.len());
    let mut prev_raw = match xs.first() {
        Some(&x) => x,
        None => return out,
    };
    let mut prev = prev_raw;
    out.push(prev);
    for &x in &xs[1..] {
        prev += subtract_angle(x, prev_raw, unit);
        prev_raw = x;
        out.push(prev);
    }
    out
}

pub fn to_radians(v: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Degree => v.to_radians(),
        Unit::Radian | Unit::None => v,
    }
}

pub fn from_radians(v: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Degree => v.to_degrees(),
        Unit::Radian | Unit::None => v,
    }
}
