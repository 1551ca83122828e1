//! Vector math and great-circle densification

use super::angle::{from_radians, subtract_angle, to_radians};
use super::types::{Point, Traits};

pub type Vec3 = [f64; 3];

const EPSILON: f64 = 1e-12;

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub fn normalized(a: Vec3) -> Vec3 {
    let len = length(a);
    [a[0] / len, a[1] / len, a[2] / len]
}

/// Rotate `v` about the unit vector `axis` by `angle` radians (Rodrigues)
pub fn rotate(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    let k_cross_v = cross(axis, v);
    let k_dot_v = dot(axis, v);
    [
        v[0] * c + k_cross_v[0] * s + axis[0] * k_dot_v * (1.0 - c),
        v[1] * c + k_cross_v[1] * s + axis[1] * k_dot_v * (1.0 - c),
        v[2] * c + k_cross_v[2] * s + axis[2] * k_dot_v * (1.0 - c),
    ]
}

/// Dot product of two points treated as vectors
pub fn dot_points(a: &Point, b: &Point) -> f64 {
    a.coords().iter().zip(b.coords()).map(|(x, y)| x * y).sum()
}

/// Unit vector of a surface point (longitude, latitude or colatitude)
pub fn to_cartesian(p: &Point, traits: &Traits) -> Vec3 {
    let lon = to_radians(p[0], traits.unit);
    let lat = to_radians(p[1], traits.unit);
    let (sin_lon, cos_lon) = lon.sin_cos();
    if traits.is_equatorial() {
        let (sin_lat, cos_lat) = lat.sin_cos();
        [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
    } else {
        let (sin_col, cos_col) = lat.sin_cos();
        [sin_col * cos_lon, sin_col * sin_lon, cos_col]
    }
}

/// Surface point of a unit vector
pub fn from_cartesian(v: Vec3, traits: &Traits) -> Point {
    let lon = v[1].atan2(v[0]);
    let z = v[2].clamp(-1.0, 1.0);
    let lat = if traits.is_equatorial() { z.asin() } else { z.acos() };
    Point::new(from_radians(lon, traits.unit), from_radians(lat, traits.unit))
}

/// Great-circle angle between two surface points, radians
pub fn spherical_angle(p0: &Point, p1: &Point, traits: &Traits) -> f64 {
    let a = to_cartesian(p0, traits);
    let b = to_cartesian(p1, traits);
    dot(a, b).clamp(-1.0, 1.0).acos()
}

/// Intermediate points along the great circle from `p0` to `p1`
///
/// `threshold` is the longest allowed step, in the traits' unit. The number
/// of steps is even so one point lands on the arc's midpoint. Antipodal
/// endpoints rotate about `a x north` (or `a x x-axis` at the poles).
/// Returned longitudes continue from `p0[0]` without jumps. Endpoints are
/// not included.
pub fn densify_spherical(p0: &Point, p1: &Point, threshold: f64, traits: &Traits) -> Vec<Point> {
    let threshold = to_radians(threshold, traits.unit);
    if !(threshold > 0.0) {
        return Vec::new();
    }
    let a = to_cartesian(p0, traits);
    let b = to_cartesian(p1, traits);
    let angle = dot(a, b).clamp(-1.0, 1.0).acos();
    if angle <= threshold {
        return Vec::new();
    }

    let mut axis = cross(a, b);
    if length(axis) < EPSILON {
        if dot(a, b) > 0.0 {
            return Vec::new();
        }
        axis = cross(a, [0.0, 0.0, 1.0]);
        if length(axis) < EPSILON {
            axis = cross(a, [1.0, 0.0, 0.0]);
        }
    }
    let axis = normalized(axis);

    let mut n = (angle / threshold).ceil() as usize;
    if n % 2 == 1 {
        n += 1;
    }

    let mut prev_x = p0[0];
    (1..n)
        .map(|i| {
            let v = rotate(a, axis, angle * i as f64 / n as f64);
            let q = from_cartesian(v, traits);
            let x = prev_x + subtract_angle(q[0], prev_x, traits.unit);
            prev_x = x;
            q.with_x(x)
        })
        .collect()
}

/// Points of a linestring with great-circle densification of every edge
pub fn densify_path(points: &[Point], closed: bool, threshold: f64, traits: &Traits) -> Vec<Point> {
    let mut out = Vec::with_capacity(points.len());
    let count = points.len();
    let edges = if closed && count > 1 { count } else { count.saturating_sub(1) };
    if let Some(first) = points.first() {
        out.push(*first);
    }
    for i in 0..edges {
        let p = &points[i];
        let q = &points[(i + 1) % count];
        out.extend(densify_spherical(p, q, threshold, traits));
        if i + 1 < count {
            out.push(*q);
        }
    }
    out
}
