//! Bounding boxes for plain and periodic coordinates
//!
//! Periodic boxes keep `min[0]` normalized into `[-pi, pi)` and allow
//! `max[0]` to exceed `pi` when the box crosses the antimeridian. A box never
//! spans more than one full period. Boxes coming from outside may also store
//! a crossing as finite bounds with `min[0] > max[0]`; `unwrapped_box` turns
//! those into the first form.

use super::angle::{full_angle, half_angle, normalized_angle_signed, normalized_angle_unsigned, subtract_angle};
use super::types::{GeoBox, Geometry, Interval, Point, Traits, Unit};

/// The `GeoBox::inverse` seed, as opposed to a box stored across the cut
fn is_empty_box(b: &GeoBox) -> bool {
    b.min[0] > b.max[0] && !(b.min[0].is_finite() && b.max[0].is_finite())
}

/// Periodic box with `max[0] >= min[0]`
///
/// Finite bounds with `min[0] > max[0]` describe a box crossing the
/// antimeridian; `max[0]` is moved one period forward.
pub fn unwrapped_box(b: &GeoBox, unit: Unit) -> GeoBox {
    let mut out = *b;
    if unit != Unit::None && !is_empty_box(b) && out.min[0] > out.max[0] {
        out.max[0] += full_angle(unit);
    }
    out
}

/// Shift a periodic box so `min[0]` lies in `[-pi, pi)`
fn normalize_box_angle(b: &mut GeoBox, unit: Unit) {
    let pi = half_angle(unit);
    let mut min = normalized_angle_signed(b.min[0], unit);
    if min >= pi {
        min -= 2.0 * pi;
    }
    let shift = min - b.min[0];
    b.min[0] = min;
    b.max[0] += shift;
}

fn expand_other_dims(b: &mut GeoBox, p: &Point, from: usize) {
    for i in from..b.dimension().min(p.dimension()) {
        b.min[i] = b.min[i].min(p[i]);
        b.max[i] = b.max[i].max(p[i]);
    }
}

/// Plain min/max expansion by a point
pub fn expand_point(b: &mut GeoBox, p: &Point) {
    expand_other_dims(b, p, 0);
}

/// Plain min/max expansion by a box
pub fn expand_box(b: &mut GeoBox, other: &GeoBox) {
    if other.min[0] > other.max[0] {
        return;
    }
    expand_other_dims(b, &other.min, 0);
    expand_other_dims(b, &other.max, 0);
}

/// Expand by a point whose coordinate 0 is periodic
///
/// A point outside the box extends whichever bound is nearer; on an exact
/// tie the minimum bound is extended. The result never exceeds one period.
pub fn expand_point_angle(b: &mut GeoBox, p: &Point, unit: Unit) {
    if unit == Unit::None {
        return expand_point(b, p);
    }
    let period = full_angle(unit);
    *b = unwrapped_box(b, unit);
    if is_empty_box(b) {
        let x = normalized_angle_signed(p[0], unit);
        b.min[0] = x;
        b.max[0] = x;
    } else {
        let width = b.max[0] - b.min[0];
        let from_min = normalized_angle_unsigned(p[0] - b.min[0], unit);
        if from_min > width {
            let right = from_min - width;
            let left = normalized_angle_unsigned(b.min[0] - p[0], unit);
            if left <= right {
                b.min[0] -= left;
            } else {
                b.max[0] += right;
            }
            if b.max[0] - b.min[0] >= period {
                b.max[0] = b.min[0] + period;
            }
        }
    }
    expand_other_dims(b, p, 1);
    normalize_box_angle(b, unit);
}

/// Merge two periodic boxes
///
/// `other` is placed either right after `b.min` (bridging on the right end)
/// or right before it (bridging on the left end); the narrower union wins and
/// a tie extends the minimum. A union of a full period or more wraps to
/// `[min, min + period]`.
pub fn expand_box_angle(b: &mut GeoBox, other: &GeoBox, unit: Unit) {
    if unit == Unit::None {
        return expand_box(b, other);
    }
    if is_empty_box(other) {
        return;
    }
    let other = &unwrapped_box(other, unit);
    if is_empty_box(b) {
        *b = *other;
        normalize_box_angle(b, unit);
        return;
    }
    *b = unwrapped_box(b, unit);

    let period = full_angle(unit);
    let (a0, a1) = (b.min[0], b.max[0]);
    let wb = other.max[0] - other.min[0];

    let (min, max) = if a1 - a0 >= period || wb >= period {
        let start = if a1 - a0 >= period { a0 } else { other.min[0] };
        (start, start + period)
    } else {
        let b0_right = a0 + normalized_angle_unsigned(other.min[0] - a0, unit);
        let right_end = a1.max(b0_right + wb);
        let right_width = right_end - a0;

        let b0_left = b0_right - period;
        let left_end = a1.max(b0_left + wb);
        let left_width = left_end - b0_left;

        let (min, max) = if left_width <= right_width {
            (b0_left.min(a0), left_end)
        } else {
            (a0, right_end)
        };
        if max - min >= period {
            (min, min + period)
        } else {
            (min, max)
        }
    };

    b.min[0] = min;
    b.max[0] = max;
    expand_other_dims(b, &other.min, 1);
    expand_other_dims(b, &other.max, 1);
    normalize_box_angle(b, unit);
}

/// Periodic interval of coordinate 0 covered by connected points
///
/// Each edge is followed along its shortest direction. A closed ring whose
/// walk does not return to its start encircles a pole and covers the full
/// period.
pub fn aabb_angle(points: &[Point], closed: bool, unit: Unit) -> Interval {
    let mut interval = Interval::inverse();
    let first = match points.first() {
        Some(p) => p[0],
        None => return interval,
    };
    let pi = half_angle(unit);
    let period = full_angle(unit);

    let mut prev_raw = first;
    let mut cur = normalized_angle_signed(first, unit);
    let start = cur;
    interval.expand(cur);

    let closing = if closed { Some(first) } else { None };
    for x in points[1..].iter().map(|p| p[0]).chain(closing) {
        cur += subtract_angle(x, prev_raw, unit);
        prev_raw = x;
        interval.expand(cur);
    }

    let wraps = closed && (cur - start).abs() >= pi;
    if wraps || interval.length() >= period {
        return Interval::new(-pi, pi);
    }
    interval
}

/// Box of connected points (linestring, or ring when `closed`)
pub fn aabb(points: &[Point], closed: bool, traits: &Traits) -> GeoBox {
    let mut b = GeoBox::inverse(traits.dimension);
    for p in points {
        expand_point(&mut b, p);
    }
    if traits.is_periodic() && !points.is_empty() {
        b.set_interval(0, aabb_angle(points, closed, traits.unit));
        normalize_box_angle(&mut b, traits.unit);
    }
    b
}

/// Box of unconnected points
pub fn envelope_points(points: &[Point], traits: &Traits) -> GeoBox {
    let mut b = GeoBox::inverse(traits.dimension);
    for p in points {
        expand_point_angle(&mut b, p, traits.unit);
    }
    b
}

/// Merge boxes, periodically when the traits say so
pub fn merge_boxes<'a, I: IntoIterator<Item = &'a GeoBox>>(boxes: I, traits: &Traits) -> GeoBox {
    let mut b = GeoBox::inverse(traits.dimension);
    for other in boxes {
        expand_box_angle(&mut b, other, traits.unit);
    }
    b
}

impl Geometry {
    /// Extent of the geometry; empty geometries give an inverse box
    pub fn envelope(&self, traits: &Traits) -> GeoBox {
        match self {
            Geometry::Point(p) => envelope_points(std::slice::from_ref(p), traits),
            Geometry::Box(b) => {
                let mut out = unwrapped_box(b, traits.unit);
                if traits.is_periodic() {
                    let period = full_angle(traits.unit);
                    if out.max[0] - out.min[0] > period {
                        out.max[0] = out.min[0] + period;
                    }
                    normalize_box_angle(&mut out, traits.unit);
                }
                out
            }
            Geometry::Segment(s) => aabb(&s.0, false, traits),
            Geometry::NSphere(s) => {
                let mut b = GeoBox::from_point(s.center);
                for i in 0..b.dimension() {
                    b.min[i] -= s.radius;
                    b.max[i] += s.radius;
                }
                b
            }
            Geometry::Linestring(ls) => aabb(ls, false, traits),
            Geometry::Ring(r) => aabb(r, true, traits),
            Geometry::Polygon(poly) => aabb(&poly.outer, true, traits),
            Geometry::MultiPoint(mp) => envelope_points(mp, traits),
            Geometry::MultiLinestring(mls) => {
                let boxes: Vec<GeoBox> = mls.iter().map(|ls| aabb(ls, false, traits)).collect();
                merge_boxes(&boxes, traits)
            }
            Geometry::MultiPolygon(mpoly) => {
                let boxes: Vec<GeoBox> = mpoly.iter().map(|p| aabb(&p.outer, true, traits)).collect();
                merge_boxes(&boxes, traits)
            }
            Geometry::Values(values) => {
                let mut b = GeoBox::inverse(2);
                for (i, v) in values.iter().enumerate() {
                    expand_point(&mut b, &Point::new(i as f64, *v));
                }
                b
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::types::{CoordinateSystem, Linestring, Multi, Polygon, Ring};

    fn deg() -> Traits {
        Traits::new(2, CoordinateSystem::Geographic, Unit::Degree)
    }

    fn lon_box(min: f64, max: f64) -> GeoBox {
        GeoBox::new(Point::new(min, -10.0), Point::new(max, 10.0))
    }

    #[test]
    fn test_expand_boxes_across_antimeridian() {
        // 160..-170 and 170..-160, both stored with max past 180
        let mut a = lon_box(160.0, 190.0);
        let b = lon_box(170.0, 200.0);
        expand_box_angle(&mut a, &b, Unit::Degree);
        assert_eq!(a.min[0], 160.0);
        assert_eq!(a.max[0], 200.0);
    }

    #[test]
    fn test_expand_boxes_stored_across_the_cut() {
        // A = [-170, 160] and B = [170, -160], B stored with min > max
        let mut a = lon_box(-170.0, 160.0);
        expand_box_angle(&mut a, &lon_box(170.0, -160.0), Unit::Degree);
        assert!(a.is_valid());
        assert!(a.max[0] - a.min[0] < 360.0);
        assert!(a.min[0] <= 180.0 && 180.0 <= a.max[0], "{:?}", a);
        assert!(a.min[0] <= 200.0 && 200.0 <= a.max[0], "{:?}", a);

        let mut a = lon_box(160.0, -170.0);
        expand_box_angle(&mut a, &lon_box(170.0, -160.0), Unit::Degree);
        assert_eq!((a.min[0], a.max[0]), (160.0, 200.0));

        let mut seed = GeoBox::inverse(2);
        expand_box_angle(&mut seed, &lon_box(170.0, -160.0), Unit::Degree);
        assert_eq!((seed.min[0], seed.max[0]), (170.0, 200.0));
    }

    #[test]
    fn test_box_envelope_across_the_cut() {
        let geo = Traits::new(2, CoordinateSystem::Geographic, Unit::Degree);
        let b = Geometry::Box(lon_box(170.0, -160.0)).envelope(&geo);
        assert!(b.is_valid());
        assert_eq!((b.min[0], b.max[0]), (170.0, 200.0));

        // unit-less boxes stored inverted stay empty
        let plain = Geometry::Box(lon_box(1.0, 0.0)).envelope(&Traits::cartesian(2));
        assert!(!plain.is_valid());
    }

    #[test]
    fn test_expand_boxes_picks_narrow_side() {
        let mut a = lon_box(-10.0, 10.0);
        expand_box_angle(&mut a, &lon_box(-30.0, -20.0), Unit::Degree);
        assert_eq!((a.min[0], a.max[0]), (-30.0, 10.0));

        let mut a = lon_box(10.0, 20.0);
        expand_box_angle(&mut a, &lon_box(0.0, 50.0), Unit::Degree);
        assert_eq!((a.min[0], a.max[0]), (0.0, 50.0));

        let mut a = lon_box(0.0, 50.0);
        expand_box_angle(&mut a, &lon_box(20.0, 30.0), Unit::Degree);
        assert_eq!((a.min[0], a.max[0]), (0.0, 50.0));
    }

    #[test]
    fn test_expand_boxes_wraps_full_period() {
        let mut a = lon_box(-170.0, 0.0);
        expand_box_angle(&mut a, &lon_box(10.0, 175.0), Unit::Degree);
        assert!(a.max[0] - a.min[0] <= 360.0);
        assert!(a.max[0] - a.min[0] >= 345.0 - 1e-9);

        let mut a = lon_box(-90.0, 90.0);
        expand_box_angle(&mut a, &lon_box(80.0, 280.0), Unit::Degree);
        assert_eq!(a.max[0] - a.min[0], 360.0);
    }

    #[test]
    fn test_expand_point_prefers_nearer_side() {
        let mut b = GeoBox::inverse(2);
        expand_point_angle(&mut b, &Point::new(170.0, 0.0), Unit::Degree);
        expand_point_angle(&mut b, &Point::new(-175.0, 5.0), Unit::Degree);
        assert_eq!((b.min[0], b.max[0]), (170.0, 185.0));
        assert_eq!((b.min[1], b.max[1]), (0.0, 5.0));

        // exactly opposite: the minimum is extended
        let mut b = GeoBox::from_point(Point::new(0.0, 0.0));
        expand_point_angle(&mut b, &Point::new(180.0, 0.0), Unit::Degree);
        assert_eq!((b.min[0], b.max[0]), (-180.0, 0.0));
    }

    #[test]
    fn test_linestring_crossing_antimeridian() {
        let ls = Linestring(vec![Point::new(170.0, 0.0), Point::new(-170.0, 1.0), Point::new(-160.0, 2.0)]);
        let b = Geometry::Linestring(ls).envelope(&deg());
        assert_eq!((b.min[0], b.max[0]), (170.0, 200.0));
        assert_eq!((b.min[1], b.max[1]), (0.0, 2.0));
    }

    #[test]
    fn test_ring_around_pole_covers_full_period() {
        let ring = Ring(vec![
            Point::new(0.0, 85.0),
            Point::new(90.0, 85.0),
            Point::new(180.0, 85.0),
            Point::new(-90.0, 85.0),
        ]);
        let b = Geometry::Ring(ring).envelope(&deg());
        assert_eq!((b.min[0], b.max[0]), (-180.0, 180.0));
    }

    #[test]
    fn test_cartesian_envelope_is_plain() {
        let poly = Polygon {
            outer: Ring(vec![Point::new(170.0, 0.0), Point::new(-170.0, 0.0), Point::new(0.0, 5.0)]),
            inners: vec![],
        };
        let b = Geometry::MultiPolygon(Multi(vec![poly])).envelope(&Traits::cartesian(2));
        assert_eq!((b.min[0], b.max[0]), (-170.0, 170.0));
        assert_eq!((b.min[1], b.max[1]), (0.0, 5.0));
    }

    #[test]
    fn test_values_envelope() {
        let b = Geometry::Values(vec![3.0, -1.0, 2.0]).envelope(&Traits::cartesian(2));
        assert_eq!((b.min[0], b.max[0], b.min[1], b.max[1]), (0.0, 2.0, -1.0, 3.0));
    }
}
