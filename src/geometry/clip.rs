//! Containment, intersection and line clipping against boxes

use super::angle::{full_angle, normalized_angle_unsigned};
use super::types::{GeoBox, Point, Segment, Unit};

/// Point inside or on the boundary of a box
pub fn covered_by(p: &Point, b: &GeoBox) -> bool {
    (0..b.dimension().min(p.dimension())).all(|i| b.min[i] <= p[i] && p[i] <= b.max[i])
}

/// `covered_by` with a periodic coordinate 0
pub fn covered_by_angle(p: &Point, b: &GeoBox, unit: Unit) -> bool {
    if unit == Unit::None {
        return covered_by(p, b);
    }
    let width = b.max[0] - b.min[0];
    let x_ok = width >= full_angle(unit) || normalized_angle_unsigned(p[0] - b.min[0], unit) <= width;
    x_ok && (1..b.dimension().min(p.dimension())).all(|i| b.min[i] <= p[i] && p[i] <= b.max[i])
}

/// Boxes share at least one point
pub fn intersects(a: &GeoBox, b: &GeoBox) -> bool {
    (0..a.dimension().min(b.dimension())).all(|i| a.min[i] <= b.max[i] && b.min[i] <= a.max[i])
}

/// `intersects` with a periodic coordinate 0
pub fn intersects_angle(a: &GeoBox, b: &GeoBox, unit: Unit) -> bool {
    if unit == Unit::None {
        return intersects(a, b);
    }
    let wa = a.max[0] - a.min[0];
    let wb = b.max[0] - b.min[0];
    let x_ok = normalized_angle_unsigned(b.min[0] - a.min[0], unit) <= wa
        || normalized_angle_unsigned(a.min[0] - b.min[0], unit) <= wb;
    x_ok && (1..a.dimension().min(b.dimension())).all(|i| a.min[i] <= b.max[i] && b.min[i] <= a.max[i])
}

/// Parametric range `[t_near, t_far]` of the line `p0 + t (p1 - p0)` inside
/// the box, restricted to `0 <= t <= 1`
pub fn segment_box_parameters(p0: &Point, p1: &Point, b: &GeoBox) -> Option<(f64, f64)> {
    let mut t_near = 0.0f64;
    let mut t_far = 1.0f64;
    for i in 0..b.dimension().min(p0.dimension()) {
        let d = p1[i] - p0[i];
        if d == 0.0 {
            if p0[i] < b.min[i] || p0[i] > b.max[i] {
                return None;
            }
            continue;
        }
        let mut t0 = (b.min[i] - p0[i]) / d;
        let mut t1 = (b.max[i] - p0[i]) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }
    Some((t_near, t_far))
}

pub fn intersects_segment(s: &Segment, b: &GeoBox) -> bool {
    segment_box_parameters(&s[0], &s[1], b).is_some()
}

/// Part of the segment inside the box
pub fn clip_segment(s: &Segment, b: &GeoBox) -> Option<Segment> {
    let (t0, t1) = segment_box_parameters(&s[0], &s[1], b)?;
    let at = |t: f64| {
        let mut p = s[0];
        for i in 0..p.dimension() {
            p[i] = s[0][i] + t * (s[1][i] - s[0][i]);
        }
        p
    };
    Some(Segment::new(at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> GeoBox {
        GeoBox::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0))
    }

    #[test]
    fn test_clip_diagonal() {
        let s = Segment::new(Point::new(-1.0, -1.0), Point::new(2.0, 2.0));
        let c = clip_segment(&s, &unit_box()).unwrap();
        assert!((c[0][0]).abs() < 1e-12 && (c[1][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_misses() {
        let s = Segment::new(Point::new(-1.0, 2.0), Point::new(2.0, 2.0));
        assert!(!intersects_segment(&s, &unit_box()));
        let s = Segment::new(Point::new(2.0, -1.0), Point::new(3.0, 0.5));
        assert!(clip_segment(&s, &unit_box()).is_none());
    }

    #[test]
    fn test_periodic_containment() {
        let b = GeoBox::new(Point::new(170.0, -10.0), Point::new(200.0, 10.0));
        assert!(covered_by_angle(&Point::new(-170.0, 0.0), &b, Unit::Degree));
        assert!(!covered_by_angle(&Point::new(-150.0, 0.0), &b, Unit::Degree));
        assert!(!covered_by(&Point::new(-170.0, 0.0), &b));

        let other = GeoBox::new(Point::new(-175.0, 0.0), Point::new(-160.0, 5.0));
        assert!(intersects_angle(&b, &other, Unit::Degree));
        assert!(!intersects(&b, &other));
    }
}
