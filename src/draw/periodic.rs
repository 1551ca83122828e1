//! Drawing support for periodic coordinates
//!
//! A geometry stored with longitudes in `[-180, 180]` may need several copies,
//! shifted by whole periods, to cover a viewport that crosses the
//! antimeridian. Edges whose unwrapped path differs from the stored
//! coordinates are drawn dashed.

use super::tessellation::PixelPoint;
use crate::geometry::{
    full_angle, half_angle, normalized_angle_signed, subtract_angle, Interval, Point, Pole, Traits, Unit,
};

/// Stroke style of one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Solid,
    Dashed,
}

/// Unwrapped points plus the style of each edge between consecutive points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledPath {
    pub points: Vec<Point>,
    pub styles: Vec<EdgeStyle>,
}

impl StyledPath {
    pub fn interval_x(&self) -> Interval {
        let mut i = Interval::inverse();
        for p in &self.points {
            i.expand(p[0]);
        }
        i
    }

    pub fn translated(&self, dx: f64) -> StyledPath {
        StyledPath {
            points: self.points.iter().map(|p| p.with_x(p[0] + dx)).collect(),
            styles: self.styles.clone(),
        }
    }

    /// Shift so the first point lies within half a period of `x`
    pub fn align_to(&mut self, x: f64, unit: Unit) {
        if let Some(first) = self.points.first() {
            let target = x + normalized_angle_signed(first[0] - x, unit);
            let dx = target - first[0];
            if dx != 0.0 {
                for p in &mut self.points {
                    p[0] += dx;
                }
            }
        }
    }
}

/// Offsets, in whole periods, at which a copy of `geometry` overlaps `visible`
///
/// Walks left and then right from the untranslated copy. Either walk stops
/// once the copy has moved past the visible range or shifting by a period no
/// longer changes the copy's bounds because of float magnitude.
pub fn replication_offsets(geometry: &Interval, visible: &Interval, unit: Unit) -> Vec<f64> {
    if geometry.is_empty() || visible.is_empty() {
        return Vec::new();
    }
    let period = full_angle(unit);
    if !period.is_finite() {
        return if geometry.intersects(visible) { vec![0.0] } else { Vec::new() };
    }

    let mut left = Vec::new();
    let (mut lo, mut hi, mut t) = (geometry.min, geometry.max, 0.0f64);
    while hi >= visible.min {
        if lo <= visible.max {
            left.push(t);
        }
        let (next_lo, next_hi) = (lo - period, hi - period);
        if next_lo == lo || next_hi == hi {
            break;
        }
        lo = next_lo;
        hi = next_hi;
        t -= period;
    }

    let mut offsets: Vec<f64> = left.into_iter().rev().collect();
    let (mut lo, mut hi, mut t) = (geometry.min + period, geometry.max + period, period);
    if lo == geometry.min || hi == geometry.max {
        return offsets;
    }
    while lo <= visible.max {
        if hi >= visible.min {
            offsets.push(t);
        }
        let (next_lo, next_hi) = (lo + period, hi + period);
        if next_lo == lo || next_hi == hi {
            break;
        }
        lo = next_lo;
        hi = next_hi;
        t += period;
    }
    offsets
}

/// Unwrap coordinate 0 of a path and style each edge
///
/// A closed path gets an explicit closing point, which for a ring around a
/// pole ends one period away from the first point. An edge is dashed when
/// its stored delta differs from the unwrapped one.
pub fn unwrap_path(points: &[Point], closed: bool, unit: Unit) -> StyledPath {
    let mut out = StyledPath::default();
    let first = match points.first() {
        Some(p) => *p,
        None => return out,
    };
    out.points.push(first);

    let count = points.len();
    let edges = if closed && count > 1 { count } else { count - 1 };
    let mut prev = first;
    for i in 0..edges {
        let raw = &points[i];
        let next_raw = &points[(i + 1) % count];
        let stored = next_raw[0] - raw[0];
        let delta = subtract_angle(next_raw[0], raw[0], unit);
        let next = next_raw.with_x(prev[0] + delta);
        out.styles.push(if (stored - delta).abs() > edge_tolerance(unit) {
            EdgeStyle::Dashed
        } else {
            EdgeStyle::Solid
        });
        out.points.push(next);
        prev = next;
    }
    out
}

fn edge_tolerance(unit: Unit) -> f64 {
    if unit == Unit::None {
        0.0
    } else {
        half_angle(unit) * 1e-9
    }
}

/// Coordinate 1 of a pole in the given coordinate system
pub fn pole_coordinate(pole: Pole, traits: &Traits) -> Option<f64> {
    let quarter = half_angle(traits.unit) / 2.0;
    match (pole, traits.is_equatorial()) {
        (Pole::None, _) => None,
        (Pole::North, true) => Some(quarter),
        (Pole::South, true) => Some(-quarter),
        (Pole::North, false) => Some(0.0),
        (Pole::South, false) => Some(2.0 * quarter),
    }
}

/// Fill boundary of a ring around a pole, in pixels
///
/// The unwrapped ring spans a full period. Two extra points pinned at
/// `edge_y` (the raster edge on the pole's side) close it into a simple
/// polygon that covers the pole.
pub fn pole_fill_outline(path: &[PixelPoint], edge_y: f32) -> Vec<PixelPoint> {
    let mut outline = path.to_vec();
    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        outline.push(PixelPoint::new(last.x, edge_y));
        outline.push(PixelPoint::new(first.x, edge_y));
    }
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_for_plain_overlap() {
        let offsets = replication_offsets(&Interval::new(-10.0, 10.0), &Interval::new(-180.0, 180.0), Unit::Degree);
        assert_eq!(offsets, vec![0.0]);
    }

    #[test]
    fn test_offsets_reach_shifted_copy() {
        // visible range crosses the antimeridian, geometry stored east of it
        let offsets = replication_offsets(&Interval::new(-175.0, -170.0), &Interval::new(170.0, 200.0), Unit::Degree);
        assert_eq!(offsets, vec![360.0]);
    }

    #[test]
    fn test_offsets_wide_view() {
        let offsets = replication_offsets(&Interval::new(0.0, 10.0), &Interval::new(-400.0, 400.0), Unit::Degree);
        assert_eq!(offsets, vec![-360.0, 0.0, 360.0]);
    }

    #[test]
    fn test_offsets_stop_when_not_advancing() {
        let geometry = Interval::new(1e300, 1e300);
        let visible = Interval::new(-1e300, 1e300);
        let offsets = replication_offsets(&geometry, &visible, Unit::Degree);
        assert_eq!(offsets, vec![0.0]);
    }

    #[test]
    fn test_offsets_without_period() {
        let offsets = replication_offsets(&Interval::new(0.0, 1.0), &Interval::new(0.5, 3.0), Unit::None);
        assert_eq!(offsets, vec![0.0]);
        assert!(replication_offsets(&Interval::new(0.0, 1.0), &Interval::new(2.0, 3.0), Unit::None).is_empty());
    }

    #[test]
    fn test_unwrap_marks_wrapped_edge() {
        let pts = vec![Point::new(170.0, 0.0), Point::new(-170.0, 0.0), Point::new(-160.0, 5.0)];
        let path = unwrap_path(&pts, false, Unit::Degree);
        let xs: Vec<f64> = path.points.iter().map(|p| p[0]).collect();
        assert_eq!(xs, vec![170.0, 190.0, 200.0]);
        assert_eq!(path.styles, vec![EdgeStyle::Dashed, EdgeStyle::Solid]);
    }

    #[test]
    fn test_half_period_edge_agrees_with_envelope() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(180.0, 10.0)];
        let traits = Traits::new(2, crate::geometry::CoordinateSystem::Geographic, Unit::Degree);
        let envelope = crate::geometry::aabb(&pts, false, &traits);
        let path = unwrap_path(&pts, false, Unit::Degree);
        let drawn = path.interval_x();
        assert_eq!((drawn.min, drawn.max), (-180.0, 0.0));
        assert_eq!((envelope.min[0], envelope.max[0]), (drawn.min, drawn.max));
    }

    #[test]
    fn test_unwrap_pole_ring() {
        let pts: Vec<Point> = [0.0, 90.0, 180.0, -90.0].iter().map(|&x| Point::new(x, 80.0)).collect();
        let path = unwrap_path(&pts, true, Unit::Degree);
        assert_eq!(path.points.len(), 5);
        assert_eq!(path.points[4][0], 360.0);
        assert_eq!(path.interval_x().length(), 360.0);

        let pixels: Vec<PixelPoint> = path.points.iter().map(|p| PixelPoint::new(p[0] as f32, p[1] as f32)).collect();
        let outline = pole_fill_outline(&pixels, 0.0);
        assert_eq!(outline.len(), 7);
        assert_eq!(outline[5], PixelPoint::new(360.0, 0.0));
        assert_eq!(outline[6], PixelPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_cartesian_edges_are_solid() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(500.0, 0.0), Point::new(500.0, 1.0)];
        let path = unwrap_path(&pts, true, Unit::None);
        assert!(path.styles.iter().all(|s| *s == EdgeStyle::Solid));
        assert_eq!(path.points.last(), Some(&pts[0]));
    }

    #[test]
    fn test_pole_coordinates() {
        let geo = Traits::new(2, crate::geometry::CoordinateSystem::Geographic, Unit::Degree);
        let polar = Traits::new(2, crate::geometry::CoordinateSystem::SphericalPolar, Unit::Radian);
        assert_eq!(pole_coordinate(Pole::North, &geo), Some(90.0));
        assert_eq!(pole_coordinate(Pole::South, &polar), Some(std::f64::consts::PI));
        assert_eq!(pole_coordinate(Pole::None, &geo), None);
    }

    #[test]
    fn test_align_to_reference() {
        let mut path = unwrap_path(&[Point::new(-175.0, 0.0), Point::new(-170.0, 0.0)], false, Unit::Degree);
        path.align_to(170.0, Unit::Degree);
        assert_eq!(path.points[0][0], 185.0);
        assert_eq!(path.translated(-360.0).points[1][0], -170.0);
    }
}
