//! Pole containment for closed rings on the sphere

use super::angle::{subtract_angle, to_radians};
use super::types::{Point, Traits, Unit};
use std::f64::consts::{FRAC_PI_2, PI};

/// Pole encircled by a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    None,
    North,
    South,
}

/// Signed excess of the spherical trapezoid between an edge and the equator
fn trapezoid_excess(dlon: f64, lat1: f64, lat2: f64) -> f64 {
    let t1 = (lat1 / 2.0).tan();
    let t2 = (lat2 / 2.0).tan();
    2.0 * ((dlon / 2.0).tan() * (t1 + t2) / (1.0 + t1 * t2)).atan()
}

/// Decide which pole, if any, a closed ring goes around
///
/// The ring encircles a pole when its longitudes sum to a full turn. The
/// sign of the summed trapezoid area relative to the direction of travel
/// then picks north or south.
pub fn ring_pole(points: &[Point], traits: &Traits) -> Pole {
    if traits.unit == Unit::None || points.len() < 3 {
        return Pole::None;
    }
    let latitude = |p: &Point| {
        let v = to_radians(p[1], traits.unit);
        if traits.is_equatorial() {
            v
        } else {
            FRAC_PI_2 - v
        }
    };

    let mut area = 0.0;
    let mut lon_sum = 0.0;
    let count = points.len();
    for i in 0..count {
        let p = &points[i];
        let q = &points[(i + 1) % count];
        let dlon = to_radians(subtract_angle(q[0], p[0], traits.unit), traits.unit);
        area += trapezoid_excess(dlon, latitude(p), latitude(q));
        lon_sum += dlon;
    }

    if lon_sum.abs() < PI {
        Pole::None
    } else if (area > 0.0) == (lon_sum > 0.0) {
        Pole::North
    } else {
        Pole::South
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::types::CoordinateSystem;

    fn ring_at(lat: f64) -> Vec<Point> {
        [0.0, 90.0, 180.0, -90.0].iter().map(|&lon| Point::new(lon, lat)).collect()
    }

    fn geo() -> Traits {
        Traits::new(2, CoordinateSystem::Geographic, Unit::Degree)
    }

    #[test]
    fn test_ring_around_north_pole() {
        assert_eq!(ring_pole(&ring_at(85.0), &geo()), Pole::North);
        let mut reversed = ring_at(85.0);
        reversed.reverse();
        assert_eq!(ring_pole(&reversed, &geo()), Pole::North);
    }

    #[test]
    fn test_ring_around_south_pole() {
        assert_eq!(ring_pole(&ring_at(-85.0), &geo()), Pole::South);
    }

    #[test]
    fn test_local_ring_has_no_pole() {
        let ring = vec![
            Point::new(170.0, 10.0),
            Point::new(-170.0, 10.0),
            Point::new(-170.0, 20.0),
            Point::new(170.0, 20.0),
        ];
        assert_eq!(ring_pole(&ring, &geo()), Pole::None);
        assert_eq!(ring_pole(&ring, &Traits::cartesian(2)), Pole::None);
    }

    #[test]
    fn test_polar_coordinates() {
        // colatitude 5 degrees is latitude 85
        let traits = Traits::new(2, CoordinateSystem::SphericalPolar, Unit::Radian);
        let ring: Vec<Point> = ring_at(5f64.to_radians())
            .into_iter()
            .map(|p| Point::new(p[0].to_radians(), p[1]))
            .collect();
        assert_eq!(ring_pole(&ring, &traits), Pole::North);
    }
}
