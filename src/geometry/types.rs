//! Core geometry entities
//!
//! Every entity is a plain value type. Coordinate 0 of a geometry whose
//! `Traits::unit` is not `Unit::None` is periodic.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut, Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    #[default]
    Cartesian,
    SphericalPolar,
    SphericalEquatorial,
    Geographic,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    None,
    Radian,
    Degree,
}

/// Dimension, coordinate system and angular unit of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Traits {
    pub dimension: usize,
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
    #[serde(default)]
    pub unit: Unit,
}

impl Traits {
    pub fn new(dimension: usize, coordinate_system: CoordinateSystem, unit: Unit) -> Self {
        Self {
            dimension,
            coordinate_system,
            unit,
        }
    }

    pub fn cartesian(dimension: usize) -> Self {
        Self::new(dimension, CoordinateSystem::Cartesian, Unit::None)
    }

    pub fn is_periodic(&self) -> bool {
        self.unit != Unit::None
    }

    /// Latitude measured from the equator (as opposed to from the pole)
    pub fn is_equatorial(&self) -> bool {
        matches!(
            self.coordinate_system,
            CoordinateSystem::SphericalEquatorial | CoordinateSystem::Geographic
        )
    }

    pub fn is_spherical(&self) -> bool {
        matches!(
            self.coordinate_system,
            CoordinateSystem::SphericalPolar | CoordinateSystem::SphericalEquatorial | CoordinateSystem::Geographic
        )
    }
}

impl Default for Traits {
    fn default() -> Self {
        Self::cartesian(2)
    }
}

/// Point with 2 or 3 coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    coords: [f64; 3],
    dimension: usize,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            coords: [x, y, 0.0],
            dimension: 2,
        }
    }

    pub fn new3(x: f64, y: f64, z: f64) -> Self {
        Self {
            coords: [x, y, z],
            dimension: 3,
        }
    }

    /// Point from decoded coordinates, `None` unless 2 or 3 values are given
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x, y] => Some(Self::new(*x, *y)),
            [x, y, z] => Some(Self::new3(*x, *y, *z)),
            _ => None,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords[..self.dimension]
    }

    pub fn x(&self) -> f64 {
        self.coords[0]
    }

    pub fn y(&self) -> f64 {
        self.coords[1]
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.coords[0] = x;
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.coords[1] = y;
        self
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.coords()[i]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.coords[..self.dimension][i]
    }
}

/// Closed range of values; `{+inf, -inf}` is the empty accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn inverse() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    pub fn expand(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    pub fn expand_interval(&mut self, other: &Interval) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Axis-aligned box; valid iff `min[i] <= max[i]` in every dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
    pub min: Point,
    pub max: Point,
}

impl GeoBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_point(p: Point) -> Self {
        Self { min: p, max: p }
    }

    /// Empty accumulator of the given dimension
    pub fn inverse(dimension: usize) -> Self {
        let make = |v: f64| {
            if dimension >= 3 {
                Point::new3(v, v, v)
            } else {
                Point::new(v, v)
            }
        };
        Self {
            min: make(f64::INFINITY),
            max: make(f64::NEG_INFINITY),
        }
    }

    /// Dimensions shared by both corners
    pub fn dimension(&self) -> usize {
        self.min.dimension().min(self.max.dimension())
    }

    pub fn is_valid(&self) -> bool {
        (0..self.dimension()).all(|i| self.min[i] <= self.max[i])
    }

    /// Extent along dimension `i`
    pub fn dim(&self, i: usize) -> f64 {
        self.max[i] - self.min[i]
    }

    pub fn interval(&self, i: usize) -> Interval {
        Interval::new(self.min[i], self.max[i])
    }

    pub fn centroid(&self) -> Point {
        let mut c = self.min;
        for i in 0..self.dimension() {
            c[i] = (self.min[i] + self.max[i]) * 0.5;
        }
        c
    }

    pub fn set_interval(&mut self, i: usize, interval: Interval) {
        self.min[i] = interval.min;
        self.max[i] = interval.max;
    }
}

/// Two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment(pub [Point; 2]);

impl Segment {
    pub fn new(first: Point, second: Point) -> Self {
        Self([first, second])
    }
}

impl Index<usize> for Segment {
    type Output = Point;

    fn index(&self, i: usize) -> &Point {
        &self.0[i]
    }
}

impl IndexMut<usize> for Segment {
    fn index_mut(&mut self, i: usize) -> &mut Point {
        &mut self.0[i]
    }
}

/// Circle or sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NSphere {
    pub center: Point,
    pub radius: f64,
}

/// Open sequence of points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Linestring(pub Vec<Point>);

/// Sequence of points forming an implicitly closed boundary
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ring(pub Vec<Point>);

impl Deref for Linestring {
    type Target = Vec<Point>;
    fn deref(&self) -> &Vec<Point> {
        &self.0
    }
}

impl DerefMut for Linestring {
    fn deref_mut(&mut self) -> &mut Vec<Point> {
        &mut self.0
    }
}

impl Deref for Ring {
    type Target = Vec<Point>;
    fn deref(&self) -> &Vec<Point> {
        &self.0
    }
}

impl DerefMut for Ring {
    fn deref_mut(&mut self) -> &mut Vec<Point> {
        &mut self.0
    }
}

impl From<Vec<Point>> for Linestring {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

impl From<Vec<Point>> for Ring {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

/// Outer ring with holes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub outer: Ring,
    pub inners: Vec<Ring>,
}

/// Ordered collection of geometries of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct Multi<G>(pub Vec<G>);

impl<G> Default for Multi<G> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<G> Deref for Multi<G> {
    type Target = Vec<G>;
    fn deref(&self) -> &Vec<G> {
        &self.0
    }
}

impl<G> DerefMut for Multi<G> {
    fn deref_mut(&mut self) -> &mut Vec<G> {
        &mut self.0
    }
}

pub type MultiPoint = Multi<Point>;
pub type MultiLinestring = Multi<Linestring>;
pub type MultiPolygon = Multi<Polygon>;

/// Any decoded entity
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Box(GeoBox),
    Segment(Segment),
    NSphere(NSphere),
    Linestring(Linestring),
    Ring(Ring),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLinestring(MultiLinestring),
    MultiPolygon(MultiPolygon),
    /// Numeric sequence plotted as (index, value)
    Values(Vec<f64>),
}

impl Geometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::Box(_) => "box",
            Geometry::Segment(_) => "segment",
            Geometry::NSphere(_) => "nsphere",
            Geometry::Linestring(_) => "linestring",
            Geometry::Ring(_) => "ring",
            Geometry::Polygon(_) => "polygon",
            Geometry::MultiPoint(_) => "multipoint",
            Geometry::MultiLinestring(_) => "multilinestring",
            Geometry::MultiPolygon(_) => "multipolygon",
            Geometry::Values(_) => "values",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_indexing() {
        let mut p = Point::new(1.0, 2.0);
        p[1] = 5.0;
        assert_eq!(p.coords(), &[1.0, 5.0]);
        assert_eq!(Point::from_slice(&[1.0, 2.0, 3.0]).map(|p| p.dimension()), Some(3));
        assert!(Point::from_slice(&[1.0]).is_none());
    }

    #[test]
    fn test_inverse_box_is_invalid() {
        let b = GeoBox::inverse(2);
        assert!(!b.is_valid());
        let b = GeoBox::new(Point::new(0.0, 0.0), Point::new(2.0, 4.0));
        assert!(b.is_valid());
        assert_eq!(b.centroid(), Point::new(1.0, 2.0));
        assert_eq!(b.dim(1), 4.0);
    }

    #[test]
    fn test_box_with_mixed_corner_dimensions() {
        let b = GeoBox::new(Point::new3(0.0, 0.0, 0.0), Point::new(1.0, 1.0));
        assert_eq!(b.dimension(), 2);
        assert!(b.is_valid());
        assert_eq!(b.centroid()[1], 0.5);
        assert!(Geometry::Box(b).envelope(&Traits::cartesian(2)).is_valid());
    }

    #[test]
    fn test_interval_accumulates() {
        let mut i = Interval::inverse();
        assert!(i.is_empty());
        i.expand(3.0);
        i.expand(-1.0);
        assert_eq!(i, Interval::new(-1.0, 3.0));
    }
}
