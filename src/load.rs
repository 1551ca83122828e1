//! Loading watched expressions as geometries
//!
//! The debugger reports the type of a watched expression; a matching
//! `UserType` says which members hold the coordinates. Points are decoded
//! through a struct plan, containers of points through a single array plan
//! over one memory read, and anything else element by element.

use crate::config::{resolve_member, ContainerKind, Settings, UserType, UserTypeKind};
use crate::convert::layout::{address_of, array_converter, primitive_struct_converter, value_converter};
use crate::convert::{
    classify, evaluate_valid, parse_double, parse_integer, parse_signed, read_values, Debugger, MemoryReader,
};
use crate::error::ConvertError;
use crate::geometry::{
    GeoBox, Geometry, Linestring, Multi, NSphere, Point, Polygon, Ring, Segment, Traits,
};
use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, trace};

/// Largest element count accepted from a container's size expression
pub const MAX_CONTAINER_SIZE: usize = 1 << 24;

/// A loaded geometry with the traits of its coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub geometry: Geometry,
    pub traits: Traits,
}

impl Loaded {
    pub fn new(geometry: Geometry, traits: Traits) -> Self {
        Self { geometry, traits }
    }
}

/// Decoded elements of a container
enum Sequence {
    Points(Vec<Point>, Traits),
    Values(Vec<f64>),
    Items(Vec<Loaded>),
}

/// `T [N]` array type spelling
fn parse_array_type(type_name: &str) -> Option<(&str, usize)> {
    let type_name = type_name.trim();
    let body = type_name.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let count = body[open + 1..].trim().parse().ok()?;
    Some((body[..open].trim(), count))
}

pub struct Loader<'a, D: ?Sized, R: ?Sized> {
    debugger: &'a D,
    reader: &'a R,
    settings: &'a Settings,
}

impl<'a, D: Debugger + ?Sized, R: MemoryReader + ?Sized> Loader<'a, D, R> {
    pub fn new(debugger: &'a D, reader: &'a R, settings: &'a Settings) -> Self {
        Self {
            debugger,
            reader,
            settings,
        }
    }

    /// Load the value of `expr` as a geometry
    pub fn load(&self, expr: &str) -> Result<Loaded> {
        let e = evaluate_valid(self.debugger, expr)?;
        debug!(expr, type_name = %e.type_name, "loading expression");

        if let Some(user_type) = self.settings.find_user_type(&e.type_name) {
            return self
                .load_user_type(expr, user_type)
                .with_context(|| format!("failed to load '{}' of type '{}'", expr, e.type_name));
        }
        if classify(self.debugger.dialect(), &e.type_name).is_some() {
            let value = self.read_primitive(expr)?;
            return Ok(Loaded::new(Geometry::Values(vec![value]), Traits::cartesian(2)));
        }
        if let Some((element_type, count)) = parse_array_type(&e.type_name) {
            trace!(expr, element_type, count, "loading fixed-size array");
            let sequence = self.load_sequence(expr, count)?;
            return sequence_geometry(sequence, ContainerKind::Linestring, Traits::cartesian(2));
        }
        bail!("no user type describes '{}' of type '{}'", expr, e.type_name)
    }

    fn member(&self, expr: &str, member: &str) -> String {
        resolve_member(self.debugger.dialect(), expr, member)
    }

    fn load_user_type(&self, expr: &str, user_type: &UserType) -> Result<Loaded> {
        let fallback_traits = Traits::new(2, user_type.coordinate_system, user_type.unit);
        match &user_type.kind {
            UserTypeKind::Point { members } => {
                let (point, traits) = self.read_point(expr, members, user_type)?;
                Ok(Loaded::new(Geometry::Point(point), traits))
            }
            UserTypeKind::Box { min, max } => {
                let (min, max, traits) = self.load_corners(expr, min, max)?;
                Ok(Loaded::new(Geometry::Box(GeoBox::new(min, max)), traits))
            }
            UserTypeKind::Segment { first, second } => {
                let (first, second, traits) = self.load_corners(expr, first, second)?;
                Ok(Loaded::new(Geometry::Segment(Segment::new(first, second)), traits))
            }
            UserTypeKind::NSphere { center, radius } => {
                let (center, traits) = self.load_point(&self.member(expr, center))?;
                let radius = self.read_primitive(&self.member(expr, radius))?;
                Ok(Loaded::new(Geometry::NSphere(NSphere { center, radius }), traits))
            }
            UserTypeKind::Container { data, size, kind } => {
                let count = self.read_count(&self.member(expr, size))?;
                let sequence = self.load_sequence(&self.member(expr, data), count)?;
                sequence_geometry(sequence, *kind, fallback_traits)
            }
            UserTypeKind::Polygon { outer, inners } => {
                let outer = self.load(&self.member(expr, outer))?;
                let traits = outer.traits;
                let outer = into_ring(outer.geometry)?;
                let inners = match inners {
                    Some(inners) => into_rings(self.load(&self.member(expr, inners))?.geometry)?,
                    None => Vec::new(),
                };
                Ok(Loaded::new(Geometry::Polygon(Polygon { outer, inners }), traits))
            }
        }
    }

    /// Load `expr` and require a point
    fn load_point(&self, expr: &str) -> Result<(Point, Traits)> {
        let loaded = self.load(expr)?;
        match loaded.geometry {
            Geometry::Point(p) => Ok((p, loaded.traits)),
            other => bail!("'{}' is a {}, expected a point", expr, other.kind_name()),
        }
    }

    /// Two points of a box or segment, which must share a dimension
    fn load_corners(&self, expr: &str, first: &str, second: &str) -> Result<(Point, Point, Traits)> {
        let (a, traits) = self.load_point(&self.member(expr, first))?;
        let (b, _) = self.load_point(&self.member(expr, second))?;
        if a.dimension() != b.dimension() {
            bail!(
                "'{}' has a {}-dimensional '{}' and a {}-dimensional '{}'",
                expr,
                a.dimension(),
                first,
                b.dimension(),
                second
            );
        }
        Ok((a, b, traits))
    }

    fn read_point(&self, expr: &str, members: &[String], user_type: &UserType) -> Result<(Point, Traits)> {
        if !(2..=3).contains(&members.len()) {
            bail!("point types need 2 or 3 members, got {}", members.len());
        }
        let converter = primitive_struct_converter::<f64, _>(self.debugger, expr, members)?;
        let address = address_of(self.debugger, expr)?;
        let values = read_values(self.reader, address, &converter)?;
        let point = Point::from_slice(&values).ok_or_else(|| anyhow!("'{}' decoded to {} values", expr, values.len()))?;
        Ok((point, Traits::new(members.len(), user_type.coordinate_system, user_type.unit)))
    }

    /// Value of a primitive expression, from memory when it has an address
    fn read_primitive(&self, expr: &str) -> Result<f64> {
        let converter = value_converter::<f64, _>(self.debugger, expr)?;
        match address_of(self.debugger, expr) {
            Ok(address) => Ok(read_values(self.reader, address, &converter)?[0]),
            Err(_) => {
                let e = evaluate_valid(self.debugger, expr)?;
                parse_double(&e.value, self.debugger.hex_display()).ok_or_else(|| {
                    ConvertError::InvalidValue {
                        expr: expr.to_string(),
                        value: e.value.clone(),
                    }
                    .into()
                })
            }
        }
    }

    fn read_count(&self, expr: &str) -> Result<usize> {
        let e = evaluate_valid(self.debugger, expr)?;
        let hex = self.debugger.hex_display();
        let count = parse_integer(&e.value, hex)
            .or_else(|| parse_signed(&e.value, hex).and_then(|v| u64::try_from(v).ok()))
            .ok_or_else(|| ConvertError::InvalidValue {
                expr: expr.to_string(),
                value: e.value.clone(),
            })?;
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count > MAX_CONTAINER_SIZE {
            bail!("'{}' reports {} elements, more than {}", expr, count, MAX_CONTAINER_SIZE);
        }
        Ok(count)
    }

    /// Decode `count` elements of the pointer or array expression `base`
    fn load_sequence(&self, base: &str, count: usize) -> Result<Sequence> {
        if count == 0 {
            return Ok(Sequence::Items(Vec::new()));
        }
        let dialect = self.debugger.dialect();
        let first = dialect.element(base, 0);
        let e = evaluate_valid(self.debugger, &first)?;

        if let Some(user_type) = self.settings.find_user_type(&e.type_name) {
            if let UserTypeKind::Point { members } = &user_type.kind {
                let dimension = members.len();
                if !(2..=3).contains(&dimension) {
                    bail!("point types need 2 or 3 members, got {}", dimension);
                }
                let element = primitive_struct_converter::<f64, _>(self.debugger, &first, members)?;
                let array = array_converter(self.debugger, &first, element, count)?;
                let address = address_of(self.debugger, &first)?;
                let values = read_values(self.reader, address, &array)?;
                debug!(base, count, bytes = array.byte_size(), "read point container");
                let points = values
                    .chunks_exact(dimension)
                    .filter_map(Point::from_slice)
                    .collect();
                let traits = Traits::new(dimension, user_type.coordinate_system, user_type.unit);
                return Ok(Sequence::Points(points, traits));
            }
        }

        if classify(dialect, &e.type_name).is_some() {
            let element = value_converter::<f64, _>(self.debugger, &first)?;
            let array = array_converter(self.debugger, &first, element, count)?;
            let address = address_of(self.debugger, &first)?;
            debug!(base, count, "read primitive container");
            return Ok(Sequence::Values(read_values(self.reader, address, &array)?));
        }

        let items = (0..count as u64)
            .map(|i| self.load(&dialect.element(base, i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Sequence::Items(items))
    }
}

/// Interpret decoded elements as the geometry a container kind describes
fn sequence_geometry(sequence: Sequence, kind: ContainerKind, fallback: Traits) -> Result<Loaded> {
    let (points, traits) = match sequence {
        Sequence::Values(values) => return Ok(Loaded::new(Geometry::Values(values), Traits::cartesian(2))),
        Sequence::Points(points, traits) => (points, traits),
        Sequence::Items(items) => {
            let traits = items.first().map(|l| l.traits).unwrap_or(fallback);
            let geometries = items.into_iter().map(|l| l.geometry);
            match kind {
                ContainerKind::MultiLinestring => {
                    let parts = geometries
                        .map(|g| into_ring(g).map(|r| Linestring(r.0)))
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(Loaded::new(Geometry::MultiLinestring(Multi(parts)), traits));
                }
                ContainerKind::MultiPolygon => {
                    let parts = geometries
                        .map(|g| match g {
                            Geometry::Polygon(p) => Ok(p),
                            other => into_ring(other).map(|outer| Polygon { outer, inners: Vec::new() }),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(Loaded::new(Geometry::MultiPolygon(Multi(parts)), traits));
                }
                _ => {
                    let points = geometries
                        .map(|g| match g {
                            Geometry::Point(p) => Ok(p),
                            other => Err(anyhow!("expected point elements, found a {}", other.kind_name())),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    (points, traits)
                }
            }
        }
    };

    let geometry = match kind {
        ContainerKind::Linestring => Geometry::Linestring(Linestring(points)),
        ContainerKind::Ring => Geometry::Ring(Ring(points)),
        ContainerKind::MultiPoint => Geometry::MultiPoint(Multi(points)),
        ContainerKind::MultiLinestring | ContainerKind::MultiPolygon => {
            bail!("a {:?} container cannot hold points directly", kind)
        }
    };
    Ok(Loaded::new(geometry, traits))
}

fn into_ring(geometry: Geometry) -> Result<Ring> {
    match geometry {
        Geometry::Ring(r) => Ok(r),
        Geometry::Linestring(ls) => Ok(Ring(ls.0)),
        other => bail!("expected a ring, found a {}", other.kind_name()),
    }
}

fn into_rings(geometry: Geometry) -> Result<Vec<Ring>> {
    match geometry {
        Geometry::MultiLinestring(parts) => Ok(parts.0.into_iter().map(|ls| Ring(ls.0)).collect()),
        Geometry::MultiPolygon(parts) => Ok(parts.0.into_iter().map(|p| p.outer).collect()),
        other => Ok(vec![into_ring(other)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserType;
    use crate::convert::{Dialect, Snapshot};
    use crate::geometry::{CoordinateSystem, Unit};

    fn f64_bytes(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.user_types.insert(
            "P".to_string(),
            UserType::new(UserTypeKind::Point { members: vec!["x".into(), "y".into()] }),
        );
        settings.user_types.insert(
            "G".to_string(),
            UserType::new(UserTypeKind::Point { members: vec!["lon".into(), "lat".into()] })
                .with_coordinates(CoordinateSystem::Geographic, Unit::Degree),
        );
        settings.user_types.insert(
            "Vec<*>".to_string(),
            UserType::new(UserTypeKind::Container {
                data: "data".into(),
                size: "size".into(),
                kind: ContainerKind::Linestring,
            }),
        );
        settings.user_types.insert(
            "Seg".to_string(),
            UserType::new(UserTypeKind::Segment { first: "a".into(), second: "b".into() }),
        );
        settings
    }

    /// `P p` at 0x1000 holding (1.5, -2.25)
    fn point_snapshot() -> Snapshot {
        let mut s = Snapshot::new(Dialect::Cpp);
        s.insert_variable("p", "P", 0x1000, 16);
        s.insert_variable("(p).x", "double", 0x1000, 8);
        s.insert_variable("(p).y", "double", 0x1008, 8);
        s.insert_memory(0x1000, f64_bytes(&[1.5, -2.25]));
        s
    }

    /// `Vec<G> v` whose data pointer is at 0x2000 with 3 elements
    fn container_snapshot() -> Snapshot {
        let mut s = Snapshot::new(Dialect::Cpp);
        s.insert_variable("v", "Vec<G>", 0x100, 16);
        s.insert_value("(v).size", "int", "3", 0x108, 4);
        s.insert_value("(v).data", "G *", "0x0000000000002000", 0x100, 8);
        for i in 0..3u64 {
            let base = 0x2000 + 16 * i;
            s.insert_variable(&format!("((v).data)[{}]", i), "G", base, 16);
            s.insert_variable(&format!("(((v).data)[{}]).lon", i), "double", base, 8);
            s.insert_variable(&format!("(((v).data)[{}]).lat", i), "double", base + 8, 8);
        }
        s.insert_memory(0x2000, f64_bytes(&[170.0, 10.0, -170.0, 10.0, -160.0, 20.0]));
        s
    }

    #[test]
    fn test_load_point() {
        let snapshot = point_snapshot();
        let settings = settings();
        let loaded = Loader::new(&snapshot, &snapshot, &settings).load("p").unwrap();
        assert_eq!(loaded.geometry, Geometry::Point(Point::new(1.5, -2.25)));
        assert_eq!(loaded.traits, Traits::cartesian(2));
    }

    #[test]
    fn test_load_point_container_in_one_read() {
        let snapshot = container_snapshot();
        let settings = settings();
        let loaded = Loader::new(&snapshot, &snapshot, &settings).load("v").unwrap();
        assert_eq!(loaded.traits, Traits::new(2, CoordinateSystem::Geographic, Unit::Degree));
        match loaded.geometry {
            Geometry::Linestring(ls) => {
                assert_eq!(ls.len(), 3);
                assert_eq!(ls[1], Point::new(-170.0, 10.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_segment_of_points() {
        let mut snapshot = Snapshot::new(Dialect::Cpp);
        snapshot.insert_variable("s", "Seg", 0x3000, 32);
        for (member, base) in [("a", 0x3000u64), ("b", 0x3010)] {
            let expr = format!("(s).{}", member);
            snapshot.insert_variable(&expr, "P", base, 16);
            snapshot.insert_variable(&format!("({}).x", expr), "double", base, 8);
            snapshot.insert_variable(&format!("({}).y", expr), "double", base + 8, 8);
        }
        snapshot.insert_memory(0x3000, f64_bytes(&[0.0, 1.0, 2.0, 3.0]));
        let settings = settings();
        let loaded = Loader::new(&snapshot, &snapshot, &settings).load("s").unwrap();
        assert_eq!(
            loaded.geometry,
            Geometry::Segment(Segment::new(Point::new(0.0, 1.0), Point::new(2.0, 3.0)))
        );
    }

    #[test]
    fn test_primitive_array_is_values() {
        let mut snapshot = Snapshot::new(Dialect::Cpp);
        snapshot.insert_variable("a", "int [4]", 0x500, 16);
        for i in 0..4u64 {
            snapshot.insert_variable(&format!("(a)[{}]", i), "int", 0x500 + 4 * i, 4);
        }
        let bytes: Vec<u8> = [3i32, -1, 4, 1].iter().flat_map(|v| v.to_le_bytes()).collect();
        snapshot.insert_memory(0x500, bytes);
        let settings = settings();
        let loaded = Loader::new(&snapshot, &snapshot, &settings).load("a").unwrap();
        assert_eq!(loaded.geometry, Geometry::Values(vec![3.0, -1.0, 4.0, 1.0]));
    }

    #[test]
    fn test_unknown_type_and_unreadable_memory() {
        let mut snapshot = point_snapshot();
        snapshot.insert_variable("q", "Mystery", 0x9000, 8);
        let settings = settings();
        let loader = Loader::new(&snapshot, &snapshot, &settings);
        assert!(loader.load("q").is_err());
        assert!(loader.load("missing").is_err());

        let empty = Snapshot::new(Dialect::Cpp);
        let err = Loader::new(&snapshot, &empty, &settings).load("p").unwrap_err();
        let convert = err.downcast_ref::<ConvertError>();
        assert!(matches!(convert, Some(ConvertError::MemoryUnavailable { address: 0x1000 })));
    }

    #[test]
    fn test_box_corners_must_share_dimension() {
        let mut settings = settings();
        settings.user_types.insert(
            "P3".to_string(),
            UserType::new(UserTypeKind::Point { members: vec!["x".into(), "y".into(), "z".into()] }),
        );
        settings.user_types.insert(
            "Bx".to_string(),
            UserType::new(UserTypeKind::Box { min: "lo".into(), max: "hi".into() }),
        );

        let mut snapshot = Snapshot::new(Dialect::Cpp);
        snapshot.insert_variable("b", "Bx", 0x6000, 40);
        snapshot.insert_variable("(b).lo", "P3", 0x6000, 24);
        for (i, m) in ["x", "y", "z"].iter().enumerate() {
            snapshot.insert_variable(&format!("((b).lo).{}", m), "double", 0x6000 + 8 * i as u64, 8);
        }
        snapshot.insert_variable("(b).hi", "P", 0x6018, 16);
        snapshot.insert_variable("((b).hi).x", "double", 0x6018, 8);
        snapshot.insert_variable("((b).hi).y", "double", 0x6020, 8);
        snapshot.insert_memory(0x6000, f64_bytes(&[0.0, 0.0, 0.0, 1.0, 1.0]));

        let err = Loader::new(&snapshot, &snapshot, &settings).load("b").unwrap_err();
        assert!(format!("{:#}", err).contains("3-dimensional"), "{:#}", err);
    }

    #[test]
    fn test_parse_array_type() {
        assert_eq!(parse_array_type("double [12]"), Some(("double", 12)));
        assert_eq!(parse_array_type("P[3]"), Some(("P", 3)));
        assert_eq!(parse_array_type("P"), None);
    }
}
