//! Geometry to triangles
//!
//! Every variant is turned into a fill mesh and a stroke mesh in pixel space.
//! Periodic geometries are unwrapped, densified along great circles when the
//! coordinate system is spherical, and replicated once per visible period.

use super::canvas::Canvas;
use super::colors::with_alpha;
use super::local_cs::LocalCS;
use super::periodic::{pole_coordinate, pole_fill_outline, replication_offsets, unwrap_path, EdgeStyle, StyledPath};
use super::tessellation::{
    dash_polyline, tessellate_polygon, tessellate_polyline, tessellate_square, LineEnd, Mesh, PixelPoint, DASH_GAP,
    DASH_LENGTH,
};
use crate::geometry::{
    densify_spherical, ring_pole, unwrapped_box, GeoBox, Geometry, Interval, NSphere, Point, Polygon, Traits, Unit,
};
use rayon::prelude::*;
use std::env;
use std::f64::consts::PI;
use tracing::debug;

/// Vertices used to outline an n-sphere
const NSPHERE_SEGMENTS: usize = 64;

/// Per-item drawing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: [f32; 4],
    pub line_width: f32,
    pub fill_alpha: f32,
    pub point_size: f32,
    /// Longest great-circle step before densifying, in degrees
    pub densify_threshold_deg: f64,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            line_width: 1.5,
            fill_alpha: 0.25,
            point_size: 5.0,
            densify_threshold_deg: 2.0,
        }
    }
}

/// Fill and stroke triangles of one geometry
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    pub fill: Mesh,
    pub stroke: Mesh,
}

impl Shapes {
    pub fn extend(&mut self, other: Shapes) {
        self.fill.extend(other.fill);
        self.stroke.extend(other.stroke);
    }

    pub fn triangle_count(&self) -> usize {
        self.fill.triangle_count() + self.stroke.triangle_count()
    }
}

fn should_debug_item(name: &str) -> bool {
    match env::var("GEOMETRY_WATCH_DEBUG_DRAW") {
        Ok(val) => {
            if val.trim().is_empty() {
                true
            } else {
                val.split(',').any(|entry| entry.trim() == name)
            }
        }
        Err(_) => false,
    }
}

pub struct Drawer<'a> {
    cs: &'a LocalCS,
    visible: GeoBox,
    traits: Traits,
}

impl<'a> Drawer<'a> {
    /// `visible` is the geometry-space box shown by `cs`
    pub fn new(cs: &'a LocalCS, visible: GeoBox, traits: Traits) -> Self {
        Self { cs, visible, traits }
    }

    /// Draw a geometry onto the canvas, returning the number of triangles
    pub fn draw(&self, canvas: &mut Canvas, name: &str, geometry: &Geometry, style: &DrawStyle) -> usize {
        let shapes = self.shapes(geometry, style);
        if should_debug_item(name) {
            debug!(
                item = name,
                kind = geometry.kind_name(),
                fill_triangles = shapes.fill.triangle_count(),
                stroke_triangles = shapes.stroke.triangle_count(),
                "tessellated item"
            );
        }
        canvas.fill_mesh(&shapes.fill, with_alpha(style.color, style.fill_alpha));
        canvas.fill_mesh(&shapes.stroke, style.color);
        shapes.triangle_count()
    }

    /// Tessellate a geometry without drawing it
    pub fn shapes(&self, geometry: &Geometry, style: &DrawStyle) -> Shapes {
        match geometry {
            Geometry::Point(p) => self.point_shapes(p, style),
            Geometry::Box(b) => self.box_shapes(b, style),
            Geometry::Segment(s) => self.path_shapes(&s.0, style),
            Geometry::NSphere(s) => self.nsphere_shapes(s, style),
            Geometry::Linestring(ls) => self.path_shapes(ls, style),
            Geometry::Ring(r) => self.area_shapes(r, &[], style),
            Geometry::Polygon(poly) => self.polygon_shapes(poly, style),
            Geometry::MultiPoint(mp) => combine(mp.par_iter().map(|p| self.point_shapes(p, style)).collect()),
            Geometry::MultiLinestring(mls) => {
                combine(mls.par_iter().map(|ls| self.path_shapes(ls, style)).collect())
            }
            Geometry::MultiPolygon(mpoly) => {
                combine(mpoly.par_iter().map(|poly| self.polygon_shapes(poly, style)).collect())
            }
            Geometry::Values(values) => self.values_shapes(values, style),
        }
    }

    fn unit(&self) -> Unit {
        self.traits.unit
    }

    fn offsets(&self, interval: &Interval) -> Vec<f64> {
        replication_offsets(interval, &self.visible.interval(0), self.unit())
    }

    fn to_pixels(&self, points: &[Point], dx: f64) -> Vec<PixelPoint> {
        points
            .iter()
            .map(|p| PixelPoint::new(self.cs.convert_x(p[0] + dx) as f32, self.cs.convert_y(p[1]) as f32))
            .collect()
    }

    fn densify(&self, path: StyledPath, style: &DrawStyle) -> StyledPath {
        if !self.traits.is_spherical() || path.points.len() < 2 {
            return path;
        }
        let threshold = match self.unit() {
            Unit::Radian => style.densify_threshold_deg.to_radians(),
            _ => style.densify_threshold_deg,
        };
        let mut out = StyledPath {
            points: vec![path.points[0]],
            styles: Vec::new(),
        };
        for (w, edge_style) in path.points.windows(2).zip(&path.styles) {
            for p in densify_spherical(&w[0], &w[1], threshold, &self.traits) {
                out.points.push(p);
                out.styles.push(*edge_style);
            }
            out.points.push(w[1]);
            out.styles.push(*edge_style);
        }
        out
    }

    /// Stroke runs of equally styled edges, dashing the uncertain ones
    fn stroke(&self, mesh: &mut Mesh, path: &StyledPath, dx: f64, style: &DrawStyle) {
        let pixels = self.to_pixels(&path.points, dx);
        let mut start = 0;
        while start < path.styles.len() {
            let edge_style = path.styles[start];
            let mut end = start;
            while end < path.styles.len() && path.styles[end] == edge_style {
                end += 1;
            }
            let run = &pixels[start..=end];
            match edge_style {
                EdgeStyle::Solid => mesh.append(tessellate_polyline(run, style.line_width, LineEnd::Round)),
                EdgeStyle::Dashed => {
                    for piece in dash_polyline(run, DASH_LENGTH, DASH_GAP) {
                        mesh.append(tessellate_polyline(&piece, style.line_width, LineEnd::Butt));
                    }
                }
            }
            start = end;
        }
    }

    fn point_shapes(&self, p: &Point, style: &DrawStyle) -> Shapes {
        let mut shapes = Shapes::default();
        for dx in self.offsets(&Interval::new(p[0], p[0])) {
            let px = self.to_pixels(std::slice::from_ref(p), dx)[0];
            shapes.stroke.append(tessellate_square(px, style.point_size / 2.0));
        }
        shapes
    }

    fn box_shapes(&self, b: &GeoBox, style: &DrawStyle) -> Shapes {
        let b = unwrapped_box(b, self.unit());
        let corners = [
            Point::new(b.min[0], b.min[1]),
            Point::new(b.max[0], b.min[1]),
            Point::new(b.max[0], b.max[1]),
            Point::new(b.min[0], b.max[1]),
        ];
        let path = unwrap_path(&corners, true, Unit::None);
        let mut shapes = Shapes::default();
        for dx in self.offsets(&b.interval(0)) {
            let pixels = self.to_pixels(&corners, dx);
            shapes.fill.append(tessellate_polygon(&pixels, &[]));
            self.stroke(&mut shapes.stroke, &path, dx, style);
        }
        shapes
    }

    fn nsphere_shapes(&self, s: &NSphere, style: &DrawStyle) -> Shapes {
        let rim: Vec<Point> = (0..NSPHERE_SEGMENTS)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / NSPHERE_SEGMENTS as f64;
                Point::new(s.center[0] + s.radius * angle.cos(), s.center[1] + s.radius * angle.sin())
            })
            .collect();
        let path = unwrap_path(&rim, true, Unit::None);
        let mut shapes = Shapes::default();
        let interval = Interval::new(s.center[0] - s.radius, s.center[0] + s.radius);
        for dx in self.offsets(&interval) {
            shapes.fill.append(tessellate_polygon(&self.to_pixels(&rim, dx), &[]));
            self.stroke(&mut shapes.stroke, &path, dx, style);
        }
        shapes
    }

    fn path_shapes(&self, points: &[Point], style: &DrawStyle) -> Shapes {
        let mut shapes = Shapes::default();
        if points.len() == 1 {
            return self.point_shapes(&points[0], style);
        }
        let path = self.densify(unwrap_path(points, false, self.unit()), style);
        for dx in self.offsets(&path.interval_x()) {
            self.stroke(&mut shapes.stroke, &path, dx, style);
        }
        shapes
    }

    fn polygon_shapes(&self, poly: &Polygon, style: &DrawStyle) -> Shapes {
        let inners: Vec<&[Point]> = poly.inners.iter().map(|r| r.as_slice()).collect();
        self.area_shapes(&poly.outer, &inners, style)
    }

    /// Filled and outlined ring with optional holes
    ///
    /// A ring around a pole is filled out to the raster edge beyond the pole.
    fn area_shapes(&self, outer: &[Point], inners: &[&[Point]], style: &DrawStyle) -> Shapes {
        if outer.len() < 3 {
            return self.path_shapes(outer, style);
        }
        let outer_path = self.densify(unwrap_path(outer, true, self.unit()), style);
        let inner_paths: Vec<StyledPath> = inners
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| {
                let mut path = unwrap_path(r, true, self.unit());
                path.align_to(outer[0][0], self.unit());
                self.densify(path, style)
            })
            .collect();

        let edge_y = pole_coordinate(ring_pole(outer, &self.traits), &self.traits).map(|pole_y| {
            let pole_px = self.cs.convert_y(pole_y);
            if pole_px <= self.cs.convert_y(outer[0][1]) {
                pole_px.min(0.0) as f32
            } else {
                pole_px.max(self.cs.pixel_size().1) as f32
            }
        });

        let mut shapes = Shapes::default();
        for dx in self.offsets(&outer_path.interval_x()) {
            let holes: Vec<Vec<PixelPoint>> = inner_paths.iter().map(|p| self.to_pixels(&p.points, dx)).collect();
            let outline = self.to_pixels(&outer_path.points, dx);
            let outline = match edge_y {
                Some(edge_y) => pole_fill_outline(&outline, edge_y),
                None => outline,
            };
            shapes.fill.append(tessellate_polygon(&outline, &holes));
            self.stroke(&mut shapes.stroke, &outer_path, dx, style);
            for inner in &inner_paths {
                self.stroke(&mut shapes.stroke, inner, dx, style);
            }
        }
        shapes
    }

    /// Numeric sequence as an index/value polyline
    fn values_shapes(&self, values: &[f64], style: &DrawStyle) -> Shapes {
        let points: Vec<Point> = values.iter().enumerate().map(|(i, v)| Point::new(i as f64, *v)).collect();
        let mut shapes = Shapes::default();
        match points.len() {
            0 => {}
            1 => {
                let px = self.to_pixels(&points, 0.0)[0];
                shapes.stroke.append(tessellate_square(px, style.point_size / 2.0));
            }
            _ => self.stroke(&mut shapes.stroke, &unwrap_path(&points, false, Unit::None), 0.0, style),
        }
        shapes
    }
}

/// Combine per-part results in order
fn combine(parts: Vec<Shapes>) -> Shapes {
    let mut shapes = Shapes::default();
    for part in parts {
        shapes.extend(part);
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CoordinateSystem, Linestring, Multi, Ring};

    fn geo() -> Traits {
        Traits::new(2, CoordinateSystem::Geographic, Unit::Degree)
    }

    fn world() -> GeoBox {
        GeoBox::new(Point::new(-180.0, -90.0), Point::new(180.0, 90.0))
    }

    #[test]
    fn test_point_is_a_square() {
        let b = GeoBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let cs = LocalCS::new(&b, 100.0, 100.0, false).unwrap();
        let drawer = Drawer::new(&cs, b, Traits::cartesian(2));
        let shapes = drawer.shapes(&Geometry::Point(Point::new(5.0, 5.0)), &DrawStyle::default());
        assert_eq!(shapes.stroke.triangle_count(), 2);
        assert!(shapes.fill.is_empty());
    }

    #[test]
    fn test_wrapped_linestring_has_dashed_edge() {
        let cs = LocalCS::new(&world(), 360.0, 180.0, false).unwrap();
        let drawer = Drawer::new(&cs, world(), geo());
        let ls = Geometry::Linestring(Linestring(vec![Point::new(170.0, 0.0), Point::new(-170.0, 0.0)]));
        let style = DrawStyle { densify_threshold_deg: 100.0, ..DrawStyle::default() };
        let shapes = drawer.shapes(&ls, &style);
        // one copy at 170..190 and one shifted to -190..-170
        let xs: Vec<f32> = shapes.stroke.vertices.chunks_exact(2).map(|v| v[0]).collect();
        assert!(xs.iter().any(|&x| x < 20.0));
        assert!(xs.iter().any(|&x| x > 340.0));
        // dashed pieces use butt ends, so no vertex strays past the line width
        assert!(xs.iter().all(|&x| (-20.0..=380.0).contains(&x)));
    }

    #[test]
    fn test_pole_ring_fills_to_the_pole() {
        let cs = LocalCS::new(&world(), 360.0, 180.0, false).unwrap();
        let drawer = Drawer::new(&cs, world(), geo());
        let ring: Vec<Point> = [0.0, 90.0, 180.0, -90.0].iter().map(|&x| Point::new(x, 60.0)).collect();
        let shapes = drawer.shapes(&Geometry::Ring(Ring(ring)), &DrawStyle::default());
        assert!(!shapes.fill.is_empty());
        let min_y = shapes.fill.vertices.chunks_exact(2).map(|v| v[1]).fold(f32::INFINITY, f32::min);
        assert!(min_y.abs() < 1e-3);
    }

    #[test]
    fn test_box_stored_across_the_cut() {
        let visible = GeoBox::new(Point::new(160.0, -20.0), Point::new(210.0, 20.0));
        let cs = LocalCS::new(&visible, 50.0, 40.0, false).unwrap();
        let drawer = Drawer::new(&cs, visible, geo());
        let b = GeoBox::new(Point::new(170.0, -10.0), Point::new(-160.0, 10.0));
        let shapes = drawer.shapes(&Geometry::Box(b), &DrawStyle::default());
        let xs: Vec<f32> = shapes.fill.vertices.chunks_exact(2).map(|v| v[0]).collect();
        assert!(!xs.is_empty());
        // 170..200 maps to pixels 10..40
        assert!(xs.iter().all(|&x| (10.0 - 1e-3..=40.0 + 1e-3).contains(&x)), "{:?}", xs);
    }

    #[test]
    fn test_multi_parts_are_combined_in_order() {
        let b = GeoBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let cs = LocalCS::new(&b, 100.0, 100.0, false).unwrap();
        let drawer = Drawer::new(&cs, b, Traits::cartesian(2));
        let mp = Geometry::MultiPoint(Multi(vec![Point::new(1.0, 1.0), Point::new(9.0, 9.0)]));
        let shapes = drawer.shapes(&mp, &DrawStyle::default());
        assert_eq!(shapes.stroke.triangle_count(), 4);
        assert!(shapes.stroke.vertices[0] < shapes.stroke.vertices[8]);
    }

    #[test]
    fn test_draw_marks_canvas() {
        let b = GeoBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let cs = LocalCS::new(&b, 20.0, 20.0, false).unwrap();
        let drawer = Drawer::new(&cs, b, Traits::cartesian(2));
        let mut canvas = Canvas::new(20, 20, [1.0, 1.0, 1.0, 1.0]);
        let style = DrawStyle { color: [0.0, 0.0, 1.0, 1.0], fill_alpha: 1.0, ..DrawStyle::default() };
        let triangles = drawer.draw(&mut canvas, "box", &Geometry::Box(b), &style);
        assert!(triangles > 2);
        assert_eq!(canvas.pixel(10, 10), image::Rgba([0, 0, 255, 255]));
    }
}
