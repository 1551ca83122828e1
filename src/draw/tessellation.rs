//! Pixel-space tessellation
//!
//! Converts strokes (solid or dashed), filled outlines with holes, squares and
//! circles into flat vertex/index buffers that the canvas rasterizes.

use std::f32::consts::PI;

/// Number of segments used for round caps and joins
const ROUND_CAP_SEGMENTS: u32 = 16;

/// Dash pattern for uncertain edges, in pixels
pub const DASH_LENGTH: f32 = 6.0;
pub const DASH_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &PixelPoint) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    fn lerp(&self, other: &PixelPoint, t: f32) -> PixelPoint {
        PixelPoint::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Round,
    Square,
    Butt,
}

/// Triangles as interleaved `x, y` vertices and index triples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn from_buffers((vertices, indices): (Vec<f32>, Vec<u32>)) -> Self {
        Self { vertices, indices }
    }

    /// Append another buffer, offsetting its indices past the current vertices
    pub fn append(&mut self, (vertices, mut indices): (Vec<f32>, Vec<u32>)) {
        let offset = (self.vertices.len() / 2) as u32;
        for idx in indices.iter_mut() {
            *idx += offset;
        }
        self.vertices.extend(vertices);
        self.indices.extend(indices);
    }

    pub fn extend(&mut self, other: Mesh) {
        self.append((other.vertices, other.indices));
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Half-disk fan at a stroke end, or a full disk when `full` is set
fn add_round_cap(
    verts: &mut Vec<f32>,
    indices: &mut Vec<u32>,
    center: PixelPoint,
    direction: (f32, f32),
    half_width: f32,
    is_start: bool,
    full: bool,
) {
    let fan_base = (verts.len() / 2) as u32;
    verts.push(center.x);
    verts.push(center.y);

    let base_angle = direction.1.atan2(direction.0);
    let angle_offset = if is_start { PI / 2.0 } else { -PI / 2.0 };
    let (segments, sweep) = if full {
        (ROUND_CAP_SEGMENTS * 2, 2.0 * PI)
    } else {
        (ROUND_CAP_SEGMENTS, PI)
    };

    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let ang = base_angle + angle_offset + t * sweep;
        verts.push(center.x + ang.cos() * half_width);
        verts.push(center.y + ang.sin() * half_width);
    }

    for i in 0..segments {
        indices.push(fan_base);
        indices.push(fan_base + 1 + i);
        indices.push(fan_base + 2 + i);
    }
}

/// Stroke a polyline into vertex and index arrays
///
/// Each segment becomes a quad; interior vertices get round joins. A polyline
/// whose last point repeats the first is treated as closed and gets no caps.
pub fn tessellate_polyline(points: &[PixelPoint], width: f32, line_end: LineEnd) -> (Vec<f32>, Vec<u32>) {
    let mut verts = Vec::new();
    let mut indices = Vec::new();

    if points.len() < 2 || width <= 0.0 {
        return (verts, indices);
    }

    let mut work_points = points.to_vec();
    work_points.dedup_by(|a, b| a.distance(b) < 1e-4);
    let mut is_closed = false;
    if work_points.len() >= 3 {
        if let (Some(first), Some(last)) = (work_points.first(), work_points.last()) {
            if first.distance(last) < 1e-4 {
                is_closed = true;
                work_points.pop();
            }
        }
    }

    let half_w = width * 0.5;
    if work_points.len() < 2 {
        // Zero-length stroke: a dot
        if line_end == LineEnd::Round {
            add_round_cap(&mut verts, &mut indices, work_points[0], (1.0, 0.0), half_w, true, true);
        }
        return (verts, indices);
    }

    let n = work_points.len();
    let segment_count = if is_closed { n } else { n - 1 };

    let mut seg_dir = Vec::with_capacity(segment_count);
    for i in 0..segment_count {
        let p0 = work_points[i];
        let p1 = work_points[(i + 1) % n];
        let len = p0.distance(&p1);
        seg_dir.push(((p1.x - p0.x) / len, (p1.y - p0.y) / len));
    }

    for i in 0..segment_count {
        let mut p0 = work_points[i];
        let mut p1 = work_points[(i + 1) % n];
        let (dx, dy) = seg_dir[i];
        if !is_closed && line_end == LineEnd::Square {
            if i == 0 {
                p0 = PixelPoint::new(p0.x - dx * half_w, p0.y - dy * half_w);
            }
            if i == segment_count - 1 {
                p1 = PixelPoint::new(p1.x + dx * half_w, p1.y + dy * half_w);
            }
        }
        let (nx, ny) = (-dy * half_w, dx * half_w);
        let base = (verts.len() / 2) as u32;
        verts.extend_from_slice(&[
            p0.x + nx, p0.y + ny,
            p0.x - nx, p0.y - ny,
            p1.x + nx, p1.y + ny,
            p1.x - nx, p1.y - ny,
        ]);
        indices.extend_from_slice(&[base, base + 2, base + 3, base, base + 3, base + 1]);
    }

    let join_count = if is_closed { n } else { n - 2 };
    for j in 0..join_count {
        let vertex = if is_closed { j } else { j + 1 };
        let dir = seg_dir[vertex % segment_count];
        add_round_cap(&mut verts, &mut indices, work_points[vertex], dir, half_w, true, true);
    }

    if !is_closed && line_end == LineEnd::Round {
        add_round_cap(&mut verts, &mut indices, work_points[0], seg_dir[0], half_w, true, false);
        add_round_cap(
            &mut verts,
            &mut indices,
            work_points[n - 1],
            seg_dir[segment_count - 1],
            half_w,
            false,
            false,
        );
    }

    (verts, indices)
}

/// Split a polyline into dash pieces of `dash` pixels separated by `gap`
pub fn dash_polyline(points: &[PixelPoint], dash: f32, gap: f32) -> Vec<Vec<PixelPoint>> {
    let mut pieces = Vec::new();
    if points.len() < 2 || dash <= 0.0 || gap < 0.0 {
        return pieces;
    }

    let mut on = true;
    let mut remaining = dash;
    let mut current = vec![points[0]];
    for w in points.windows(2) {
        let (mut a, b) = (w[0], w[1]);
        let mut seg_len = a.distance(&b);
        while seg_len > remaining {
            let split = a.lerp(&b, remaining / seg_len);
            if on {
                current.push(split);
                pieces.push(std::mem::take(&mut current));
            } else {
                current = vec![split];
            }
            seg_len -= remaining;
            a = split;
            on = !on;
            remaining = if on { dash } else { gap };
        }
        remaining -= seg_len;
        if on {
            current.push(b);
        }
    }
    if on && current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

/// Triangulate an outline with holes using earcut
pub fn tessellate_polygon(outer: &[PixelPoint], holes: &[Vec<PixelPoint>]) -> (Vec<f32>, Vec<u32>) {
    let mut flat_coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    let push_ring = |flat: &mut Vec<f64>, ring: &[PixelPoint]| {
        let closed = ring.len() > 1 && ring.first().map(|f| f.distance(&ring[ring.len() - 1]) < 1e-4).unwrap_or(false);
        let ring = if closed { &ring[..ring.len() - 1] } else { ring };
        for p in ring {
            flat.push(p.x as f64);
            flat.push(p.y as f64);
        }
    };

    push_ring(&mut flat_coords, outer);
    if flat_coords.len() < 6 {
        return (Vec::new(), Vec::new());
    }
    for hole in holes {
        if hole.len() < 3 {
            continue;
        }
        hole_indices.push(flat_coords.len() / 2);
        push_ring(&mut flat_coords, hole);
    }

    let indices = earcutr::earcut(&flat_coords, &hole_indices, 2).unwrap_or_default();
    let vertices: Vec<f32> = flat_coords.iter().map(|&v| v as f32).collect();
    (vertices, indices.iter().map(|&i| i as u32).collect())
}

/// Points on a circle, first point not repeated
pub fn circle_points(center: PixelPoint, radius: f32, segments: u32) -> Vec<PixelPoint> {
    let segments = segments.max(8);
    (0..segments)
        .map(|i| {
            let angle = (i as f32 / segments as f32) * 2.0 * PI;
            PixelPoint::new(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
        })
        .collect()
}

/// Filled circle as a triangle fan
pub fn tessellate_circle(center: PixelPoint, radius: f32, segments: u32) -> (Vec<f32>, Vec<u32>) {
    let rim = circle_points(center, radius, segments);
    let mut vertices = vec![center.x, center.y];
    let mut indices = Vec::with_capacity(rim.len() * 3);
    for p in &rim {
        vertices.push(p.x);
        vertices.push(p.y);
    }
    let count = rim.len() as u32;
    for i in 0..count {
        indices.extend_from_slice(&[0, 1 + i, 1 + (i + 1) % count]);
    }
    (vertices, indices)
}

/// Axis-aligned filled square centered on a point
pub fn tessellate_square(center: PixelPoint, half_size: f32) -> (Vec<f32>, Vec<u32>) {
    let (x0, y0) = (center.x - half_size, center.y - half_size);
    let (x1, y1) = (center.x + half_size, center.y + half_size);
    (vec![x0, y0, x1, y0, x1, y1, x0, y1], vec![0, 1, 2, 0, 2, 3])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f32, f32)]) -> Vec<PixelPoint> {
        coords.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect()
    }

    #[test]
    fn test_tessellate_polyline() {
        let (verts, indices) = tessellate_polyline(&pts(&[(0.0, 0.0), (10.0, 0.0)]), 2.0, LineEnd::Butt);
        assert_eq!(verts.len(), 8);
        assert_eq!(indices.len(), 6);
        assert!(verts.chunks_exact(2).all(|v| v[1].abs() == 1.0));
    }

    #[test]
    fn test_tessellate_with_round_caps() {
        let (verts, indices) = tessellate_polyline(&pts(&[(0.0, 0.0), (10.0, 0.0)]), 2.0, LineEnd::Round);
        assert!(verts.len() > 8);
        assert_eq!(indices.len(), 6 + 2 * 3 * ROUND_CAP_SEGMENTS as usize);
    }

    #[test]
    fn test_tessellate_with_square_caps() {
        let (verts, _) = tessellate_polyline(&pts(&[(0.0, 0.0), (10.0, 0.0)]), 2.0, LineEnd::Square);
        let min_x = verts.chunks_exact(2).map(|v| v[0]).fold(f32::INFINITY, f32::min);
        let max_x = verts.chunks_exact(2).map(|v| v[0]).fold(f32::NEG_INFINITY, f32::max);
        assert_eq!((min_x, max_x), (-1.0, 11.0));
    }

    #[test]
    fn test_closed_polyline_has_joins_everywhere() {
        let square = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let (_, indices) = tessellate_polyline(&square, 2.0, LineEnd::Round);
        let quads = 4 * 6;
        let joins = 4 * 3 * 2 * ROUND_CAP_SEGMENTS as usize;
        assert_eq!(indices.len(), quads + joins);
    }

    #[test]
    fn test_dash_pieces() {
        let line = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let pieces = dash_polyline(&line, 6.0, 4.0);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], pts(&[(0.0, 0.0), (6.0, 0.0)]));
        assert_eq!(pieces[1], pts(&[(10.0, 0.0), (16.0, 0.0)]));
    }

    #[test]
    fn test_polygon_with_hole() {
        let outer = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let hole = pts(&[(3.0, 3.0), (7.0, 3.0), (7.0, 7.0), (3.0, 7.0)]);
        let (verts, indices) = tessellate_polygon(&outer, &[hole]);
        assert_eq!(verts.len(), 16);
        assert_eq!(indices.len(), 8 * 3);
    }

    #[test]
    fn test_polygon_drops_repeated_closing_point() {
        let outer = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)]);
        let (verts, indices) = tessellate_polygon(&outer, &[]);
        assert_eq!(verts.len(), 6);
        assert_eq!(indices.len(), 3);
    }

    #[test]
    fn test_mesh_append_offsets_indices() {
        let mut mesh = Mesh::from_buffers(tessellate_square(PixelPoint::new(0.0, 0.0), 1.0));
        mesh.append(tessellate_square(PixelPoint::new(5.0, 5.0), 1.0));
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(tessellate_circle(PixelPoint::new(0.0, 0.0), 3.0, 12).1.len(), 36);
    }
}
