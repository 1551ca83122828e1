//! RGBA raster target
//!
//! Meshes are rasterized by sampling pixel centers against each triangle's
//! edge functions. Coverage is accumulated per mesh first and blended once,
//! so overlapping joins of a translucent stroke do not darken.

use super::colors::to_rgba8;
use super::tessellation::Mesh;
use image::{Rgba, RgbaImage};
use std::path::Path;

pub struct Canvas {
    image: RgbaImage,
    coverage: Vec<bool>,
    touched: Vec<usize>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: [f32; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, to_rgba8(background)),
            coverage: vec![false; width as usize * height as usize],
            touched: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Rasterize every triangle of the mesh and blend `color` over the result
    pub fn fill_mesh(&mut self, mesh: &Mesh, color: [f32; 4]) {
        let (w, h) = (self.width() as usize, self.height() as usize);
        if w == 0 || h == 0 {
            return;
        }
        for tri in mesh.indices.chunks_exact(3) {
            let v = |i: u32| {
                let i = i as usize * 2;
                (mesh.vertices[i], mesh.vertices[i + 1])
            };
            self.cover_triangle(v(tri[0]), v(tri[1]), v(tri[2]), w, h);
        }

        let alpha = color[3].clamp(0.0, 1.0);
        let src = to_rgba8(color);
        for idx in self.touched.drain(..) {
            self.coverage[idx] = false;
            let (x, y) = ((idx % w) as u32, (idx / w) as u32);
            let dst = self.image.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = src[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha);
                dst[c] = blended.round() as u8;
            }
            let out_alpha = alpha * 255.0 + dst[3] as f32 * (1.0 - alpha);
            dst[3] = out_alpha.round().min(255.0) as u8;
        }
    }

    fn cover_triangle(&mut self, a: (f32, f32), b: (f32, f32), c: (f32, f32), w: usize, h: usize) {
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let sign = area.signum();

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0);
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0);
        let max_x = a.0.max(b.0).max(c.0).ceil().min(w as f32 - 1.0);
        let max_y = a.1.max(b.1).max(c.1).ceil().min(h as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y as usize..=max_y as usize {
            for x in min_x as usize..=max_x as usize {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let inside = edge(b, c, p) * sign >= 0.0
                    && edge(c, a, p) * sign >= 0.0
                    && edge(a, b, p) * sign >= 0.0;
                let idx = y * w + x;
                if inside && !self.coverage[idx] {
                    self.coverage[idx] = true;
                    self.touched.push(idx);
                }
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}

/// Twice the signed area of `(a, b, p)`
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::tessellation::{tessellate_square, PixelPoint};

    #[test]
    fn test_fill_square() {
        let mut canvas = Canvas::new(10, 10, [1.0, 1.0, 1.0, 1.0]);
        let mesh = Mesh::from_buffers(tessellate_square(PixelPoint::new(5.0, 5.0), 2.0));
        canvas.fill_mesh(&mesh, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(canvas.pixel(5, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(3, 3), Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(8, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_overlap_blends_once() {
        let mut canvas = Canvas::new(4, 4, [0.0, 0.0, 0.0, 1.0]);
        let mut mesh = Mesh::from_buffers(tessellate_square(PixelPoint::new(2.0, 2.0), 2.0));
        mesh.append(tessellate_square(PixelPoint::new(2.0, 2.0), 2.0));
        canvas.fill_mesh(&mesh, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(canvas.pixel(1, 1)[0], 128);
    }

    #[test]
    fn test_offscreen_triangles_are_clipped() {
        let mut canvas = Canvas::new(4, 4, [0.0, 0.0, 0.0, 1.0]);
        let mesh = Mesh::from_buffers(tessellate_square(PixelPoint::new(-50.0, 200.0), 3.0));
        canvas.fill_mesh(&mesh, [1.0, 1.0, 1.0, 1.0]);
        assert!(canvas.image().pixels().all(|p| p[0] == 0));
    }
}
