//! Affine map from a geometry-space box to a pixel rectangle
//!
//! Both rectangles share their midpoint. Pixel y grows downwards, so the
//! geometry y axis is flipped.

use crate::error::GeometryError;
use crate::geometry::{GeoBox, Point};

/// Scale used along a zero-extent axis, as a fraction of the pixel size
pub const DEGENERATE_SCALE_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalCS {
    src_center: [f64; 2],
    dst_center: [f64; 2],
    scale_x: f64,
    scale_y: f64,
}

impl LocalCS {
    /// Map `src` onto a `dst_width` x `dst_height` rectangle
    ///
    /// Without `fill` the smaller scale is used on both axes so the aspect
    /// ratio is preserved. A zero-extent axis is scaled by
    /// `DEGENERATE_SCALE_FRACTION` of the pixel size along it.
    pub fn new(src: &GeoBox, dst_width: f64, dst_height: f64, fill: bool) -> Result<Self, GeometryError> {
        let w = src.max[0] - src.min[0];
        let h = src.max[1] - src.min[1];
        if !(w >= 0.0 && h >= 0.0) {
            return Err(GeometryError::InvalidGeometry(format!(
                "box has negative extent ({} x {})",
                w, h
            )));
        }

        let scale = |extent: f64, dst: f64| {
            if extent > 0.0 {
                dst / extent
            } else {
                DEGENERATE_SCALE_FRACTION * dst
            }
        };
        let mut scale_x = scale(w, dst_width);
        let mut scale_y = scale(h, dst_height);
        if !fill {
            let s = scale_x.min(scale_y);
            scale_x = s;
            scale_y = s;
        }

        Ok(Self {
            src_center: [src.min[0] + w / 2.0, src.min[1] + h / 2.0],
            dst_center: [dst_width / 2.0, dst_height / 2.0],
            scale_x,
            scale_y,
        })
    }

    pub fn convert_x(&self, x: f64) -> f64 {
        self.dst_center[0] + (x - self.src_center[0]) * self.scale_x
    }

    pub fn convert_y(&self, y: f64) -> f64 {
        self.dst_center[1] - (y - self.src_center[1]) * self.scale_y
    }

    pub fn convert(&self, p: &Point) -> [f64; 2] {
        [self.convert_x(p[0]), self.convert_y(p[1])]
    }

    pub fn inverse_convert_x(&self, px: f64) -> f64 {
        self.src_center[0] + (px - self.dst_center[0]) / self.scale_x
    }

    pub fn inverse_convert_y(&self, py: f64) -> f64 {
        self.src_center[1] - (py - self.dst_center[1]) / self.scale_y
    }

    /// Length along x without the origin shift
    pub fn convert_dimension_x(&self, w: f64) -> f64 {
        w * self.scale_x
    }

    /// Length along y without the origin shift or flip
    pub fn convert_dimension_y(&self, h: f64) -> f64 {
        h * self.scale_y
    }

    pub fn inverse_convert_dimension_x(&self, w: f64) -> f64 {
        w / self.scale_x
    }

    pub fn inverse_convert_dimension_y(&self, h: f64) -> f64 {
        h / self.scale_y
    }

    /// Width and height of the pixel rectangle
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.dst_center[0] * 2.0, self.dst_center[1] * 2.0)
    }

    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }
}
