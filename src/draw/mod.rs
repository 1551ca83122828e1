//! Rendering of geometries into an RGBA image
//!
//! Geometry-space coordinates are mapped to pixels by `LocalCS`, turned into
//! triangle meshes and rasterized onto a `Canvas`.
//!
//! # Submodules
//! - `local_cs` - Affine geometry to pixel mapping
//! - `periodic` - Replication across periods, dashed wrap edges, pole fills
//! - `tessellation` - Polyline stroking, dashing and earcut fills
//! - `canvas` - Triangle rasterization with alpha blending
//! - `drawer` - Per-variant drawing of `Geometry`
//! - `colors` - Color parsing and the item palette

mod local_cs;
mod periodic;
mod tessellation;
mod canvas;
mod drawer;
mod colors;

pub use local_cs::{LocalCS, DEGENERATE_SCALE_FRACTION};

pub use periodic::{
    pole_coordinate,
    pole_fill_outline,
    replication_offsets,
    unwrap_path,
    EdgeStyle,
    StyledPath,
};

pub use tessellation::{
    circle_points,
    dash_polyline,
    tessellate_circle,
    tessellate_polygon,
    tessellate_polyline,
    tessellate_square,
    LineEnd,
    Mesh,
    PixelPoint,
    DASH_GAP,
    DASH_LENGTH,
};

pub use canvas::Canvas;

pub use drawer::{DrawStyle, Drawer, Shapes};

pub use colors::{palette_color, parse_color, to_rgba8, with_alpha, DEFAULT_PALETTE};
