//! Geometry domain model
//!
//! Points, boxes, segments, n-spheres, linestrings, rings, polygons and their
//! multi-geometries, tagged with `Traits`, plus the pure math used to measure
//! them on plain and periodic coordinates.
//!
//! # Submodules
//! - `types` - Entities and traits
//! - `angle` - Periodic normalization
//! - `envelope` - Plain and periodic bounding boxes
//! - `ops` - Vector math, spherical conversion, densification
//! - `pole` - Pole containment of rings
//! - `clip` - Containment and slab clipping

mod types;
mod angle;
mod envelope;
mod ops;
mod pole;
mod clip;

pub use types::{
    CoordinateSystem,
    GeoBox,
    Geometry,
    Interval,
    Linestring,
    Multi,
    MultiLinestring,
    MultiPoint,
    MultiPolygon,
    NSphere,
    Point,
    Polygon,
    Ring,
    Segment,
    Traits,
    Unit,
};

pub use angle::{
    from_radians,
    full_angle,
    half_angle,
    normalized_angle_signed,
    normalized_angle_unsigned,
    subtract_angle,
    to_radians,
    unwrap_angles,
};

pub use envelope::{
    aabb,
    aabb_angle,
    envelope_points,
    expand_box,
    expand_box_angle,
    unwrapped_box,
    expand_point,
    expand_point_angle,
    merge_boxes,
};

pub use ops::{
    cross,
    densify_path,
    densify_spherical,
    dot,
    dot_points,
    from_cartesian,
    rotate,
    spherical_angle,
    to_cartesian,
    Vec3,
};

pub use pole::{ring_pole, Pole};

pub use clip::{
    clip_segment,
    covered_by,
    covered_by_angle,
    intersects,
    intersects_angle,
    intersects_segment,
    segment_box_parameters,
};
