//! Debugger-side geometry watching
//!
//! Decodes geometric values out of a paused program's memory using type
//! information reported by the debugger, measures them on plain or periodic
//! (spherical and geographic) coordinates and renders them into an image.
//!
//! # Modules
//! - `convert` - Decode plans built from debugger type info, one-shot memory reads
//! - `geometry` - Entities, periodic angle math, envelopes, densification
//! - `draw` - Pixel mapping, periodic replication, tessellation, rasterization
//! - `load` - User-type driven loading of watched expressions
//! - `config` - Settings and user type descriptions
//! - `watch` - The end-to-end render of a list of expressions

pub mod error;
pub mod convert;
pub mod geometry;
pub mod draw;
pub mod load;
pub mod config;
pub mod watch;
pub mod logging;

pub use config::{ContainerKind, Settings, UserType, UserTypeKind};
pub use error::{ConvertError, GeometryError};
pub use load::{Loaded, Loader};
pub use watch::{render, ItemStatus, WatchOutput};
