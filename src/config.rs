//! Render settings and user-defined type descriptions
//!
//! Settings are read from a JSON file; every field has a default so a file
//! only needs to list what it changes. A few fields can be overridden from
//! the environment.
//!
//! ```json
//! {
//!   "image_width": 640,
//!   "user_types": {
//!     "Point2D": { "kind": "point", "members": ["x", "y"] },
//!     "GeoPoint": { "kind": "point", "members": ["lon", "lat"],
//!                   "coordinate_system": "geographic", "unit": "degree" },
//!     "std::vector<*>": { "kind": "container", "data": "$this._Myfirst",
//!                         "size": "$this._Mylast - $this._Myfirst" }
//!   }
//! }
//! ```

use crate::convert::canonical_spelling;
use crate::draw::{palette_color, parse_color, DrawStyle};
use crate::geometry::{CoordinateSystem, Unit};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const ENV_WIDTH: &str = "GEOMETRY_WATCH_WIDTH";
pub const ENV_HEIGHT: &str = "GEOMETRY_WATCH_HEIGHT";
pub const ENV_DENSIFY: &str = "GEOMETRY_WATCH_DENSIFY";

/// Geometry kind a container type represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    #[default]
    Linestring,
    Ring,
    MultiPoint,
    MultiLinestring,
    MultiPolygon,
}

/// How the members of a user type map onto a geometry
///
/// Member strings are member names of the watched value, or expressions
/// where `$this` stands for the watched value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserTypeKind {
    Point {
        members: Vec<String>,
    },
    Box {
        min: String,
        max: String,
    },
    Segment {
        first: String,
        second: String,
    },
    #[serde(rename = "nsphere")]
    NSphere {
        center: String,
        radius: String,
    },
    Container {
        data: String,
        size: String,
        #[serde(default, rename = "geometry")]
        kind: ContainerKind,
    },
    Polygon {
        outer: String,
        #[serde(default)]
        inners: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserType {
    #[serde(flatten)]
    pub kind: UserTypeKind,
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
    #[serde(default)]
    pub unit: Unit,
}

impl UserType {
    pub fn new(kind: UserTypeKind) -> Self {
        Self {
            kind,
            coordinate_system: CoordinateSystem::default(),
            unit: Unit::default(),
        }
    }

    pub fn with_coordinates(mut self, coordinate_system: CoordinateSystem, unit: Unit) -> Self {
        self.coordinate_system = coordinate_system;
        self.unit = unit;
        self
    }
}

/// Replace `$this` with the parenthesized expression, or treat `member` as a
/// plain member name
pub fn resolve_member(dialect: crate::convert::Dialect, expr: &str, member: &str) -> String {
    if member.contains("$this") {
        member.replace("$this", &format!("({})", expr))
    } else {
        dialect.member(expr, member)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub image_width: u32,
    pub image_height: u32,
    /// Longest great-circle step before densifying, in degrees
    pub densify_threshold_deg: f64,
    /// Stretch the data extent to the image instead of keeping its aspect ratio
    pub fill: bool,
    pub line_width: f32,
    pub fill_alpha: f32,
    pub point_size: f32,
    pub background: String,
    pub colors: Vec<String>,
    pub user_types: IndexMap<String, UserType>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_width: 800,
            image_height: 600,
            densify_threshold_deg: 2.0,
            fill: false,
            line_width: 1.5,
            fill_alpha: 0.25,
            point_size: 5.0,
            background: "#ffffff".to_string(),
            colors: Vec::new(),
            user_types: IndexMap::new(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("malformed settings JSON")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings {}", path.as_ref().display()))?;
        Self::from_json(&text)
    }

    /// Apply `GEOMETRY_WATCH_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key/value lookup; unparsable values are ignored
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        fn parse<T: std::str::FromStr>(key: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(key, value = %value, "ignoring unparsable override");
                    None
                }
            }
        }
        if let Some(w) = parse::<u32>(ENV_WIDTH, lookup(ENV_WIDTH)).filter(|&w| w > 0) {
            self.image_width = w;
        }
        if let Some(h) = parse::<u32>(ENV_HEIGHT, lookup(ENV_HEIGHT)).filter(|&h| h > 0) {
            self.image_height = h;
        }
        if let Some(d) = parse::<f64>(ENV_DENSIFY, lookup(ENV_DENSIFY)).filter(|&d| d > 0.0) {
            self.densify_threshold_deg = d;
        }
    }

    /// User type for a debugger type name
    ///
    /// Keys match after whitespace normalization. A key ending in `<*>`
    /// matches every instantiation of that template.
    pub fn find_user_type(&self, type_name: &str) -> Option<&UserType> {
        let name = canonical_spelling(type_name);
        if let Some(t) = self.user_types.iter().find(|(k, _)| canonical_spelling(k) == name).map(|(_, t)| t) {
            return Some(t);
        }
        self.user_types.iter().find_map(|(k, t)| {
            let prefix = canonical_spelling(k.strip_suffix("<*>")?);
            let rest = name.strip_prefix(prefix.as_str())?;
            rest.starts_with('<').then_some(t)
        })
    }

    pub fn background_color(&self) -> [f32; 4] {
        parse_color(&self.background).unwrap_or([1.0, 1.0, 1.0, 1.0])
    }

    /// Drawing parameters of the item at `index`
    pub fn draw_style(&self, index: usize) -> DrawStyle {
        DrawStyle {
            color: palette_color(&self.colors, index),
            line_width: self.line_width,
            fill_alpha: self.fill_alpha,
            point_size: self.point_size,
            densify_threshold_deg: self.densify_threshold_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Dialect;
    use std::collections::HashMap;

    const SETTINGS: &str = r##"{
        "image_width": 320,
        "background": "#000000",
        "user_types": {
            "GeoPoint": { "kind": "point", "members": ["lon", "lat"],
                          "coordinate_system": "geographic", "unit": "degree" },
            "Seg": { "kind": "segment", "first": "a", "second": "b" },
            "std::vector<*>": { "kind": "container", "data": "$this.first",
                                "size": "$this.size", "geometry": "ring" },
            "Poly": { "kind": "polygon", "outer": "outer" }
        }
    }"##;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = Settings::from_json(SETTINGS).unwrap();
        assert_eq!(settings.image_width, 320);
        assert_eq!(settings.image_height, 600);
        assert_eq!(settings.densify_threshold_deg, 2.0);
        assert_eq!(settings.background_color(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(settings.user_types.len(), 4);
    }

    #[test]
    fn test_user_type_shapes() {
        let settings = Settings::from_json(SETTINGS).unwrap();
        let geo = &settings.user_types["GeoPoint"];
        assert_eq!(geo.unit, Unit::Degree);
        assert_eq!(geo.coordinate_system, CoordinateSystem::Geographic);
        assert_eq!(
            settings.user_types["std::vector<*>"].kind,
            UserTypeKind::Container {
                data: "$this.first".to_string(),
                size: "$this.size".to_string(),
                kind: ContainerKind::Ring,
            }
        );
        assert_eq!(
            settings.user_types["Poly"].kind,
            UserTypeKind::Polygon { outer: "outer".to_string(), inners: None }
        );
    }

    #[test]
    fn test_find_user_type() {
        let settings = Settings::from_json(SETTINGS).unwrap();
        assert!(settings.find_user_type("GeoPoint").is_some());
        assert!(settings.find_user_type("std::vector<GeoPoint, std::allocator<GeoPoint> >").is_some());
        assert!(settings.find_user_type("std::vector_base<int>").is_none());
        assert!(settings.find_user_type("Unknown").is_none());
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings::default();
        let env: HashMap<&str, &str> = [(ENV_WIDTH, "1024"), (ENV_HEIGHT, "abc"), (ENV_DENSIFY, "0.5")].into();
        settings.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.image_width, 1024);
        assert_eq!(settings.image_height, 600);
        assert_eq!(settings.densify_threshold_deg, 0.5);
    }

    #[test]
    fn test_resolve_member() {
        assert_eq!(resolve_member(Dialect::Cpp, "v", "size"), "(v).size");
        assert_eq!(resolve_member(Dialect::Cpp, "v", "$this.b - $this.a"), "(v).b - (v).a");
    }

    #[test]
    fn test_draw_style_uses_palette() {
        let settings = Settings {
            colors: vec!["#102030".to_string()],
            ..Settings::default()
        };
        let style = settings.draw_style(3);
        assert_eq!(style.color, parse_color("#102030").unwrap());
        assert_eq!(style.line_width, settings.line_width);
    }
}
