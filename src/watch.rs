//! Render a list of watched expressions into one image
//!
//! Items are loaded in order. The first successfully loaded item fixes the
//! coordinate system and unit; later items that disagree are rejected. The
//! merged extent of the accepted items, padded by a small margin, is mapped
//! onto the image and every item is drawn with its own palette color.

use crate::config::Settings;
use crate::convert::{Debugger, MemoryReader};
use crate::draw::{Canvas, Drawer, LocalCS};
use crate::geometry::{merge_boxes, normalized_angle_signed, GeoBox, Point, Traits};
use crate::load::{Loaded, Loader};
use image::RgbaImage;
use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fraction of the data extent added on every side
pub const MARGIN_FRACTION: f64 = 0.05;

/// Outcome of one watched item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemStatus {
    Drawn {
        kind: &'static str,
        triangles: usize,
    },
    /// Loaded but holds no coordinates
    Empty { kind: &'static str },
    Failed(String),
}

impl ItemStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemStatus::Failed(_))
    }
}

pub struct WatchOutput {
    pub image: RgbaImage,
    /// Merged envelope of all drawn items
    pub extent: Option<GeoBox>,
    pub traits: Option<Traits>,
    pub cs: Option<LocalCS>,
    pub items: IndexMap<String, ItemStatus>,
}

impl WatchOutput {
    /// Geometry coordinates under a pixel, for a crosshair readout
    pub fn pixel_to_geometry(&self, px: f64, py: f64) -> Option<Point> {
        let cs = self.cs.as_ref()?;
        let unit = self.traits.map(|t| t.unit).unwrap_or_default();
        let x = normalized_angle_signed(cs.inverse_convert_x(px), unit);
        Some(Point::new(x, cs.inverse_convert_y(py)))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}

/// Traits agree when they share coordinate system and unit
fn compatible(a: &Traits, b: &Traits) -> bool {
    a.coordinate_system == b.coordinate_system && a.unit == b.unit
}

/// Extent padded by `MARGIN_FRACTION` in each direction with a non-zero size
fn padded(extent: &GeoBox) -> GeoBox {
    let mut out = *extent;
    for i in 0..out.dimension().min(2) {
        let pad = (out.max[i] - out.min[i]) * MARGIN_FRACTION;
        out.min[i] -= pad;
        out.max[i] += pad;
    }
    out
}

/// Load, measure and draw every item
pub fn render<D, R>(items: &[String], debugger: &D, reader: &R, settings: &Settings) -> WatchOutput
where
    D: Debugger + ?Sized,
    R: MemoryReader + ?Sized,
{
    let loader = Loader::new(debugger, reader, settings);
    let mut statuses = IndexMap::new();
    let mut accepted: Vec<(usize, &str, Loaded, GeoBox)> = Vec::new();
    let mut traits: Option<Traits> = None;

    for (index, name) in items.iter().enumerate() {
        let loaded = match loader.load(name) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(item = %name, error = %format!("{:#}", e), "failed to load item");
                statuses.insert(name.clone(), ItemStatus::Failed(format!("{:#}", e)));
                continue;
            }
        };
        if let Some(reference) = &traits {
            if !compatible(reference, &loaded.traits) {
                let message = format!(
                    "coordinate system {:?}/{:?} differs from {:?}/{:?} of earlier items",
                    loaded.traits.coordinate_system, loaded.traits.unit, reference.coordinate_system, reference.unit
                );
                warn!(item = %name, "{}", message);
                statuses.insert(name.clone(), ItemStatus::Failed(message));
                continue;
            }
        }
        let envelope = loaded.geometry.envelope(&loaded.traits);
        if !envelope.is_valid() {
            statuses.insert(name.clone(), ItemStatus::Empty { kind: loaded.geometry.kind_name() });
            continue;
        }
        traits.get_or_insert(loaded.traits);
        accepted.push((index, name.as_str(), loaded, envelope));
    }

    let background = settings.background_color();
    let (width, height) = (settings.image_width, settings.image_height);
    let reference = match traits {
        Some(t) if !accepted.is_empty() => t,
        _ => {
            info!(items = items.len(), "nothing to draw");
            return finish(Canvas::new(width, height, background), None, None, None, items, statuses);
        }
    };

    let extent = merge_boxes(accepted.iter().map(|(_, _, _, b)| b), &reference);
    let visible = padded(&extent);
    let cs = match LocalCS::new(&visible, width as f64, height as f64, settings.fill) {
        Ok(cs) => cs,
        Err(e) => {
            for (_, name, _, _) in &accepted {
                statuses.insert(name.to_string(), ItemStatus::Failed(e.to_string()));
            }
            return finish(Canvas::new(width, height, background), None, Some(reference), None, items, statuses);
        }
    };
    debug!(?extent, ?reference, "mapped extent to image");

    let mut canvas = Canvas::new(width, height, background);
    let drawer = Drawer::new(&cs, visible, reference);
    for (index, name, loaded, _) in &accepted {
        let triangles = drawer.draw(&mut canvas, name, &loaded.geometry, &settings.draw_style(*index));
        statuses.insert(
            name.to_string(),
            ItemStatus::Drawn {
                kind: loaded.geometry.kind_name(),
                triangles,
            },
        );
    }
    info!(drawn = accepted.len(), items = items.len(), "rendered watch items");

    finish(canvas, Some(extent), Some(reference), Some(cs), items, statuses)
}

/// Assemble the output with statuses in the order the items were given
fn finish(
    canvas: Canvas,
    extent: Option<GeoBox>,
    traits: Option<Traits>,
    cs: Option<LocalCS>,
    items: &[String],
    mut statuses: IndexMap<String, ItemStatus>,
) -> WatchOutput {
    let mut ordered = IndexMap::with_capacity(items.len());
    for name in items {
        if let Some(status) = statuses.swap_remove(name) {
            ordered.insert(name.clone(), status);
        }
    }
    WatchOutput {
        image: canvas.into_image(),
        extent,
        traits,
        cs,
        items: ordered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UserType, UserTypeKind};
    use crate::convert::{Dialect, Snapshot};

    fn settings() -> Settings {
        let mut settings = Settings {
            image_width: 100,
            image_height: 100,
            ..Settings::default()
        };
        settings.user_types.insert(
            "P".to_string(),
            UserType::new(UserTypeKind::Point { members: vec!["x".into(), "y".into()] }),
        );
        settings
    }

    fn snapshot() -> Snapshot {
        let mut s = Snapshot::new(Dialect::Cpp);
        for (name, address, x, y) in [("a", 0x100u64, 0.0f64, 0.0f64), ("b", 0x200, 10.0, 10.0)] {
            s.insert_variable(name, "P", address, 16);
            s.insert_variable(&format!("({}).x", name), "double", address, 8);
            s.insert_variable(&format!("({}).y", name), "double", address + 8, 8);
            s.insert_memory(address, [x, y].iter().flat_map(|v| v.to_le_bytes()).collect());
        }
        s
    }

    #[test]
    fn test_render_points_and_failures() {
        let s = snapshot();
        let items = vec!["a".to_string(), "nope".to_string(), "b".to_string()];
        let out = render(&items, &s, &s, &settings());
        assert_eq!(out.items.keys().collect::<Vec<_>>(), vec!["a", "nope", "b"]);
        assert!(out.items["nope"].is_failed());
        assert!(matches!(out.items["a"], ItemStatus::Drawn { kind: "point", .. }));
        let extent = out.extent.unwrap();
        assert_eq!((extent.min[0], extent.max[0]), (0.0, 10.0));
        assert_eq!(out.image.dimensions(), (100, 100));
    }

    #[test]
    fn test_pixel_readout() {
        let s = snapshot();
        let items = vec!["a".to_string(), "b".to_string()];
        let out = render(&items, &s, &s, &settings());
        let center = out.pixel_to_geometry(50.0, 50.0).unwrap();
        assert!((center[0] - 5.0).abs() < 1e-9 && (center[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_loaded_gives_blank_image() {
        let s = Snapshot::new(Dialect::Cpp);
        let out = render(&["x".to_string()], &s, &s, &settings());
        assert!(out.extent.is_none());
        assert!(out.pixel_to_geometry(0.0, 0.0).is_none());
        assert!(out.image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }
}
