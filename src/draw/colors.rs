//! Color parsing and the default item palette

use image::Rgba;

/// Colors assigned to watched items in order, cycling when exhausted
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#e6194b", // red
    "#3cb44b", // green
    "#4363d8", // blue
    "#f58231", // orange
    "#911eb4", // purple
    "#42d4f4", // cyan
    "#f032e6", // magenta
    "#808000", // olive
];

/// Parse `#rrggbb` or `#rrggbbaa` into normalized RGBA
pub fn parse_color(text: &str) -> Option<[f32; 4]> {
    let hex = text.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| v as f32 / 255.0);
    let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
    Some([channel(0)?, channel(2)?, channel(4)?, a])
}

/// Color of the item at `index`, from the configured list or the default palette
///
/// Unparsable configured entries fall back to the default palette entry.
pub fn palette_color(colors: &[String], index: usize) -> [f32; 4] {
    let fallback = || {
        parse_color(DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]).unwrap_or([0.5, 0.5, 0.5, 1.0])
    };
    if colors.is_empty() {
        return fallback();
    }
    parse_color(&colors[index % colors.len()]).unwrap_or_else(fallback)
}

pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

pub fn to_rgba8(color: [f32; 4]) -> Rgba<u8> {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([c(color[0]), c(color[1]), c(color[2]), c(color[3])])
}
