//! Data models for map overlays and spawn records.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// RGB colour triple as stored in map files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Saturating conversion from the float fields of a map record.
    pub fn from_floats(r: f64, g: f64, b: f64) -> Self {
        Self(channel(r), channel(g), channel(b))
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba {
        Rgba(self.0, self.1, self.2, alpha)
    }
}

/// RGBA colour used for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub fn rgb(self) -> Rgb {
        Rgb(self.0, self.1, self.2)
    }
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(c: Rgba) -> Self {
        image::Rgba([c.0, c.1, c.2, c.3])
    }
}

fn channel(v: f64) -> u8 {
    // `as` truncates toward zero and saturates at the u8 range
    v as u8
}

/// A marker in map space, parsed from a `P` record or adapted from a spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rgb: Rgb,
    pub size: i32,
    pub label: String,
    /// Numeric field used by the value colour mode (spawn chance etc.)
    pub value: Option<f64>,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            rgb: Rgb(30, 144, 255),
            size: 0,
            label: String::new(),
            value: None,
        }
    }
}

/// A line in map space, parsed from an `L` record. Elevations are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub rgb: Rgb,
}

/// Records of one map file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedMap {
    pub points: Vec<MapPoint>,
    pub segments: Vec<Segment>,
}

/// Rectangular extent of a reference map, derived from its segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Fallback for maps without segments.
    pub const UNIT: Bounds = Bounds {
        min_x: 0.0,
        max_x: 1.0,
        min_y: 0.0,
        max_y: 1.0,
    };

    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self { min_x, max_x, min_y, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive containment test in map space.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.max_x, self.min_y, self.max_y)
    }
}

/// Axis flips between map space and the image frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orientation {
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for Orientation {
    /// Validated for EverQuest maps: game (x,y) -> map (-y,-x), then flip Y.
    fn default() -> Self {
        Self { flip_x: false, flip_y: true }
    }
}

/// Which overlay a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Lines,
    Points,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Lines => "lines",
            LayerKind::Points => "points",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layers rendered from one map file.
#[derive(Debug, Clone, Default)]
pub struct FileLayers {
    pub lines: Option<RgbaImage>,
    pub points: Option<RgbaImage>,
    /// Points dropped because they fell outside the reference bounds.
    pub omitted_points: usize,
}

/// One layer of a multi-file render.
pub type RenderedLayer = (PathBuf, LayerKind, RgbaImage);

/// A live spawn location in game space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
    /// Spawn chance in percent.
    pub chance: f64,
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// Zone short name, when the source spans zones.
    #[serde(default)]
    pub zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_floats_saturates() {
        assert_eq!(Rgb::from_floats(255.9, -4.0, 300.0), Rgb(255, 0, 255));
        assert_eq!(Rgb::from_floats(12.7, 0.2, 99.0), Rgb(12, 0, 99));
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let b = Bounds::new(0.0, 10.0, -5.0, 5.0);
        assert!(b.contains(0.0, -5.0));
        assert!(b.contains(10.0, 5.0));
        assert!(!b.contains(10.01, 0.0));
        assert!(!b.contains(5.0, -5.5));
    }

    #[test]
    fn test_default_orientation_flips_y_only() {
        let o = Orientation::default();
        assert!(!o.flip_x);
        assert!(o.flip_y);
    }
}
