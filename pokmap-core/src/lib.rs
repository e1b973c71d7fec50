//! Map overlay rendering for EverQuest zone maps.
//!
//! Parses the client's point/line map text format and rasterizes lines,
//! labelled points and spawn heatmaps into transparent PNG layers.

pub mod bounds;
pub mod color;
pub mod config;
pub mod database;
pub mod error;
pub mod file_utils;
pub mod font;
pub mod models;
pub mod parsers;
pub mod rendering;
pub mod spawns;
pub mod style;
pub mod transform;

pub use color::{Palette, color_from_value};
pub use config::RendererConfig;
pub use error::{MapError, Result};
pub use rendering::{LayerOptions, MapRenderer, SpawnLabel, SpawnOverlayOptions};
