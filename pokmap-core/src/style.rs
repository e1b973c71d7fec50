//! Point and line styling options, resolved once per layer.

use crate::color::{DEFAULT_VALUE_ALPHA, Palette, color_from_value, z_band_color};
use crate::config::RendererConfig;
use crate::models::{MapPoint, Rgba};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rendering preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Circles coloured by a numeric value, e.g. drop chance.
    Spawn,
    /// Arrows with per-point colour, for native map annotations.
    #[default]
    Eq,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorMode {
    Fixed,
    #[serde(rename = "perPointRGB")]
    PerPointRgb,
    Z,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
    Circle,
    Arrow,
    /// Arrow for labelled points in eq/generic style, circle otherwise.
    Auto,
}

/// Concrete marker shape for one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    #[default]
    Label,
    None,
}

/// Numeric point field feeding the value colour mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueField {
    #[default]
    Value,
    Z,
    Size,
}

impl ValueField {
    pub fn read(&self, point: &MapPoint) -> f64 {
        match self {
            ValueField::Value => point.value.unwrap_or(0.0),
            ValueField::Z => point.z,
            ValueField::Size => point.size as f64,
        }
    }
}

macro_rules! impl_from_str {
    ($ty:ty, $what:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!("unknown {} '{}'", $what, other)),
                }
            }
        }
    };
}

impl_from_str!(Style, "style", { "spawn" => Style::Spawn, "eq" => Style::Eq, "generic" => Style::Generic });
impl_from_str!(ColorMode, "color mode", {
    "fixed" => ColorMode::Fixed,
    "perpointrgb" => ColorMode::PerPointRgb,
    "z" => ColorMode::Z,
    "value" => ColorMode::Value,
});
impl_from_str!(MarkerMode, "marker mode", {
    "circle" => MarkerMode::Circle,
    "arrow" => MarkerMode::Arrow,
    "auto" => MarkerMode::Auto,
});
impl_from_str!(ValueField, "value field", {
    "value" => ValueField::Value,
    "z" => ValueField::Z,
    "size" => ValueField::Size,
});

/// Options for a lines layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOptions {
    pub width_px: u32,
    pub alpha: i32,
}

impl LineOptions {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self { width_px: config.line_width_px, alpha: 255 }
    }
}

/// Options for a points layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOptions {
    pub style: Style,
    /// `None` takes the marker from the style.
    pub marker_mode: Option<MarkerMode>,
    pub dot_radius_px: u32,
    pub arrow_size_px: u32,
    pub label_source: LabelSource,
    pub color_mode: ColorMode,
    pub fixed_color: Rgba,
    pub value_field: ValueField,
    pub value_vmin: f64,
    pub value_vmax: f64,
    pub value_alpha: i32,
    pub palette: Palette,
}

impl PointOptions {
    /// Options used for whole-file renders: eq style, per-point colours.
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            style: Style::Eq,
            marker_mode: None,
            dot_radius_px: config.dot_radius_px,
            arrow_size_px: config.arrow_size_px,
            label_source: LabelSource::Label,
            color_mode: ColorMode::PerPointRgb,
            fixed_color: Rgba(30, 144, 255, 220),
            value_field: ValueField::Value,
            value_vmin: 0.0,
            value_vmax: 100.0,
            value_alpha: DEFAULT_VALUE_ALPHA,
            palette: Palette::GreenYellowRed,
        }
    }

    /// Apply the style defaults.
    pub fn resolve(&self) -> ResolvedPointStyle {
        let (marker, color_mode) = match (self.marker_mode, self.style) {
            (Some(marker), _) => (marker, self.color_mode),
            (None, Style::Spawn) => (MarkerMode::Circle, self.color_mode),
            (None, Style::Eq) if self.color_mode == ColorMode::Fixed => {
                (MarkerMode::Auto, ColorMode::PerPointRgb)
            }
            (None, _) => (MarkerMode::Auto, self.color_mode),
        };

        ResolvedPointStyle {
            style: self.style,
            marker,
            color_mode,
            fixed_color: self.fixed_color,
            value_field: self.value_field,
            value_vmin: self.value_vmin,
            value_vmax: self.value_vmax,
            value_alpha: self.value_alpha,
            palette: self.palette,
            dot_radius_px: i32::try_from(self.dot_radius_px).unwrap_or(i32::MAX),
            arrow_size_px: i32::try_from(self.arrow_size_px.max(1)).unwrap_or(i32::MAX),
            label_source: self.label_source,
        }
    }
}

/// Per-layer styling with all presets applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPointStyle {
    pub style: Style,
    pub marker: MarkerMode,
    pub color_mode: ColorMode,
    pub fixed_color: Rgba,
    pub value_field: ValueField,
    pub value_vmin: f64,
    pub value_vmax: f64,
    pub value_alpha: i32,
    pub palette: Palette,
    pub dot_radius_px: i32,
    pub arrow_size_px: i32,
    pub label_source: LabelSource,
}

impl ResolvedPointStyle {
    pub fn color_for(&self, point: &MapPoint) -> Rgba {
        match self.color_mode {
            ColorMode::Fixed => self.fixed_color,
            ColorMode::PerPointRgb => point.rgb.with_alpha(220),
            ColorMode::Z => z_band_color(point.z),
            ColorMode::Value => color_from_value(
                self.value_field.read(point),
                self.value_vmin,
                self.value_vmax,
                self.value_alpha,
                self.palette,
            ),
        }
    }

    pub fn marker_for(&self, has_label: bool) -> Marker {
        match self.marker {
            MarkerMode::Circle => Marker::Circle,
            MarkerMode::Arrow => Marker::Arrow,
            MarkerMode::Auto => {
                if has_label && matches!(self.style, Style::Eq | Style::Generic) {
                    Marker::Arrow
                } else {
                    Marker::Circle
                }
            }
        }
    }

    pub fn label_for<'a>(&self, point: &'a MapPoint) -> Option<&'a str> {
        match self.label_source {
            LabelSource::Label => Some(point.label.trim()).filter(|l| !l.is_empty()),
            LabelSource::None => None,
        }
    }

    /// Label text colour: the marker colour for eq maps, black otherwise.
    pub fn text_color(&self, marker_color: Rgba) -> Rgba {
        match self.style {
            Style::Eq => Rgba(marker_color.0, marker_color.1, marker_color.2, 255),
            _ => Rgba(0, 0, 0, 255),
        }
    }
}
