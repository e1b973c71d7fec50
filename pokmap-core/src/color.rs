//! Scalar-to-colour mapping for heatmap style markers.

use crate::models::Rgba;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default alpha for value-coloured markers.
pub const DEFAULT_VALUE_ALPHA: i32 = 220;

const GREEN: (f64, f64, f64) = (0.0, 180.0, 0.0);
const AMBER: (f64, f64, f64) = (230.0, 200.0, 0.0);
const RED: (f64, f64, f64) = (230.0, 40.0, 30.0);

/// Elevation range mapped onto the z colour band.
const Z_BAND_MIN: f64 = -300.0;
const Z_BAND_SPAN: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// green -> yellow -> red
    #[default]
    #[serde(rename = "gyr")]
    GreenYellowRed,
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gyr" => Ok(Palette::GreenYellowRed),
            other => Err(format!("unknown palette '{}'", other)),
        }
    }
}

pub(crate) fn clamp01(t: f64) -> f64 {
    if t < 0.0 {
        0.0
    } else if t > 1.0 {
        1.0
    } else {
        t
    }
}

fn lerp(a: f64, b: f64, u: f64) -> u8 {
    (a + (b - a) * u) as u8
}

fn clamp_alpha(alpha: i32) -> u8 {
    alpha.clamp(0, 255) as u8
}

/// Map `value` within `[vmin, vmax]` onto the palette.
pub fn color_from_value(value: f64, vmin: f64, vmax: f64, alpha: i32, palette: Palette) -> Rgba {
    let vmax = if vmax <= vmin { vmin + 1.0 } else { vmax };
    let t = clamp01((value - vmin) / (vmax - vmin));

    let (from, to, u) = match palette {
        Palette::GreenYellowRed if t <= 0.5 => (GREEN, AMBER, t / 0.5),
        Palette::GreenYellowRed => (AMBER, RED, (t - 0.5) / 0.5),
    };

    Rgba(
        lerp(from.0, to.0, u),
        lerp(from.1, to.1, u),
        lerp(from.2, to.2, u),
        clamp_alpha(alpha),
    )
}

/// Colour band by elevation, red/green across z in [-300, 300].
pub fn z_band_color(z: f64) -> Rgba {
    let t = clamp01((z - Z_BAND_MIN) / Z_BAND_SPAN);
    Rgba(
        (40.0 + 200.0 * t) as u8,
        (200.0 - 180.0 * t) as u8,
        (40.0 - 20.0 * t) as u8,
        DEFAULT_VALUE_ALPHA as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gyr(value: f64, vmin: f64, vmax: f64) -> Rgba {
        color_from_value(value, vmin, vmax, DEFAULT_VALUE_ALPHA, Palette::GreenYellowRed)
    }

    #[test]
    fn test_color_endpoints_and_midpoint() {
        assert_eq!(gyr(0.0, 0.0, 100.0), Rgba(0, 180, 0, 220));
        assert_eq!(gyr(50.0, 0.0, 100.0), Rgba(230, 200, 0, 220));
        assert_eq!(gyr(100.0, 0.0, 100.0), Rgba(230, 40, 30, 220));
    }

    #[test]
    fn test_color_interpolation() {
        // t = 0.25 -> u = 0.5 on the green->amber leg
        assert_eq!(gyr(25.0, 0.0, 100.0), Rgba(115, 190, 0, 220));
        // t = 0.75 -> u = 0.5 on the amber->red leg
        assert_eq!(gyr(75.0, 0.0, 100.0), Rgba(230, 120, 15, 220));
    }

    #[test]
    fn test_color_clamps_out_of_range_values() {
        assert_eq!(gyr(-40.0, 0.0, 100.0), gyr(0.0, 0.0, 100.0));
        assert_eq!(gyr(400.0, 0.0, 100.0), gyr(100.0, 0.0, 100.0));
    }

    #[test]
    fn test_color_degenerate_range() {
        // vmax <= vmin behaves like vmax = vmin + 1
        assert_eq!(gyr(5.0, 5.0, 5.0), Rgba(0, 180, 0, 220));
        assert_eq!(gyr(6.0, 5.0, 2.0), Rgba(230, 40, 30, 220));
    }

    #[test]
    fn test_color_alpha_clamped() {
        let c = color_from_value(0.0, 0.0, 1.0, 999, Palette::GreenYellowRed);
        assert_eq!(c.3, 255);
        let c = color_from_value(0.0, 0.0, 1.0, -5, Palette::GreenYellowRed);
        assert_eq!(c.3, 0);
    }

    #[test]
    fn test_z_band_constants() {
        assert_eq!(z_band_color(-300.0), Rgba(40, 200, 40, 220));
        assert_eq!(z_band_color(0.0), Rgba(140, 110, 30, 220));
        assert_eq!(z_band_color(300.0), Rgba(240, 20, 20, 220));
        assert_eq!(z_band_color(10_000.0), z_band_color(300.0));
    }

    #[test]
    fn test_palette_from_str() {
        assert_eq!("GYR".parse::<Palette>().unwrap(), Palette::GreenYellowRed);
        assert!("viridis".parse::<Palette>().is_err());
    }
}
