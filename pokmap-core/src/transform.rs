//! Map-space to pixel-space conversion.

use crate::models::{Bounds, Orientation};

const MIN_EXTENT: f64 = 1e-9;

/// Uniform scale and centring offsets for one output canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub x_pad: f64,
    pub y_pad: f64,
}

/// EverQuest convention: map coordinates are (-y_game, -x_game).
pub fn game_to_map_xy(x_game: f64, y_game: f64) -> (f64, f64) {
    (-y_game, -x_game)
}

/// Reflect a map-space coordinate across the bounds' midlines as configured.
pub fn apply_orientation(x: f64, y: f64, bounds: &Bounds, orientation: Orientation) -> (f64, f64) {
    let nx = if orientation.flip_x { bounds.max_x - (x - bounds.min_x) } else { x };
    let ny = if orientation.flip_y { bounds.max_y - (y - bounds.min_y) } else { y };
    (nx, ny)
}

/// Fit `bounds` into a `width` x `height` canvas, keeping aspect ratio.
pub fn scale_for_size(bounds: &Bounds, width: u32, height: u32, padding: u32) -> Viewport {
    let w = bounds.width();
    let h = bounds.height();
    let inner_w = (width as f64 - 2.0 * padding as f64).max(1.0);
    let inner_h = (height as f64 - 2.0 * padding as f64).max(1.0);

    let sx = inner_w / w.max(MIN_EXTENT);
    let sy = inner_h / h.max(MIN_EXTENT);
    let scale = sx.min(sy);

    Viewport {
        scale,
        x_pad: (width as f64 - w * scale) / 2.0,
        y_pad: (height as f64 - h * scale) / 2.0,
    }
}

/// Unrounded pixel position of an oriented map coordinate. Image Y grows downward.
pub fn to_pixel_f64(x: f64, y: f64, bounds: &Bounds, viewport: &Viewport) -> (f64, f64) {
    let px = viewport.x_pad + (x - bounds.min_x) * viewport.scale;
    let py = viewport.y_pad + (bounds.max_y - y) * viewport.scale;
    (px, py)
}

/// Nearest pixel, with halves going to the even neighbour.
pub fn round_pixel(p: (f64, f64)) -> (i32, i32) {
    (p.0.round_ties_even() as i32, p.1.round_ties_even() as i32)
}

/// Pixel position of an oriented map coordinate.
pub fn to_pixel(x: f64, y: f64, bounds: &Bounds, viewport: &Viewport) -> (i32, i32) {
    round_pixel(to_pixel_f64(x, y, bounds, viewport))
}

/// Square region around a canvas, four canvases wide in each direction.
///
/// Pixel positions inside it are safe to hand to integer drawing code. A
/// near-zero reference extent scales coordinates by ~1e11, so anything
/// projected through it must be culled or clipped against this band first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBand {
    min: f64,
    max: f64,
}

impl PixelBand {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let margin = 4.0 * width.max(height).max(1) as f64;
        Self { min: -margin, max: margin }
    }

    pub fn contains(&self, p: (f64, f64)) -> bool {
        (self.min..=self.max).contains(&p.0) && (self.min..=self.max).contains(&p.1)
    }

    /// The part of segment `a`-`b` inside the band (Liang-Barsky).
    pub fn clip_segment(&self, a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
        if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        let edges = [
            (-dx, a.0 - self.min),
            (dx, self.max - a.0),
            (-dy, a.1 - self.min),
            (dy, self.max - a.1),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
    }
}
