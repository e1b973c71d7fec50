//! Label font: TrueType when available, built-in bitmap glyphs otherwise.

use crate::models::Rgba;
use ab_glyph::{FontVec, PxScale};
use imageproc::drawing::{Canvas, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SYSTEM_FONT_DIRS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/Library/Fonts",
];

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

pub enum LabelFont {
    TrueType { font: FontVec, scale: PxScale },
    /// 5x7 bitmap glyphs, each dot drawn as a `dot` x `dot` square.
    Builtin { dot: u32 },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::TrueType { scale, .. } => write!(f, "LabelFont::TrueType({:?})", scale),
            LabelFont::Builtin { dot } => write!(f, "LabelFont::Builtin({})", dot),
        }
    }
}

impl LabelFont {
    /// Load `path`, searching the usual system font directories when it is
    /// a bare file name. Falls back to the built-in font.
    pub fn load(path: &Path, size: f32) -> Self {
        let mut candidates = vec![path.to_path_buf()];
        if path.is_relative() {
            if let Some(name) = path.file_name() {
                candidates.extend(SYSTEM_FONT_DIRS.iter().map(|dir| Path::new(dir).join(name)));
            }
        }
        Self::from_candidates(&candidates, size)
    }

    pub fn from_candidates(candidates: &[PathBuf], size: f32) -> Self {
        for candidate in candidates {
            let Ok(bytes) = std::fs::read(candidate) else {
                continue;
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    debug!("Loaded label font {:?}", candidate);
                    return LabelFont::TrueType { font, scale: PxScale::from(size) };
                }
                Err(e) => warn!("Invalid font file {:?}: {}", candidate, e),
            }
        }
        warn!("No usable label font among {:?}, using built-in font", candidates);
        Self::builtin(size)
    }

    pub fn builtin(size: f32) -> Self {
        let dot = ((size / GLYPH_ROWS as f32).round() as u32).max(1);
        LabelFont::Builtin { dot }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, LabelFont::Builtin { .. })
    }

    /// Width and height of `text` in pixels.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        match self {
            LabelFont::TrueType { font, scale } => text_size(*scale, font, text),
            LabelFont::Builtin { dot } => {
                let n = text.chars().count() as u32;
                if n == 0 {
                    return (0, 0);
                }
                let advance = (GLYPH_COLS + 1) * dot;
                (n * advance - dot, GLYPH_ROWS * dot)
            }
        }
    }

    /// Draw `text` with its top-left corner at (`x`, `y`).
    pub fn draw<C>(&self, canvas: &mut C, x: i32, y: i32, color: Rgba, text: &str)
    where
        C: Canvas<Pixel = image::Rgba<u8>>,
    {
        match self {
            LabelFont::TrueType { font, scale } => {
                draw_text_mut(canvas, color.into(), x, y, *scale, font, text);
            }
            LabelFont::Builtin { dot } => {
                let dot = *dot;
                let advance = ((GLYPH_COLS + 1) * dot) as i32;
                for (i, c) in text.chars().enumerate() {
                    let origin_x = x + i as i32 * advance;
                    for (row, bits) in glyph(c).iter().enumerate() {
                        for col in 0..GLYPH_COLS {
                            if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                                continue;
                            }
                            let rect = Rect::at(
                                origin_x + (col * dot) as i32,
                                y + (row as u32 * dot) as i32,
                            )
                            .of_size(dot, dot);
                            draw_filled_rect_mut(canvas, rect, color.into());
                        }
                    }
                }
            }
        }
    }
}

/// Rows of a 5x7 glyph, most significant of the low five bits leftmost.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' | '`' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}
