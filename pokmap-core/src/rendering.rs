//! Map overlay rendering into transparent RGBA layers.
//!
//! A [`MapRenderer`] owns everything that outlives a single render: its
//! configuration, the per-path bounds cache and the lazily loaded label font.
//! Every render call is otherwise self-contained and synchronous.

use crate::bounds::BoundsCache;
use crate::color::Palette;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::file_utils::{FsSource, MapSource};
use crate::font::LabelFont;
use crate::models::{
    Bounds, FileLayers, LayerKind, MapPoint, ParsedMap, RenderedLayer, Rgba, Segment, SpawnRecord,
};
use crate::parsers::parse_map_text;
use crate::style::{ColorMode, LabelSource, LineOptions, Marker, PointOptions, Style, ValueField};
use crate::transform::{
    PixelBand, Viewport, apply_orientation, game_to_map_xy, round_pixel, scale_for_size, to_pixel_f64,
};
use image::{ImageFormat, RgbaImage};
use imageproc::drawing::{
    Blend, Canvas, draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_polygon_mut,
    draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

const RING_COLOR: Rgba = Rgba(0, 0, 0, 230);
const DISC_OUTLINE_COLOR: Rgba = Rgba(0, 0, 0, 180);
const ARROW_OUTLINE_COLOR: Rgba = Rgba(0, 0, 0, 200);

/// Options for rendering whole map files.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOptions {
    pub lines: LineOptions,
    pub points: PointOptions,
    /// Emit blank layers instead of `None` for missing record kinds.
    pub include_empty_layers: bool,
}

impl LayerOptions {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            lines: LineOptions::from_config(config),
            points: PointOptions::from_config(config),
            include_empty_layers: false,
        }
    }
}

/// How spawn markers are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnLabel {
    /// 1-based position in the input list.
    #[default]
    Index,
    /// NPC name, falling back to the index.
    NpcName,
    /// The record's own `label`.
    Custom,
    None,
}

impl std::str::FromStr for SpawnLabel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "index" => Ok(SpawnLabel::Index),
            "npc" => Ok(SpawnLabel::NpcName),
            "custom" => Ok(SpawnLabel::Custom),
            "none" => Ok(SpawnLabel::None),
            other => Err(format!("unknown spawn label mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnOverlayOptions {
    /// Spawn tables store game coordinates; set false for map-space input.
    pub coords_are_game: bool,
    pub value_vmin: f64,
    pub value_vmax: f64,
    pub palette: Palette,
    pub dot_radius_px: u32,
    pub label_mode: SpawnLabel,
}

impl SpawnOverlayOptions {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            coords_are_game: true,
            value_vmin: 0.0,
            value_vmax: 100.0,
            palette: Palette::GreenYellowRed,
            dot_radius_px: config.dot_radius_px,
            label_mode: SpawnLabel::Index,
        }
    }
}

pub struct MapRenderer {
    config: RendererConfig,
    bounds: BoundsCache,
    font: OnceLock<LabelFont>,
    source: Box<dyn MapSource>,
}

impl MapRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self::with_source(config, Box::new(FsSource))
    }

    pub fn with_source(config: RendererConfig, source: Box<dyn MapSource>) -> Self {
        Self {
            config,
            bounds: BoundsCache::new(),
            font: OnceLock::new(),
            source,
        }
    }

    /// Use `font` for labels instead of loading the configured one.
    pub fn with_font(self, font: LabelFont) -> Self {
        let _ = self.font.set(font);
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn bounds_cache(&self) -> &BoundsCache {
        &self.bounds
    }

    fn font(&self) -> &LabelFont {
        self.font
            .get_or_init(|| LabelFont::load(&self.config.font_path, self.config.font_size_pt))
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedMap> {
        Ok(parse_map_text(&self.source.read_map(path)?))
    }

    /// Bounds of a reference map, computed on first use.
    pub fn bounds(&self, reference: &Path) -> Result<Bounds> {
        self.bounds.get_or_load(reference, self.source.as_ref())
    }

    fn frame(&self, reference: &Path, width: u32, height: u32) -> Result<(Bounds, Viewport)> {
        let bounds = self.bounds(reference)?;
        let viewport = scale_for_size(&bounds, width, height, self.config.padding_px);
        Ok((bounds, viewport))
    }

    /// Unrounded pixel position; may lie far off the canvas for degenerate bounds.
    fn project(&self, x: f64, y: f64, bounds: &Bounds, viewport: &Viewport) -> (f64, f64) {
        let (x, y) = apply_orientation(x, y, bounds, self.config.orientation());
        to_pixel_f64(x, y, bounds, viewport)
    }

    pub fn render_lines_layer(
        &self,
        reference: &Path,
        segments: &[Segment],
        width: u32,
        height: u32,
        options: &LineOptions,
    ) -> Result<RgbaImage> {
        let (bounds, viewport) = self.frame(reference, width, height)?;
        let mut canvas = Blend(RgbaImage::new(width, height));
        let alpha = options.alpha.clamp(0, 255) as u8;
        let band = PixelBand::for_canvas(width, height);

        for seg in segments {
            let p1 = self.project(seg.x1, seg.y1, &bounds, &viewport);
            let p2 = self.project(seg.x2, seg.y2, &bounds, &viewport);
            let Some((p1, p2)) = band.clip_segment(p1, p2) else {
                continue;
            };
            draw_wide_line(
                &mut canvas,
                round_pixel(p1),
                round_pixel(p2),
                options.width_px,
                seg.rgb.with_alpha(alpha),
            );
        }

        debug!("Rendered {} segments against {:?}", segments.len(), reference);
        Ok(canvas.0)
    }

    pub fn render_points_layer(
        &self,
        reference: &Path,
        points: &[MapPoint],
        width: u32,
        height: u32,
        options: &PointOptions,
    ) -> Result<RgbaImage> {
        let (bounds, viewport) = self.frame(reference, width, height)?;
        let style = options.resolve();
        let mut canvas = Blend(RgbaImage::new(width, height));
        let band = PixelBand::for_canvas(width, height);
        let mut culled = 0usize;

        for point in points {
            let projected = self.project(point.x, point.y, &bounds, &viewport);
            if !band.contains(projected) {
                culled += 1;
                continue;
            }
            let (px, py) = round_pixel(projected);
            let color = style.color_for(point);
            let label = style.label_for(point);

            match style.marker_for(label.is_some()) {
                Marker::Circle => draw_circle_marker(&mut canvas, px, py, style.dot_radius_px, color),
                Marker::Arrow => draw_arrow_marker(&mut canvas, px, py, style.arrow_size_px, color),
            }

            if let Some(label) = label {
                let font = self.font();
                let (tw, th) = font.text_size(label);
                // Centred above the marker
                let tx = (px as f64 - tw as f64 / 2.0) as i32;
                let lift = style.arrow_size_px.saturating_mul(2).saturating_add(2);
                let ty = py.saturating_sub(lift).saturating_sub(i32::try_from(th).unwrap_or(i32::MAX));
                font.draw(&mut canvas, tx, ty, style.text_color(color), label);
            }
        }

        if culled > 0 {
            debug!("Skipped {} points projected far off the canvas", culled);
        }
        debug!("Rendered {} points against {:?}", points.len(), reference);
        Ok(canvas.0)
    }

    /// Render one map file into a lines layer and a points layer.
    ///
    /// When `target` is not the reference map, points outside the reference
    /// bounds are dropped with a warning.
    pub fn render_file_layers(
        &self,
        reference: &Path,
        target: &Path,
        width: u32,
        height: u32,
        options: &LayerOptions,
    ) -> Result<FileLayers> {
        let parsed = self.parse_file(target)?;
        let mut layers = FileLayers::default();

        if !parsed.segments.is_empty() {
            layers.lines = Some(self.render_lines_layer(
                reference,
                &parsed.segments,
                width,
                height,
                &options.lines,
            )?);
        } else if options.include_empty_layers {
            layers.lines = Some(RgbaImage::new(width, height));
        }

        let mut points = parsed.points;
        if !points.is_empty() && target != reference {
            let bounds = self.bounds(reference)?;
            let before = points.len();
            points.retain(|p| {
                let inside = bounds.contains(p.x, p.y);
                if !inside {
                    warn!(
                        "Omitting out-of-bounds point: file={:?} x={:.2} y={:.2} label={} (ref bounds x[{:.2},{:.2}] y[{:.2},{:.2}])",
                        target, p.x, p.y, p.label,
                        bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
                    );
                }
                inside
            });
            layers.omitted_points = before - points.len();
        }

        if !points.is_empty() {
            layers.points = Some(self.render_points_layer(
                reference,
                &points,
                width,
                height,
                &options.points,
            )?);
        } else if options.include_empty_layers {
            layers.points = Some(RgbaImage::new(width, height));
        }

        Ok(layers)
    }

    /// Layers for several files, in input order with lines before points.
    pub fn render_files_to_layers<P: AsRef<Path>>(
        &self,
        reference: &Path,
        targets: &[P],
        width: u32,
        height: u32,
        options: &LayerOptions,
    ) -> Result<Vec<RenderedLayer>> {
        let mut results = Vec::new();
        for target in targets {
            let target = target.as_ref();
            let layers = self.render_file_layers(reference, target, width, height, options)?;
            if let Some(img) = layers.lines {
                results.push((target.to_path_buf(), LayerKind::Lines, img));
            }
            if let Some(img) = layers.points {
                results.push((target.to_path_buf(), LayerKind::Points, img));
            }
        }
        Ok(results)
    }

    /// Heatmap of spawn locations, coloured by spawn chance.
    pub fn render_spawn_points_overlay(
        &self,
        reference: &Path,
        spawns: &[SpawnRecord],
        width: u32,
        height: u32,
        options: &SpawnOverlayOptions,
    ) -> Result<RgbaImage> {
        let points: Vec<MapPoint> = spawns
            .iter()
            .enumerate()
            .map(|(i, sp)| spawn_to_point(i + 1, sp, options))
            .collect();

        let point_options = PointOptions {
            style: Style::Spawn,
            marker_mode: None,
            dot_radius_px: options.dot_radius_px,
            label_source: match options.label_mode {
                SpawnLabel::None => LabelSource::None,
                _ => LabelSource::Label,
            },
            color_mode: ColorMode::Value,
            value_field: ValueField::Value,
            value_vmin: options.value_vmin,
            value_vmax: options.value_vmax,
            palette: options.palette,
            ..PointOptions::from_config(&self.config)
        };

        self.render_points_layer(reference, &points, width, height, &point_options)
    }
}

fn spawn_to_point(index: usize, spawn: &SpawnRecord, options: &SpawnOverlayOptions) -> MapPoint {
    let (x, y) = if options.coords_are_game {
        game_to_map_xy(spawn.x, spawn.y)
    } else {
        (spawn.x, spawn.y)
    };
    let label = match options.label_mode {
        SpawnLabel::Index => index.to_string(),
        SpawnLabel::NpcName => spawn.npc_name.clone().unwrap_or_else(|| index.to_string()),
        SpawnLabel::Custom => spawn.label.clone().unwrap_or_default(),
        SpawnLabel::None => String::new(),
    };
    MapPoint {
        z: spawn.z.unwrap_or(0.0),
        label,
        value: Some(spawn.chance),
        ..MapPoint::new(x, y)
    }
}

/// Line of `width` pixels; wider than one pixel is filled as a quad.
fn draw_wide_line<C>(canvas: &mut C, p1: (i32, i32), p2: (i32, i32), width: u32, color: Rgba)
where
    C: Canvas<Pixel = image::Rgba<u8>>,
{
    let (x1, y1) = (p1.0 as f32, p1.1 as f32);
    let (x2, y2) = (p2.0 as f32, p2.1 as f32);
    if width <= 1 {
        draw_line_segment_mut(canvas, (x1, y1), (x2, y2), color.into());
        return;
    }

    let half = width as f32 / 2.0;
    let (dx, dy) = (x2 - x1, y2 - y1);
    let length = (dx * dx + dy * dy).sqrt();
    if length < 0.001 {
        draw_filled_circle_mut(canvas, p1, half.round() as i32, color.into());
        return;
    }

    let (nx, ny) = (-dy / length * half, dx / length * half);
    let corner = |x: f32, y: f32| Point::new(x.round() as i32, y.round() as i32);
    let quad = [
        corner(x1 + nx, y1 + ny),
        corner(x2 + nx, y2 + ny),
        corner(x2 - nx, y2 - ny),
        corner(x1 - nx, y1 - ny),
    ];
    if quad[0] == quad[3] {
        draw_line_segment_mut(canvas, (x1, y1), (x2, y2), color.into());
    } else {
        draw_polygon_mut(canvas, &quad, color.into());
    }
}

/// Dark two-pixel ring, then the filled disc with a thin outline.
fn draw_circle_marker<C>(canvas: &mut C, px: i32, py: i32, radius: i32, color: Rgba)
where
    C: Canvas<Pixel = image::Rgba<u8>>,
{
    draw_hollow_circle_mut(canvas, (px, py), radius.saturating_add(1), RING_COLOR.into());
    draw_hollow_circle_mut(canvas, (px, py), radius, RING_COLOR.into());
    draw_filled_circle_mut(canvas, (px, py), radius, color.into());
    draw_hollow_circle_mut(canvas, (px, py), radius, DISC_OUTLINE_COLOR.into());
}

/// Down-facing triangle whose apex is exactly (`px`, `py`).
fn draw_arrow_marker<C>(canvas: &mut C, px: i32, py: i32, size: i32, color: Rgba)
where
    C: Canvas<Pixel = image::Rgba<u8>>,
{
    let top = py.saturating_sub(size.saturating_mul(2));
    let verts = [
        Point::new(px, py),
        Point::new(px.saturating_sub(size), top),
        Point::new(px.saturating_add(size), top),
    ];
    draw_polygon_mut(canvas, &verts, color.into());
    let outline: Vec<Point<f32>> = verts.iter().map(|p| Point::new(p.x as f32, p.y as f32)).collect();
    draw_hollow_polygon_mut(canvas, &outline, ARROW_OUTLINE_COLOR.into());
}

/// Encode a layer as PNG.
pub fn image_to_png_bytes(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Short stable key for caching rendered layers: 16 hex chars of SHA-256.
pub fn make_cache_key<I, P>(parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Output file name for one rendered layer, e.g. `qeynos_points.png`.
pub fn layer_file_name(target: &Path, kind: LayerKind) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "layer".to_string());
    PathBuf::from(format!("{}_{}.png", stem, kind))
}
