//! Word placement and rasterization.
//!
//! [`LayoutEngine`] is the seam the pipeline renders through. The built-in
//! [`SpiralLayoutEngine`] places terms greedily, largest first, walking a
//! spiral out from the canvas center and testing each candidate against a
//! bit-packed collision map seeded from the mask.

use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use image::RgbaImage;
use once_cell::sync::OnceCell;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tiny_skia::{Pixmap, Transform};
use tracing::{debug, warn};

use crate::compositor::EngineMask;
use crate::config::LayoutConfig;
use crate::grid::Canvas;
use crate::palette::{ColorSource, Rgb};
use crate::terms::WeightedTerm;
use crate::Error;

// =============================================================================
// Engine Interface
// =============================================================================

/// Everything the engine needs for one layout pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub terms: &'a [WeightedTerm],
    pub canvas: Canvas,
    pub background: Rgb,
    /// `None` leaves the whole canvas fillable.
    pub mask: Option<&'a EngineMask>,
    /// `None` lets the engine pick its default face.
    pub font: Option<&'a Path>,
    pub colors: &'a ColorSource,
    pub max_words: usize,
    pub relative_scaling: f32,
}

/// Region of the layout to rasterize and the pixel size to rasterize it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub output: Canvas,
}

impl Viewport {
    pub fn full(canvas: Canvas) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: canvas.width as f32,
            height: canvas.height as f32,
            output: canvas,
        }
    }

    fn transform(&self) -> Transform {
        let sx = self.output.width as f32 / self.width.max(1.0);
        let sy = self.output.height as f32 / self.height.max(1.0);
        Transform::from_row(sx, 0.0, 0.0, sy, -self.x * sx, -self.y * sy)
    }
}

pub trait LayoutEngine: Send + Sync {
    /// Places the terms inside the fillable part of the mask.
    fn layout(&self, request: &LayoutRequest<'_>) -> Result<WordLayout, Error>;

    /// Rasterizes (part of) a finished layout.
    fn render(&self, layout: &WordLayout, viewport: Viewport) -> Result<RgbaImage, Error>;
}

// =============================================================================
// Layout Output
// =============================================================================

/// Font bytes plus the family name the SVG stage refers to them by.
#[derive(Debug, Clone)]
pub struct FontData {
    pub data: Arc<Vec<u8>>,
    pub index: u32,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub weight: u32,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone)]
pub struct WordLayout {
    pub canvas: Canvas,
    pub background: Rgb,
    pub words: Vec<PlacedWord>,
    pub font: Option<Arc<FontData>>,
}

impl WordLayout {
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(8192);
        let (w, h) = (self.canvas.width, self.canvas.height);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            self.background
        ));
        if let Some(font) = &self.font {
            svg.push_str(&format!(
                r#"<style>text{{font-family:'{}',sans-serif}}</style>"#,
                escape_xml(&font.family)
            ));
        }
        for word in &self.words {
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" fill="{}" font-size="{:.1}" transform="rotate({:.1} {:.1} {:.1})">{}</text>"#,
                word.x,
                word.y,
                word.color,
                word.font_size,
                word.rotation,
                word.x,
                word.y,
                escape_xml(&word.text)
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Font size for a term: `max_size * (rs * weight / max_weight + (1 - rs))`.
///
/// `rs = 0` sizes every term alike, `rs = 1` makes size proportional to weight.
pub fn font_size_for(weight: u32, max_weight: u32, max_size: f32, relative_scaling: f32) -> f32 {
    let rs = relative_scaling.clamp(0.0, 1.0);
    let ratio = if max_weight == 0 {
        1.0
    } else {
        weight as f32 / max_weight as f32
    };
    max_size * (rs * ratio + (1.0 - rs))
}

// =============================================================================
// Spiral Layout Engine
// =============================================================================

pub struct SpiralLayoutEngine {
    settings: LayoutConfig,
    system_font: OnceCell<Option<Arc<FontData>>>,
}

impl Default for SpiralLayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl SpiralLayoutEngine {
    pub fn new(settings: LayoutConfig) -> Self {
        Self {
            settings,
            system_font: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &LayoutConfig {
        &self.settings
    }

    fn load_font(&self, path: Option<&Path>) -> Result<Arc<FontData>, Error> {
        if let Some(path) = path {
            match read_font_file(path) {
                Ok(font) => return Ok(Arc::new(font)),
                Err(err) => warn!(path = %path.display(), error = %err, "font unusable, trying system default"),
            }
        }
        self.system_font
            .get_or_init(|| system_sans_serif().map(Arc::new))
            .clone()
            .ok_or_else(|| Error::Font("no usable font found".into()))
    }

    fn max_font_size(&self, canvas: Canvas) -> f32 {
        self.settings
            .max_font_size
            .unwrap_or(canvas.width.min(canvas.height) as f32 / 4.0)
            .max(self.settings.min_font_size)
    }
}

fn read_font_file(path: &Path) -> Result<FontData, Error> {
    let data = std::fs::read(path)?;
    let family = font_family_name(&data)
        .unwrap_or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default());
    Ok(FontData {
        data: Arc::new(data),
        index: 0,
        family,
    })
}

fn font_family_name(font_data: &[u8]) -> Option<String> {
    let mut db = usvg::fontdb::Database::new();
    db.load_font_source(usvg::fontdb::Source::Binary(Arc::new(font_data.to_vec())));
    let name = db
        .faces()
        .find(|face| face.index == 0)
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone());
    name
}

/// Families tried after the generic sans-serif query, which fontdb maps to
/// Arial and therefore misses on most Linux hosts.
const SANS_SERIF_FAMILIES: [&str; 6] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Noto Sans CJK SC",
    "WenQuanYi Micro Hei",
    "FreeSans",
];

/// Best sans-serif face among the system fonts, or any face at all.
fn system_sans_serif() -> Option<FontData> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let id = pick_default_face(&db)?;
    let family = db.face(id)?.families.first()?.0.clone();
    debug!(family = %family, "using system font");
    db.with_face_data(id, |data, index| FontData {
        data: Arc::new(data.to_vec()),
        index,
        family,
    })
}

fn pick_default_face(db: &usvg::fontdb::Database) -> Option<usvg::fontdb::ID> {
    use usvg::fontdb::{Family, Query};

    let query = |family: Family<'_>| {
        db.query(&Query {
            families: &[family],
            ..Default::default()
        })
    };
    query(Family::SansSerif)
        .or_else(|| SANS_SERIF_FAMILIES.iter().find_map(|name| query(Family::Name(*name))))
        .or_else(|| db.faces().next().map(|face| face.id))
}

impl LayoutEngine for SpiralLayoutEngine {
    fn layout(&self, request: &LayoutRequest<'_>) -> Result<WordLayout, Error> {
        let font_data = self.load_font(request.font)?;
        let font = Font::from_bytes(
            font_data.data.as_slice(),
            FontSettings {
                collection_index: font_data.index,
                ..FontSettings::default()
            },
        )
        .map_err(|e| Error::Font(e.to_string()))?;

        let canvas = request.canvas;
        let mut collision_map = CollisionMap::from_mask(canvas, request.mask)?;

        let mut rng = match self.settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        // heaviest first; ties keep input order
        let mut terms: Vec<&WeightedTerm> = request.terms.iter().filter(|t| t.weight > 0).collect();
        terms.sort_by(|a, b| b.weight.cmp(&a.weight));
        terms.truncate(request.max_words);

        let max_weight = terms.first().map(|t| t.weight).unwrap_or(1);
        let max_size = self.max_font_size(canvas);
        let min_size = self.settings.min_font_size;
        let step = self.settings.font_step.max(0.5);
        let padding = self.settings.padding + (self.settings.word_spacing / 2.0) as u32;
        let angles = if self.settings.angles.is_empty() {
            vec![0.0]
        } else {
            self.settings.angles.clone()
        };
        let colors = request.colors.colors();

        let mut placed = Vec::with_capacity(terms.len());
        for term in terms {
            let angle = angles[rng.random_range(0..angles.len())];
            let mut font_size = font_size_for(term.weight, max_weight, max_size, request.relative_scaling);

            while font_size >= min_size {
                if let Some((x, y)) = place_term(
                    &term.term,
                    font_size,
                    angle,
                    &font,
                    &mut collision_map,
                    padding,
                    self.settings.max_attempts,
                    &mut rng,
                ) {
                    let color = colors[rng.random_range(0..colors.len())];
                    placed.push(PlacedWord {
                        text: term.term.clone(),
                        weight: term.weight,
                        font_size,
                        x,
                        y,
                        rotation: angle,
                        color,
                    });
                    break;
                }
                font_size -= step;
            }
        }

        if placed.is_empty() {
            return Err(Error::Render("Could not place any words".into()));
        }
        debug!(placed = placed.len(), requested = request.terms.len(), "layout finished");

        Ok(WordLayout {
            canvas,
            background: request.background,
            words: placed,
            font: Some(font_data),
        })
    }

    fn render(&self, layout: &WordLayout, viewport: Viewport) -> Result<RgbaImage, Error> {
        let font = layout
            .font
            .as_ref()
            .ok_or_else(|| Error::Font("layout carries no font".into()))?;

        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_font_source(usvg::fontdb::Source::Binary(font.data.clone()));
        let options = usvg::Options {
            font_family: font.family.clone(),
            fontdb: Arc::new(fontdb),
            ..Default::default()
        };

        let tree = usvg::Tree::from_str(&layout.to_svg(), &options)
            .map_err(|e| Error::Render(e.to_string()))?;

        let out = viewport.output;
        let mut pixmap = Pixmap::new(out.width, out.height)
            .ok_or_else(|| Error::Render("Failed to create pixel buffer".into()))?;
        pixmap.fill(layout.background.to_skia());
        resvg::render(&tree, viewport.transform(), &mut pixmap.as_mut());

        // opaque background, so premultiplied and straight alpha coincide
        RgbaImage::from_raw(out.width, out.height, pixmap.take())
            .ok_or_else(|| Error::Render("pixel buffer size mismatch".into()))
    }
}

#[allow(clippy::too_many_arguments)]
fn place_term(
    text: &str,
    font_size: f32,
    angle: f32,
    font: &Font,
    map: &mut CollisionMap,
    padding: u32,
    max_attempts: usize,
    rng: &mut ChaCha8Rng,
) -> Option<(f32, f32)> {
    let sprite = TextSprite::rasterize(text, font_size, angle, font, padding);
    if sprite.bbox_width > map.width || sprite.bbox_height > map.height {
        return None;
    }

    let center_x = map.width as i32 / 2;
    let center_y = map.height as i32 / 2;
    let direction = if rng.random_bool(0.5) { 1 } else { -1 };

    // the center itself is tried first
    let offsets = std::iter::once((0, 0))
        .chain(ArchimedeanSpiral::new(map.width as i32, map.height as i32, direction));

    for (dx, dy) in offsets.take(max_attempts) {
        let left = center_x + dx - (sprite.bbox_width as i32 / 2);
        let top = center_y + dy - (sprite.bbox_height as i32 / 2);

        if !map.collides(&sprite, left, top) {
            map.stamp(&sprite, left, top);
            return Some((left as f32 + sprite.anchor_x, top as f32 + sprite.anchor_y));
        }
    }

    None
}

// =============================================================================
// Collision Map
// =============================================================================

/// One bit per pixel, 32 pixels per word, most significant bit leftmost.
struct CollisionMap {
    width: u32,
    height: u32,
    stride: usize,
    bits: Vec<u32>,
}

/// Re-aligns a sprite row onto grid words for a sub-word shift, yielding
/// `(word offset, bits)` pairs including the overflow word.
fn shifted_row(row: &[u32], shift: u32) -> impl Iterator<Item = (usize, u32)> + '_ {
    let mut carry = 0u32;
    (0..=row.len()).map(move |sx| {
        let word = row.get(sx).copied().unwrap_or(0);
        let bits = if shift == 0 {
            word
        } else {
            (carry << (32 - shift)) | (word >> shift)
        };
        carry = word;
        (sx, bits)
    })
}

impl CollisionMap {
    fn new(width: u32, height: u32) -> Self {
        let stride = ((width + 31) >> 5) as usize;
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    /// Blocks every pixel the mask does not mark fillable.
    fn from_mask(canvas: Canvas, mask: Option<&EngineMask>) -> Result<Self, Error> {
        let mut map = Self::new(canvas.width, canvas.height);
        let Some(mask) = mask else {
            return Ok(map);
        };
        if (mask.width(), mask.height()) != (canvas.width, canvas.height) {
            return Err(Error::Render(format!(
                "mask is {}x{} but canvas is {}x{}",
                mask.width(),
                mask.height(),
                canvas.width,
                canvas.height
            )));
        }
        for y in 0..canvas.height {
            for x in 0..canvas.width {
                if !mask.is_fillable(x, y) {
                    map.block(x, y);
                }
            }
        }
        Ok(map)
    }

    fn block(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.stride + (x >> 5) as usize;
            self.bits[idx] |= 1 << (31 - (x & 31));
        }
    }

    /// True when the sprite overlaps a blocked pixel or leaves the canvas.
    fn collides(&self, sprite: &TextSprite, left: i32, top: i32) -> bool {
        let shift = (left & 31) as u32;
        let first_word = (left >> 5) as isize;

        for sy in 0..sprite.bbox_height as usize {
            let gy = top + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                return true;
            }
            let row_start = gy as usize * self.stride;

            for (sx, bits) in shifted_row(sprite.row(sy), shift) {
                if bits == 0 {
                    continue;
                }
                let gx = first_word + sx as isize;
                if gx < 0 || gx >= self.stride as isize {
                    return true;
                }
                if self.bits[row_start + gx as usize] & bits != 0 {
                    return true;
                }
            }
        }
        false
    }

    fn stamp(&mut self, sprite: &TextSprite, left: i32, top: i32) {
        let shift = (left & 31) as u32;
        let first_word = (left >> 5) as isize;

        for sy in 0..sprite.bbox_height as usize {
            let gy = top + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                continue;
            }
            let row_start = gy as usize * self.stride;

            for (sx, bits) in shifted_row(sprite.row(sy), shift) {
                let gx = first_word + sx as isize;
                if bits != 0 && gx >= 0 && gx < self.stride as isize {
                    self.bits[row_start + gx as usize] |= bits;
                }
            }
        }
    }
}

// =============================================================================
// Text Sprites
// =============================================================================

/// Bit mask of a rotated, padded term in the same packing as [`CollisionMap`].
struct TextSprite {
    bits: Vec<u32>,
    words_per_row: usize,
    bbox_width: u32,
    bbox_height: u32,
    /// Baseline origin relative to the sprite's top-left corner.
    anchor_x: f32,
    anchor_y: f32,
}

impl TextSprite {
    fn row(&self, y: usize) -> &[u32] {
        let start = y * self.words_per_row;
        &self.bits[start..start + self.words_per_row]
    }

    fn rasterize(text: &str, size: f32, angle_deg: f32, font: &Font, padding: u32) -> Self {
        let metrics = font
            .horizontal_line_metrics(size)
            .unwrap_or(fontdue::LineMetrics {
                ascent: size * 0.8,
                descent: size * -0.2,
                line_gap: 0.0,
                new_line_size: size,
            });

        let mut glyphs = Vec::new();
        let mut advance = 0.0f32;
        for ch in text.chars() {
            let (glyph, coverage) = font.rasterize(ch, size);
            glyphs.push((advance, glyph, coverage));
            advance += glyph.advance_width;
        }

        let pad = padding as f32;
        let plain_w = advance.ceil() + pad * 2.0;
        let plain_h = metrics.new_line_size.ceil() + pad * 2.0;
        let (cx, cy) = (plain_w / 2.0, plain_h / 2.0);
        let (sin, cos) = angle_deg.to_radians().sin_cos();

        // rotation about the center of the unrotated box
        let rotate = |x: f32, y: f32| -> (f32, f32) {
            let (dx, dy) = (x - cx, y - cy);
            (dx * cos - dy * sin + cx, dx * sin + dy * cos + cy)
        };

        let corners = [
            rotate(0.0, 0.0),
            rotate(plain_w, 0.0),
            rotate(0.0, plain_h),
            rotate(plain_w, plain_h),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        let bbox_width = (max_x - min_x).ceil().max(1.0) as u32;
        let bbox_height = (max_y - min_y).ceil().max(1.0) as u32;
        let words_per_row = ((bbox_width + 31) >> 5) as usize;
        let mut bits = vec![0u32; words_per_row * bbox_height as usize];

        let base_x = pad;
        let base_y = pad + metrics.ascent;
        let (anchor_x, anchor_y) = {
            let (x, y) = rotate(base_x, base_y);
            (x - min_x, y - min_y)
        };

        let pad = padding as i32;
        let mut set = |x: i32, y: i32| {
            if x >= 0 && y >= 0 && x < bbox_width as i32 && y < bbox_height as i32 {
                let idx = y as usize * words_per_row + (x as usize >> 5);
                bits[idx] |= 1 << (31 - (x & 31));
            }
        };

        for (offset, glyph, coverage) in &glyphs {
            let left = base_x + offset + glyph.xmin as f32;
            let top = base_y - glyph.height as f32 - glyph.ymin as f32;

            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    if coverage[gy * glyph.width + gx] <= 10 {
                        continue;
                    }
                    let (rx, ry) = rotate(left + gx as f32, top + gy as f32);
                    let fx = (rx - min_x).round() as i32;
                    let fy = (ry - min_y).round() as i32;
                    // dilate by the padding
                    for py in -pad..=pad {
                        for px in -pad..=pad {
                            set(fx + px, fy + py);
                        }
                    }
                }
            }
        }

        Self {
            bits,
            words_per_row,
            bbox_width,
            bbox_height,
            anchor_x,
            anchor_y,
        }
    }
}

// =============================================================================
// Spiral
// =============================================================================

/// Rectangular spiral stretched to the canvas aspect ratio.
struct ArchimedeanSpiral {
    t: i32,
    dt: i32,
    dx: f64,
    dy: f64,
    ratio: f64,
    step: f64,
}

impl ArchimedeanSpiral {
    fn new(width: i32, height: i32, dt: i32) -> Self {
        let step = 4.0;
        Self {
            t: 0,
            dt,
            dx: 0.0,
            dy: 0.0,
            ratio: step * width as f64 / height.max(1) as f64,
            step,
        }
    }
}

impl Iterator for ArchimedeanSpiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.t += self.dt;
        let sign = if self.t < 0 { -1.0 } else { 1.0 };
        let leg = ((1.0 + 4.0 * sign * self.t as f64).sqrt() - sign) as i32 & 3;
        match leg {
            0 => self.dx += self.ratio,
            1 => self.dy += self.step,
            2 => self.dx -= self.ratio,
            _ => self.dy -= self.step,
        }
        Some((self.dx as i32, self.dy as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{EngineMask, Polarity};
    use crate::grid::OccupancyGrid;
    use crate::terms::TermWeights;

    fn sprite(width: u32, height: u32) -> TextSprite {
        let words_per_row = ((width + 31) >> 5) as usize;
        let mut bits = vec![0u32; words_per_row * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                bits[y * words_per_row + (x >> 5)] |= 1 << (31 - (x & 31));
            }
        }
        TextSprite {
            bits,
            words_per_row,
            bbox_width: width,
            bbox_height: height,
            anchor_x: 0.0,
            anchor_y: 0.0,
        }
    }

    #[test]
    fn heavier_terms_get_larger_sizes() {
        let cat = font_size_for(3, 3, 100.0, 0.5);
        let bird = font_size_for(1, 3, 100.0, 0.5);
        assert_eq!(cat, 100.0);
        assert!((bird - 66.666_67).abs() < 1e-3);
        assert!(cat > bird);
        assert_eq!(font_size_for(1, 3, 100.0, 0.0), 100.0);
        assert!((font_size_for(1, 4, 100.0, 1.0) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn stamped_sprite_collides_with_overlap_only() {
        let mut map = CollisionMap::new(100, 50);
        let block = sprite(20, 10);
        assert!(!map.collides(&block, 37, 5));
        map.stamp(&block, 37, 5);
        assert!(map.collides(&block, 50, 10));
        assert!(map.collides(&block, 18, 14));
        assert!(!map.collides(&block, 57, 5));
        assert!(!map.collides(&block, 17, 5));
        assert!(!map.collides(&block, 37, 15));
    }

    #[test]
    fn leaving_the_canvas_collides() {
        let map = CollisionMap::new(64, 64);
        let block = sprite(10, 10);
        assert!(map.collides(&block, -1, 0));
        assert!(map.collides(&block, 0, -1));
        assert!(map.collides(&block, 0, 55));
        assert!(!map.collides(&block, 54, 54));
    }

    #[test]
    fn mask_blocks_non_fillable_pixels() {
        let canvas = Canvas::new(40, 40);
        let grid = OccupancyGrid::from_fn(canvas, |row, _| row >= 20);
        let mask = EngineMask::encode(&grid, Polarity::OccupiedIsFillable);
        let map = CollisionMap::from_mask(canvas, Some(&mask)).unwrap();
        let block = sprite(8, 8);
        assert!(map.collides(&block, 10, 15));
        assert!(!map.collides(&block, 10, 20));
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let grid = OccupancyGrid::filled(Canvas::new(10, 10), true);
        let mask = EngineMask::encode(&grid, Polarity::OccupiedIsFillable);
        assert!(CollisionMap::from_mask(Canvas::new(20, 10), Some(&mask)).is_err());
    }

    #[test]
    fn spiral_starts_near_center_and_expands() {
        let steps: Vec<(i32, i32)> = ArchimedeanSpiral::new(100, 100, 1).take(200).collect();
        assert!(steps[0].0.abs() <= 4 && steps[0].1.abs() <= 4);
        let reach = |p: &(i32, i32)| p.0.abs().max(p.1.abs());
        assert!(reach(&steps[199]) > reach(&steps[10]));
    }

    #[test]
    fn svg_escapes_terms() {
        let layout = WordLayout {
            canvas: Canvas::new(10, 10),
            background: Rgb::WHITE,
            words: vec![PlacedWord {
                text: "a<b&c".into(),
                weight: 1,
                font_size: 12.0,
                x: 1.0,
                y: 2.0,
                rotation: 0.0,
                color: Rgb::BLACK,
            }],
            font: None,
        };
        let svg = layout.to_svg();
        assert!(svg.contains("a&lt;b&amp;c"));
        assert!(svg.contains(r##"fill="#ffffff""##));
    }

    #[test]
    fn viewport_maps_crop_to_output() {
        let viewport = Viewport {
            x: 10.0,
            y: 20.0,
            width: 50.0,
            height: 25.0,
            output: Canvas::new(100, 50),
        };
        let mut point = tiny_skia::Point::from_xy(10.0, 20.0);
        viewport.transform().map_point(&mut point);
        assert_eq!((point.x, point.y), (0.0, 0.0));
        let mut far = tiny_skia::Point::from_xy(60.0, 45.0);
        viewport.transform().map_point(&mut far);
        assert_eq!((far.x, far.y), (100.0, 50.0));
    }

    fn engine_with(settings: LayoutConfig) -> Option<SpiralLayoutEngine> {
        let engine = SpiralLayoutEngine::new(settings);
        match engine.load_font(None) {
            Ok(_) => Some(engine),
            Err(_) => {
                eprintln!("host has no fonts installed, skipping");
                None
            }
        }
    }

    fn request<'a>(
        terms: &'a TermWeights,
        canvas: Canvas,
        mask: Option<&'a EngineMask>,
        colors: &'a ColorSource,
    ) -> LayoutRequest<'a> {
        LayoutRequest {
            terms: terms.as_slice(),
            canvas,
            background: Rgb::WHITE,
            mask,
            font: None,
            colors,
            max_words: 100,
            relative_scaling: 0.5,
        }
    }

    #[test]
    fn system_font_is_found_without_arial() {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if db.faces().next().is_none() {
            return;
        }
        assert!(pick_default_face(&db).is_some());
        assert!(system_sans_serif().is_some());
    }

    #[test]
    fn circle_layout_ranks_and_renders() {
        let Some(engine) = engine_with(LayoutConfig::default()) else {
            return;
        };
        let canvas = Canvas::new(400, 400);
        let grid = crate::geometry::generate(crate::shape::GeometricShape::Circle, canvas);
        let mask = EngineMask::encode(&grid, Polarity::OccupiedIsFillable);
        let terms = TermWeights::parse("cat,dog,bird").unwrap();
        let colors = ColorSource::default();

        let layout = engine
            .layout(&request(&terms, canvas, Some(&mask), &colors))
            .unwrap();
        let size_of = |text: &str| {
            layout
                .words
                .iter()
                .find(|w| w.text == text)
                .map(|w| w.font_size)
                .unwrap()
        };
        assert!(size_of("cat") > size_of("bird"));
        assert!(layout.words.iter().all(|w| colors.colors().contains(&w.color)));

        let raster = engine.render(&layout, Viewport::full(canvas)).unwrap();
        assert_eq!(raster.dimensions(), (400, 400));
        assert_eq!(raster.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert!(raster.pixels().any(|p| p.0 != [255, 255, 255, 255]));
    }

    #[test]
    fn oversized_term_shrinks_until_it_fits() {
        let settings = LayoutConfig {
            max_font_size: Some(200.0),
            angles: vec![0.0],
            ..LayoutConfig::default()
        };
        let Some(engine) = engine_with(settings) else {
            return;
        };
        let terms = TermWeights::parse("wordcloud").unwrap();
        let colors = ColorSource::default();
        let layout = engine
            .layout(&request(&terms, Canvas::new(120, 60), None, &colors))
            .unwrap();
        assert_eq!(layout.words.len(), 1);
        let size = layout.words[0].font_size;
        assert!(size < 200.0 && size >= 4.0, "{size}");
    }

    #[test]
    fn fully_blocked_mask_places_nothing() {
        let settings = LayoutConfig {
            max_attempts: 200,
            ..LayoutConfig::default()
        };
        let Some(engine) = engine_with(settings) else {
            return;
        };
        let canvas = Canvas::new(60, 60);
        let mask = EngineMask::encode(&OccupancyGrid::filled(canvas, false), Polarity::OccupiedIsFillable);
        let terms = TermWeights::parse("a,b").unwrap();
        let colors = ColorSource::default();
        let result = engine.layout(&request(&terms, canvas, Some(&mask), &colors));
        assert!(matches!(result, Err(Error::Render(_))));
    }
}
