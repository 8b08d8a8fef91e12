//! Turns a mask and a color choice into what the layout engine consumes,
//! then runs the engine.

use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::grid::{Canvas, OccupancyGrid};
use crate::layout::{LayoutEngine, LayoutRequest, Viewport, WordLayout};
use crate::palette::{ColorSource, ColorTheme, Rgb};
use crate::terms::TermWeights;
use crate::Error;

/// Upper bound on terms handed to the engine.
pub const MAX_WORDS: usize = 100;
/// Compression of size differences between term weights.
pub const RELATIVE_SCALING: f32 = 0.5;

/// How an occupancy grid maps onto engine intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Occupied cells become [`EngineMask::FILLABLE`].
    OccupiedIsFillable,
    /// The grid is passed through as is: occupied cells become
    /// [`EngineMask::BLOCKED`]. Used by the bright-threshold template.
    PassThrough,
}

/// Single channel mask in the engine's convention: `FILLABLE` pixels may
/// receive terms, anything else may not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl EngineMask {
    pub const FILLABLE: u8 = u8::MAX;
    pub const BLOCKED: u8 = u8::MIN;

    pub fn encode(grid: &OccupancyGrid, polarity: Polarity) -> Self {
        let (on, off) = match polarity {
            Polarity::OccupiedIsFillable => (Self::FILLABLE, Self::BLOCKED),
            Polarity::PassThrough => (Self::BLOCKED, Self::FILLABLE),
        };
        Self {
            width: grid.width(),
            height: grid.height(),
            data: grid.cells().iter().map(|&c| if c { on } else { off }).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return Self::BLOCKED;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn is_fillable(&self, x: u32, y: u32) -> bool {
        self.value(x, y) == Self::FILLABLE
    }

    pub fn fillable_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == Self::FILLABLE).count()
    }
}

/// Output of the mask generators, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskPlan {
    /// Full canvas usable; the engine gets no mask.
    Unmasked,
    Grid {
        grid: OccupancyGrid,
        polarity: Polarity,
    },
}

impl MaskPlan {
    pub fn occupied(grid: OccupancyGrid) -> Self {
        MaskPlan::Grid {
            grid,
            polarity: Polarity::OccupiedIsFillable,
        }
    }

    pub fn encode(&self) -> Option<EngineMask> {
        match self {
            MaskPlan::Unmasked => None,
            MaskPlan::Grid { grid, polarity } => Some(EngineMask::encode(grid, *polarity)),
        }
    }
}

/// Extracted palette wins over a named theme, which wins over the default.
pub fn select_colors(extracted: Option<Vec<Rgb>>, theme: Option<ColorTheme>) -> ColorSource {
    match (extracted, theme) {
        (Some(colors), _) if !colors.is_empty() => ColorSource::Palette(colors),
        (_, Some(theme)) => ColorSource::Theme(theme),
        _ => ColorSource::default(),
    }
}

/// A finished layout and its first raster.
#[derive(Debug, Clone)]
pub struct Composition {
    pub layout: WordLayout,
    pub raster: RgbaImage,
}

pub struct Compositor<'e> {
    engine: &'e dyn LayoutEngine,
    max_words: usize,
    relative_scaling: f32,
}

impl<'e> Compositor<'e> {
    pub fn new(engine: &'e dyn LayoutEngine) -> Self {
        Self {
            engine,
            max_words: MAX_WORDS,
            relative_scaling: RELATIVE_SCALING,
        }
    }

    pub fn with_limits(mut self, max_words: usize, relative_scaling: f32) -> Self {
        self.max_words = max_words;
        self.relative_scaling = relative_scaling;
        self
    }

    pub fn compose(
        &self,
        terms: &TermWeights,
        canvas: Canvas,
        background: Rgb,
        mask: &MaskPlan,
        font: Option<&Path>,
        colors: &ColorSource,
    ) -> Result<Composition, Error> {
        let engine_mask = mask.encode();
        if let Some(m) = &engine_mask {
            debug!(fillable = m.fillable_count(), total = m.data().len(), "mask encoded");
        }

        let request = LayoutRequest {
            terms: terms.as_slice(),
            canvas,
            background,
            mask: engine_mask.as_ref(),
            font,
            colors,
            max_words: self.max_words,
            relative_scaling: self.relative_scaling,
        };
        let layout = self.engine.layout(&request)?;
        let raster = self.engine.render(&layout, Viewport::full(canvas))?;
        Ok(Composition { layout, raster })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_grid() -> OccupancyGrid {
        OccupancyGrid::from_fn(Canvas::new(4, 2), |_, col| col < 2)
    }

    #[test]
    fn occupied_cells_become_fillable() {
        let mask = EngineMask::encode(&half_grid(), Polarity::OccupiedIsFillable);
        assert_eq!(mask.data(), &[255, 255, 0, 0, 255, 255, 0, 0]);
        assert!(mask.is_fillable(0, 1));
        assert!(!mask.is_fillable(3, 0));
    }

    #[test]
    fn pass_through_keeps_template_polarity() {
        let mask = EngineMask::encode(&half_grid(), Polarity::PassThrough);
        assert_eq!(mask.data(), &[0, 0, 255, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn unmasked_plan_sends_no_mask() {
        assert!(MaskPlan::Unmasked.encode().is_none());
    }

    #[test]
    fn color_priority() {
        let palette = vec![Rgb::new(1, 2, 3)];
        assert_eq!(
            select_colors(Some(palette.clone()), Some(ColorTheme::Neon)),
            ColorSource::Palette(palette)
        );
        assert_eq!(
            select_colors(Some(Vec::new()), Some(ColorTheme::Neon)),
            ColorSource::Theme(ColorTheme::Neon)
        );
        assert_eq!(
            select_colors(None, None),
            ColorSource::Theme(ColorTheme::Viridis)
        );
    }
}
