//! Request → mask → composition → (template) post-processing.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::assets::AssetStore;
use crate::compositor::{select_colors, Compositor, MaskPlan, Polarity};
use crate::config::Config;
use crate::font::FontId;
use crate::geometry;
use crate::grid::Canvas;
use crate::image_mask;
use crate::layout::{LayoutEngine, SpiralLayoutEngine};
use crate::palette::{extract_palette_or_fallback, ColorTheme, Rgb};
use crate::postprocess::crop_and_refit;
use crate::shape::{GeometricShape, ShapeKind, TemplateId};
use crate::terms::TermWeights;
use crate::Error;

// =============================================================================
// Request
// =============================================================================

/// One render, validated and immutable.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    terms: TermWeights,
    shape: ShapeKind,
    canvas: Canvas,
    background: Rgb,
    image: Option<Arc<Vec<u8>>>,
    use_image_colors: bool,
    font: FontId,
    theme: Option<ColorTheme>,
}

impl RenderRequest {
    pub fn builder(terms: TermWeights) -> RenderRequestBuilder {
        RenderRequestBuilder::new(terms)
    }

    pub fn terms(&self) -> &TermWeights {
        &self.terms
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref().map(Vec::as_slice)
    }

    pub fn use_image_colors(&self) -> bool {
        self.use_image_colors
    }

    pub fn font(&self) -> FontId {
        self.font
    }

    pub fn theme(&self) -> Option<ColorTheme> {
        self.theme
    }
}

pub struct RenderRequestBuilder {
    terms: TermWeights,
    shape: ShapeKind,
    canvas: Canvas,
    background: Rgb,
    image: Option<Vec<u8>>,
    use_image_colors: bool,
    font: FontId,
    theme: Option<ColorTheme>,
}

impl RenderRequestBuilder {
    pub fn new(terms: TermWeights) -> Self {
        Self {
            terms,
            shape: ShapeKind::default(),
            canvas: Canvas::default(),
            background: Rgb::WHITE,
            image: None,
            use_image_colors: false,
            font: FontId::Default,
            theme: None,
        }
    }

    pub fn shape(mut self, shape: ShapeKind) -> Self {
        self.shape = shape;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.canvas = Canvas::new(width, height);
        self
    }

    pub fn canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn background(mut self, color: Rgb) -> Self {
        self.background = color;
        self
    }

    pub fn image(mut self, bytes: Vec<u8>) -> Self {
        self.image = (!bytes.is_empty()).then_some(bytes);
        self
    }

    pub fn image_colors(mut self, enabled: bool) -> Self {
        self.use_image_colors = enabled;
        self
    }

    pub fn font(mut self, font: FontId) -> Self {
        self.font = font;
        self
    }

    pub fn theme(mut self, theme: ColorTheme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn build(self) -> Result<RenderRequest, Error> {
        if self.terms.is_empty() {
            return Err(Error::Input("term list is empty".into()));
        }
        if self.shape.requires_image() && self.image.is_none() {
            return Err(Error::Input(format!(
                "shape '{}' requires an image",
                self.shape
            )));
        }
        Ok(RenderRequest {
            terms: self.terms,
            shape: self.shape,
            canvas: self.canvas,
            background: self.background,
            image: self.image.map(Arc::new),
            use_image_colors: self.use_image_colors,
            font: self.font,
            theme: self.theme,
        })
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Long-lived renderer: configuration, shared assets and a layout engine.
/// Holds no per-request state; share it by reference across threads.
pub struct Renderer<E: LayoutEngine = SpiralLayoutEngine> {
    config: Config,
    assets: AssetStore,
    engine: E,
}

impl Renderer<SpiralLayoutEngine> {
    pub fn new(config: Config) -> Self {
        let engine = SpiralLayoutEngine::new(config.layout.clone());
        Self::with_engine(config, engine)
    }
}

impl<E: LayoutEngine> Renderer<E> {
    pub fn with_engine(config: Config, engine: E) -> Self {
        let assets = AssetStore::new(config.asset_dir.clone());
        Self {
            config,
            assets,
            engine,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Occupancy mask for the request's shape.
    pub fn mask_for(&self, request: &RenderRequest) -> Result<MaskPlan, Error> {
        let canvas = request.canvas();
        let plan = match request.shape() {
            ShapeKind::Geometric(GeometricShape::Rectangle) => MaskPlan::Unmasked,
            ShapeKind::Geometric(shape) => MaskPlan::occupied(geometry::generate(shape, canvas)),
            ShapeKind::Custom => {
                let bytes = request
                    .image()
                    .ok_or_else(|| Error::Input("custom shape requires an image".into()))?;
                MaskPlan::occupied(image_mask::from_image_bytes(bytes, canvas)?)
            }
            ShapeKind::Template(template) => MaskPlan::Grid {
                grid: image_mask::template_mask(&self.assets, template, canvas),
                polarity: match template {
                    TemplateId::ChinaMap => Polarity::OccupiedIsFillable,
                    TemplateId::ShanghaiMap => Polarity::PassThrough,
                },
            },
        };
        Ok(plan)
    }

    pub fn render(&self, request: &RenderRequest) -> Result<RgbaImage, Error> {
        let canvas = request.canvas();
        info!(
            shape = %request.shape(),
            width = canvas.width,
            height = canvas.height,
            terms = request.terms().len(),
            "rendering word cloud"
        );

        let mask = self.mask_for(request)?;

        let extracted = match (request.use_image_colors(), request.image()) {
            (true, Some(bytes)) => Some(extract_palette_or_fallback(bytes, self.config.palette_size)),
            _ => None,
        };
        let colors = select_colors(extracted, request.theme());
        debug!(colors = ?colors, "color source selected");

        let font = self.assets.font_path(request.font());
        let composition = Compositor::new(&self.engine)
            .with_limits(self.config.layout.max_words, self.config.layout.relative_scaling)
            .compose(
                request.terms(),
                canvas,
                request.background(),
                &mask,
                font,
                &colors,
            )?;

        if request.shape().is_template() {
            return crop_and_refit(&self.engine, &composition.layout, &composition.raster, canvas);
        }
        Ok(composition.raster)
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, Error> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Render(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> TermWeights {
        TermWeights::parse("cat,dog,bird").unwrap()
    }

    #[test]
    fn custom_shape_without_image_is_rejected() {
        let err = RenderRequest::builder(terms()).shape(ShapeKind::Custom).build();
        assert!(matches!(err, Err(Error::Input(_))));
        let err = RenderRequest::builder(terms())
            .shape(ShapeKind::Custom)
            .image(Vec::new())
            .build();
        assert!(matches!(err, Err(Error::Input(_))));
    }

    #[test]
    fn builder_defaults() {
        let request = RenderRequest::builder(terms()).build().unwrap();
        assert_eq!(request.shape(), ShapeKind::Geometric(GeometricShape::Circle));
        assert_eq!(request.canvas(), Canvas::new(800, 800));
        assert_eq!(request.background(), Rgb::WHITE);
        assert!(request.image().is_none());
        assert_eq!(request.theme(), None);
    }

    #[test]
    fn rectangle_is_unmasked() {
        let renderer = Renderer::new(Config::default());
        let request = RenderRequest::builder(terms())
            .shape(ShapeKind::Geometric(GeometricShape::Rectangle))
            .build()
            .unwrap();
        assert_eq!(renderer.mask_for(&request).unwrap(), MaskPlan::Unmasked);
    }

    #[test]
    fn png_encoding_has_signature() {
        let img = RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 255]));
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
