//! Trims the empty margin around template renders.

use image::RgbaImage;
use tracing::debug;

use crate::grid::Canvas;
use crate::layout::{LayoutEngine, Viewport, WordLayout};
use crate::Error;

/// Inclusive-exclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Mean of the color channels; 255 only for pure white.
fn luminance(pixel: &image::Rgba<u8>) -> f32 {
    (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / 3.0
}

/// Bounding box of every pixel below maximum luminance.
pub fn content_bounds(raster: &RgbaImage) -> Result<BoundingBox, Error> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in raster.enumerate_pixels() {
        if luminance(pixel) >= 255.0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let (x0, y0, x1, y1) = bounds.ok_or(Error::EmptyRender)?;
    Ok(BoundingBox {
        x: x0,
        y: y0,
        width: x1 - x0 + 1,
        height: y1 - y0 + 1,
    })
}

/// Crops `raster` to its content and renders that region again at the
/// largest size with the crop's aspect ratio that fits `canvas`.
///
/// The second pass goes through the engine rather than scaling pixels, so
/// glyph edges are rasterized at their final size.
pub fn crop_and_refit(
    engine: &dyn LayoutEngine,
    layout: &WordLayout,
    raster: &RgbaImage,
    canvas: Canvas,
) -> Result<RgbaImage, Error> {
    let bounds = content_bounds(raster)?;
    let output = canvas.fit_aspect(bounds.aspect());
    debug!(
        crop_x = bounds.x,
        crop_y = bounds.y,
        crop_width = bounds.width,
        crop_height = bounds.height,
        out_width = output.width,
        out_height = output.height,
        "re-rendering cropped template render"
    );

    // raster pixels are in layout units only when rendered at layout size
    let sx = layout.canvas.width as f32 / raster.width() as f32;
    let sy = layout.canvas.height as f32 / raster.height() as f32;
    let viewport = Viewport {
        x: bounds.x as f32 * sx,
        y: bounds.y as f32 * sy,
        width: bounds.width as f32 * sx,
        height: bounds.height as f32 * sy,
        output,
    };
    engine.render(layout, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutRequest;
    use crate::palette::Rgb;
    use image::Rgba;
    use std::sync::Mutex;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn bounds_cover_all_non_white_pixels() {
        let mut img = white(50, 40);
        img.put_pixel(10, 5, Rgba([0, 0, 0, 255]));
        img.put_pixel(30, 20, Rgba([254, 255, 255, 255]));
        let bounds = content_bounds(&img).unwrap();
        assert_eq!(
            bounds,
            BoundingBox {
                x: 10,
                y: 5,
                width: 21,
                height: 16
            }
        );
    }

    #[test]
    fn all_background_is_empty_render() {
        assert!(matches!(content_bounds(&white(8, 8)), Err(Error::EmptyRender)));
    }

    struct RecordingEngine {
        viewports: Mutex<Vec<Viewport>>,
    }

    impl LayoutEngine for RecordingEngine {
        fn layout(&self, _request: &LayoutRequest<'_>) -> Result<WordLayout, Error> {
            unreachable!("only rendering is exercised")
        }

        fn render(&self, _layout: &WordLayout, viewport: Viewport) -> Result<RgbaImage, Error> {
            self.viewports.lock().unwrap().push(viewport);
            Ok(white(viewport.output.width, viewport.output.height))
        }
    }

    #[test]
    fn refit_renders_crop_with_preserved_aspect() {
        let canvas = Canvas::new(200, 100);
        let layout = WordLayout {
            canvas,
            background: Rgb::WHITE,
            words: Vec::new(),
            font: None,
        };
        let mut raster = white(200, 100);
        // content block 40 wide, 80 tall
        for y in 10..90 {
            for x in 60..100 {
                raster.put_pixel(x, y, Rgba([20, 20, 20, 255]));
            }
        }
        let engine = RecordingEngine {
            viewports: Mutex::new(Vec::new()),
        };

        let out = crop_and_refit(&engine, &layout, &raster, canvas).unwrap();
        assert_eq!((out.width(), out.height()), (50, 100));

        let viewports = engine.viewports.lock().unwrap();
        assert_eq!(viewports.len(), 1);
        let v = viewports[0];
        assert_eq!((v.x, v.y, v.width, v.height), (60.0, 10.0, 40.0, 80.0));
    }
}
