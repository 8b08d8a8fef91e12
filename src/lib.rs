/*!
 * Shapecloud
 *
 * Renders a weighted term list into a word cloud whose silhouette follows a
 * geometric shape, an uploaded image or a built-in template, optionally
 * colored with a palette clustered out of a reference image.
 */

pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod font;
pub mod geometry;
pub mod grid;
pub mod image_mask;
pub mod layout;
pub mod palette;
pub mod pipeline;
pub mod postprocess;
pub mod service;
pub mod shape;
pub mod terms;

use thiserror::Error;

pub use config::{load_config, Config};
pub use grid::{Canvas, OccupancyGrid};
pub use layout::{LayoutEngine, SpiralLayoutEngine};
pub use palette::{ColorTheme, Rgb};
pub use pipeline::{encode_png, RenderRequest, RenderRequestBuilder, Renderer};
pub use shape::{GeometricShape, ShapeKind, TemplateId};
pub use terms::{TermWeights, WeightedTerm};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Image decode error: {0}")]
    Decode(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Rendered image has no content to crop")]
    EmptyRender,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders `text` (comma separated terms) into the given shape with the
/// default configuration and returns the PNG bytes.
pub fn generate(text: &str, shape: ShapeKind, width: u32, height: u32) -> Result<Vec<u8>, Error> {
    let renderer = Renderer::new(Config::default());
    let request = RenderRequest::builder(TermWeights::parse(text)?)
        .shape(shape)
        .size(width, height)
        .build()?;
    let image = renderer.render(&request)?;
    encode_png(&image)
}
