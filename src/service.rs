//! Request/response boundary: parses loosely typed request documents,
//! validates them, runs the renderer and shapes the reply.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::font::FontId;
use crate::grid::Canvas;
use crate::layout::LayoutEngine;
use crate::palette::{ColorTheme, Rgb};
use crate::pipeline::{encode_png, RenderRequest, Renderer};
use crate::shape::ShapeKind;
use crate::terms::TermWeights;
use crate::Error;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

fn default_shape() -> String {
    "circle".to_string()
}

fn default_width() -> i64 {
    800
}

fn default_height() -> i64 {
    400
}

fn default_background() -> String {
    "white".to_string()
}

fn default_font() -> String {
    FontId::Default.id().to_string()
}

fn default_theme() -> String {
    ColorTheme::default().id().to_string()
}

/// Render request as received from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequestDto {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Data URI (`data:image/png;base64,...`) or bare base64.
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub use_image_colors: bool,
    #[serde(default = "default_font")]
    pub font_name: String,
    #[serde(default = "default_theme")]
    pub color_theme: String,
    #[serde(default)]
    pub save_to_file: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

impl Default for RenderRequestDto {
    fn default() -> Self {
        Self {
            text: String::new(),
            shape: default_shape(),
            width: default_width(),
            height: default_height(),
            background_color: default_background(),
            image_data: None,
            use_image_colors: false,
            font_name: default_font(),
            color_theme: default_theme(),
            save_to_file: false,
            filename: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Internal => 500,
        }
    }
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Input(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success { success: bool, image: String },
    Failure { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: ResponseBody,
}

impl Response {
    fn success(png: &[u8]) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Success {
                success: true,
                image: format!("data:image/png;base64,{}", BASE64.encode(png)),
            },
        }
    }

    fn failure(err: &Error) -> Self {
        let kind = ErrorKind::from(err);
        Self {
            status: kind.status(),
            body: ResponseBody::Failure {
                error: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success { .. })
    }

    /// PNG bytes of a successful response.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        match &self.body {
            ResponseBody::Success { image, .. } => decode_image_data(image).ok(),
            ResponseBody::Failure { .. } => None,
        }
    }
}

/// Strips an optional `data:...;base64,` prefix and decodes the rest.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>, Error> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| Error::Input(format!("image data is not valid base64: {e}")))
}

/// Validates a request document into a [`RenderRequest`]. Nothing is
/// rendered here.
pub fn parse_request(dto: &RenderRequestDto) -> Result<RenderRequest, Error> {
    if dto.text.trim().is_empty() {
        return Err(Error::Input("please enter some terms".into()));
    }
    let shape: ShapeKind = dto.shape.parse()?;
    let has_image = dto.image_data.as_deref().is_some_and(|d| !d.trim().is_empty());
    if shape.requires_image() && !has_image {
        return Err(Error::Input("please upload an image for the custom shape".into()));
    }

    let terms = TermWeights::parse(&dto.text)?;
    let mut builder = RenderRequest::builder(terms)
        .shape(shape)
        .canvas(Canvas::from_requested(dto.width, dto.height))
        .background(Rgb::parse(&dto.background_color)?)
        .image_colors(dto.use_image_colors)
        .font(FontId::from_id(&dto.font_name));

    if let Some(theme) = ColorTheme::from_id(&dto.color_theme) {
        builder = builder.theme(theme);
    }
    if let Some(data) = dto.image_data.as_deref().filter(|d| !d.trim().is_empty()) {
        builder = builder.image(decode_image_data(data)?);
    }
    builder.build()
}

/// Runs one request end to end. Every failure is reported in the response,
/// never propagated.
pub fn handle<E: LayoutEngine>(renderer: &Renderer<E>, dto: &RenderRequestDto) -> Response {
    let request = match parse_request(dto) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected render request");
            return Response::failure(&err);
        }
    };

    let png = match renderer.render(&request).and_then(|img| encode_png(&img)) {
        Ok(png) => png,
        Err(err) => {
            error!(error = %err, shape = %request.shape(), "render failed");
            return Response::failure(&err);
        }
    };

    if dto.save_to_file {
        let canvas = request.canvas();
        let name = dto.filename.clone().unwrap_or_else(|| {
            format!("wordcloud_{}_{}x{}.png", request.shape(), canvas.width, canvas.height)
        });
        persist(&renderer.config().output_dir, &name, &png);
    }

    Response::success(&png)
}

/// Writes `png` under `dir`, keeping only the final path component of
/// `name`. Failures are logged and otherwise ignored.
pub fn persist(dir: &Path, name: &str, png: &[u8]) -> Option<PathBuf> {
    let file_name = Path::new(name).file_name()?;
    let path = dir.join(file_name);
    let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, png));
    match result {
        Ok(()) => {
            info!(path = %path.display(), "saved render");
            Some(path)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not save render");
            None
        }
    }
}

// =============================================================================
// Listings
// =============================================================================

pub fn shapes() -> Vec<&'static str> {
    ShapeKind::catalogue()
}

pub fn fonts() -> BTreeMap<&'static str, &'static str> {
    FontId::ALL.iter().map(|f| (f.id(), f.label())).collect()
}

pub fn themes() -> BTreeMap<&'static str, &'static str> {
    ColorTheme::ALL.iter().map(|t| (t.id(), t.label())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_bad_request() {
        let dto = RenderRequestDto {
            text: "  ".into(),
            ..Default::default()
        };
        let err = parse_request(&dto).unwrap_err();
        assert_eq!(ErrorKind::from(&err).status(), 400);
    }

    #[test]
    fn custom_without_image_is_bad_request() {
        let dto = RenderRequestDto {
            text: "a,b".into(),
            shape: "custom".into(),
            ..Default::default()
        };
        assert!(matches!(parse_request(&dto), Err(Error::Input(_))));
    }

    #[test]
    fn dimensions_and_defaults_are_applied() {
        let dto: RenderRequestDto =
            serde_json::from_str(r#"{"text": "x,y", "width": 0, "height": -3}"#).unwrap();
        let request = parse_request(&dto).unwrap();
        assert_eq!(request.canvas(), Canvas::new(800, 800));
        assert_eq!(request.theme(), Some(ColorTheme::Viridis));
        assert_eq!(request.font(), FontId::Default);

        let dto: RenderRequestDto = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert_eq!(parse_request(&dto).unwrap().canvas(), Canvas::new(800, 400));
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let dto = RenderRequestDto {
            text: "a".into(),
            color_theme: "sepia".into(),
            ..Default::default()
        };
        assert_eq!(parse_request(&dto).unwrap().theme(), None);
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        assert_eq!(decode_image_data("data:image/png;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_image_data("aGk=").unwrap(), b"hi");
        assert!(matches!(decode_image_data("data:x;base64,@@"), Err(Error::Input(_))));
    }

    #[test]
    fn listings_are_static() {
        assert!(shapes().contains(&"shanghai_map"));
        assert_eq!(fonts().len(), 8);
        assert_eq!(themes().len(), 14);
        assert_eq!(themes()["neon"], "Neon");
    }

    #[test]
    fn persist_keeps_only_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist(dir.path(), "../../escape.png", b"png").unwrap();
        assert_eq!(path, dir.path().join("escape.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"png");
    }

    #[test]
    fn success_body_serializes_like_payload() {
        let body = Response::success(b"hi").body;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["image"], "data:image/png;base64,aGk=");
    }
}
