//! Closed catalogue of silhouettes a render can take.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Parametric shapes whose occupancy is computed per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometricShape {
    Circle,
    Rectangle,
    Triangle,
    Heart,
    Star,
    Hexagon,
    Ellipse,
    Diamond,
    Pentagon,
    Octagon,
}

impl GeometricShape {
    pub const ALL: [GeometricShape; 10] = [
        GeometricShape::Circle,
        GeometricShape::Rectangle,
        GeometricShape::Triangle,
        GeometricShape::Heart,
        GeometricShape::Star,
        GeometricShape::Hexagon,
        GeometricShape::Ellipse,
        GeometricShape::Diamond,
        GeometricShape::Pentagon,
        GeometricShape::Octagon,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GeometricShape::Circle => "circle",
            GeometricShape::Rectangle => "rectangle",
            GeometricShape::Triangle => "triangle",
            GeometricShape::Heart => "heart",
            GeometricShape::Star => "star",
            GeometricShape::Hexagon => "hexagon",
            GeometricShape::Ellipse => "ellipse",
            GeometricShape::Diamond => "diamond",
            GeometricShape::Pentagon => "pentagon",
            GeometricShape::Octagon => "octagon",
        }
    }
}

/// Built-in reference images reused as silhouettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Dark pixels form the silhouette.
    ChinaMap,
    /// Bright pixels form the silhouette, and the compositor passes the
    /// grid through without inverting it.
    ShanghaiMap,
}

/// Which luminance side of the threshold counts as occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    DarkerThan(u8),
    BrighterThan(u8),
}

impl Threshold {
    pub fn occupied(&self, luma: u8) -> bool {
        match *self {
            Threshold::DarkerThan(limit) => luma < limit,
            Threshold::BrighterThan(limit) => luma > limit,
        }
    }
}

impl TemplateId {
    pub const ALL: [TemplateId; 2] = [TemplateId::ChinaMap, TemplateId::ShanghaiMap];

    pub fn id(&self) -> &'static str {
        match self {
            TemplateId::ChinaMap => "china_map",
            TemplateId::ShanghaiMap => "shanghai_map",
        }
    }

    /// File name looked up under the configured asset directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateId::ChinaMap => "chinamap.jpg",
            TemplateId::ShanghaiMap => "shanghai.png",
        }
    }

    pub fn threshold(&self) -> Threshold {
        match self {
            TemplateId::ChinaMap => Threshold::DarkerThan(128),
            TemplateId::ShanghaiMap => Threshold::BrighterThan(128),
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            TemplateId::ChinaMap => 0,
            TemplateId::ShanghaiMap => 1,
        }
    }
}

/// Every shape a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Geometric(GeometricShape),
    /// Silhouette derived from caller supplied image bytes.
    Custom,
    Template(TemplateId),
}

impl Default for ShapeKind {
    fn default() -> Self {
        ShapeKind::Geometric(GeometricShape::Circle)
    }
}

impl ShapeKind {
    pub fn id(&self) -> &'static str {
        match self {
            ShapeKind::Geometric(shape) => shape.id(),
            ShapeKind::Custom => "custom",
            ShapeKind::Template(template) => template.id(),
        }
    }

    pub fn requires_image(&self) -> bool {
        matches!(self, ShapeKind::Custom)
    }

    pub fn is_template(&self) -> bool {
        matches!(self, ShapeKind::Template(_))
    }

    /// Ids of all selectable shapes, custom last.
    pub fn catalogue() -> Vec<&'static str> {
        GeometricShape::ALL
            .iter()
            .map(GeometricShape::id)
            .chain(TemplateId::ALL.iter().map(TemplateId::id))
            .chain(std::iter::once("custom"))
            .collect()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ShapeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        if id == "custom" {
            return Ok(ShapeKind::Custom);
        }
        if let Some(shape) = GeometricShape::ALL.iter().find(|g| g.id() == id) {
            return Ok(ShapeKind::Geometric(*shape));
        }
        if let Some(template) = TemplateId::ALL.iter().find(|t| t.id() == id) {
            return Ok(ShapeKind::Template(*template));
        }
        Err(Error::Input(format!("unknown shape '{}'", s.trim())))
    }
}
