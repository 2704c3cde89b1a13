//! Shape definitions for the annotation canvas.

mod arrow;
mod circle;
mod measure;
mod rectangle;
mod ruler;
mod text;
mod triangle;

pub use arrow::Arrow;
pub use circle::Circle;
pub use measure::Measure;
pub use rectangle::Rectangle;
pub use ruler::Ruler;
pub use text::Text;
pub use triangle::Triangle;

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::document::EntityId;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Fully transparent colors mark eraser strokes.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Border style drawn around a selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    Dashed,
    Solid,
}

/// Style properties shared by all shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Outline color.
    pub stroke_color: Rgba,
    /// Outline width.
    pub stroke_width: f64,
    /// Selection border color (transparent = no border).
    #[serde(default = "Rgba::transparent")]
    pub border_color: Rgba,
    /// Selection border style.
    #[serde(default)]
    pub border_style: BorderStyle,
    /// Selection border width.
    #[serde(default = "default_border_width")]
    pub border_width: f64,
}

fn default_border_width() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::black(),
            stroke_width: 5.0,
            border_color: Rgba::transparent(),
            border_style: BorderStyle::default(),
            border_width: 1.0,
        }
    }
}

/// A translate/scale/rotate delta applied to a shape about its own center.
///
/// Deltas compose so that applying a transform followed by its [`inverse`]
/// restores the original geometry.
///
/// [`inverse`]: ShapeTransform::inverse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeTransform {
    #[serde(default)]
    pub translate: Vec2,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Rotation delta in radians.
    #[serde(default)]
    pub rotate: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
            rotate: 0.0,
        }
    }
}

impl ShapeTransform {
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            translate: Vec2::new(dx, dy),
            ..Self::default()
        }
    }

    pub fn scaling(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn rotation(radians: f64) -> Self {
        Self {
            rotate: radians,
            ..Self::default()
        }
    }

    /// The delta that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            translate: -self.translate,
            scale: 1.0 / self.scale,
            rotate: -self.rotate,
        }
    }

    /// Rotate and scale `point` about `center`, then translate.
    pub(crate) fn apply_point(&self, point: Point, center: Point) -> Point {
        let (sin, cos) = self.rotate.sin_cos();
        let d = (point - center) * self.scale;
        Point::new(
            center.x + d.x * cos - d.y * sin + self.translate.x,
            center.y + d.x * sin + d.y * cos + self.translate.y,
        )
    }
}

/// Shape kind discriminant, matching the serialized `kind` labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Circle,
    Rect,
    Triangle,
    Arrow,
    Ruler,
    Text,
    Measure,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "Circle",
            ShapeKind::Rect => "Rect",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Arrow => "Arrow",
            ShapeKind::Ruler => "Ruler",
            ShapeKind::Text => "Text",
            ShapeKind::Measure => "MeasurementTool",
        }
    }
}

/// Construction parameters accepted by `add_shape`.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeParams {
    Circle { center: Point, radius: f64 },
    Rect { center: Point, width: f64, height: f64 },
    /// A square is a rectangle with equal sides.
    Square { center: Point, size: f64 },
    Triangle { center: Point, size: f64 },
    Arrow { start: Point, end: Point },
    Ruler { start: Point, end: Point },
    Text { position: Point, content: String, font_size: f64 },
    /// Starts a measurement tool at its first anchor point.
    Measure { first: Point },
}

/// Geometry behavior implemented by every shape variant.
pub trait ShapeGeometry {
    /// Unique identifier.
    fn id(&self) -> EntityId;

    /// Axis-aligned bounding box.
    fn bounds(&self) -> Rect;

    /// Whether `point` hits this shape within `tolerance`.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Outline path used for rendering.
    fn to_path(&self) -> BezPath;

    /// Apply a translate/scale/rotate delta about the shape's center.
    fn transform(&mut self, delta: &ShapeTransform);
}

/// Closed set of shape variants dispatched by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle(Circle),
    Rect(Rectangle),
    Triangle(Triangle),
    Arrow(Arrow),
    Ruler(Ruler),
    Text(Text),
    Measure(Measure),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Circle($s) => $body,
            Shape::Rect($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Ruler($s) => $body,
            Shape::Text($s) => $body,
            Shape::Measure($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> EntityId {
        dispatch!(self, s => s.id())
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Rect(_) => ShapeKind::Rect,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Ruler(_) => ShapeKind::Ruler,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Measure(_) => ShapeKind::Measure,
        }
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn transform(&mut self, delta: &ShapeTransform) {
        dispatch!(self, s => s.transform(delta))
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => &s.style)
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => &mut s.style)
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_measure(&self) -> Option<&Measure> {
        match self {
            Shape::Measure(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_measure_mut(&mut self) -> Option<&mut Measure> {
        match self {
            Shape::Measure(m) => Some(m),
            _ => None,
        }
    }
}

/// Distance from a point to the segment a-b.
pub(crate) fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub(crate) fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return (point - points[0]).hypot();
    }
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_inverse_roundtrip() {
        let t = ShapeTransform {
            translate: Vec2::new(3.0, -2.0),
            scale: 2.0,
            rotate: 0.5,
        };
        let inv = t.inverse();
        let center = Point::new(10.0, 10.0);
        let p = Point::new(14.0, 11.0);
        let moved = t.apply_point(p, center);
        let back = inv.apply_point(moved, center + t.translate);
        assert!((back - p).hypot() < 1e-9);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((point_to_segment_dist(Point::new(-4.0, 0.0), a, b) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_transparent_marks_eraser() {
        assert!(Rgba::transparent().is_transparent());
        assert!(!Rgba::black().is_transparent());
    }
}
