//! Text shape.

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

use super::{ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// A text label anchored at the top-left of its bounding box.
///
/// The core tracks content and nominal metrics only; glyph layout is the
/// renderer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: EntityId,
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    /// Rotation in radians around the box center.
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Text {
    /// Default font size for newly added text shapes.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Step used by the grow/shrink font commands.
    pub const FONT_SIZE_STEP: f64 = 2.0;

    /// Smallest font size the engine will shrink to.
    pub const MIN_FONT_SIZE: f64 = 4.0;

    pub fn new(id: EntityId, position: Point, content: String, font_size: f64, style: ShapeStyle) -> Self {
        Self {
            id,
            position,
            content,
            font_size,
            rotation: 0.0,
            style,
        }
    }

    /// Nominal size of the unrotated text box, using fixed-advance metrics.
    pub fn box_size(&self) -> (f64, f64) {
        let longest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let lines = self.content.lines().count().max(1);
        (
            longest as f64 * self.font_size * 0.6,
            lines as f64 * self.font_size,
        )
    }

    fn center(&self) -> Point {
        let (w, h) = self.box_size();
        Point::new(self.position.x + w / 2.0, self.position.y + h / 2.0)
    }
}

impl ShapeGeometry for Text {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let (w, h) = self.box_size();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + w,
            self.position.y + h,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyphs are rasterized by the renderer; the outline path is empty.
        BezPath::new()
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        let center = self.center();
        // Keep the anchor's offset from the center consistent under scale.
        self.position = Point::new(
            center.x + (self.position.x - center.x) * delta.scale + delta.translate.x,
            center.y + (self.position.y - center.y) * delta.scale + delta.translate.y,
        );
        self.font_size *= delta.scale;
        self.rotation += delta.rotate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_size_tracks_longest_line() {
        let t = Text::new(
            EntityId::new(1),
            Point::new(0.0, 0.0),
            "hi\nlonger".into(),
            10.0,
            ShapeStyle::default(),
        );
        let (w, h) = t.box_size();
        assert!((w - 6.0 * 10.0 * 0.6).abs() < 1e-12);
        assert!((h - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_hit_inside_box() {
        let t = Text::new(
            EntityId::new(1),
            Point::new(0.0, 0.0),
            "hello".into(),
            20.0,
            ShapeStyle::default(),
        );
        assert!(t.hit_test(Point::new(10.0, 10.0), 0.0));
        assert!(!t.hit_test(Point::new(100.0, 100.0), 0.0));
    }
}
