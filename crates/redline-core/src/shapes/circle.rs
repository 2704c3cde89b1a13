//! Circle shape.

use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

use super::{ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// A circle drawn as an outline around its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: EntityId,
    pub center: Point,
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Circle {
    pub fn new(id: EntityId, center: Point, radius: f64, style: ShapeStyle) -> Self {
        Self {
            id,
            center,
            radius,
            style,
        }
    }
}

impl ShapeGeometry for Circle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.radius,
            self.center.y + self.radius,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dist = (point - self.center).hypot();
        (dist - self.radius).abs() <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        kurbo::Circle::new(self.center, self.radius).to_path(0.1)
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        // Rotation is a no-op on a circle.
        self.center += delta.translate;
        self.radius *= delta.scale;
    }
}
