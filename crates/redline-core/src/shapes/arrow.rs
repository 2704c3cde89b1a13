//! Arrow shape.

use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{point_to_segment_dist, ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// A straight arrow with the head at `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub(crate) id: EntityId,
    pub start: Point,
    pub end: Point,
    /// Length of the arrowhead barbs.
    #[serde(default = "default_head_size")]
    pub head_size: f64,
    pub style: ShapeStyle,
}

fn default_head_size() -> f64 {
    15.0
}

impl Arrow {
    pub fn new(id: EntityId, start: Point, end: Point, style: ShapeStyle) -> Self {
        Self {
            id,
            start,
            end,
            head_size: default_head_size(),
            style,
        }
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Unit direction from start to end.
    pub fn direction(&self) -> Vec2 {
        let d = self.end - self.start;
        let len = d.hypot();
        if len < f64::EPSILON {
            Vec2::new(1.0, 0.0)
        } else {
            d / len
        }
    }

    /// The two barb endpoints of the arrowhead.
    pub fn barbs(&self) -> [Point; 2] {
        let dir = self.direction();
        let angle = std::f64::consts::FRAC_PI_6;
        let (sin, cos) = angle.sin_cos();
        let rotate = |v: Vec2, s: f64| Vec2::new(v.x * cos - v.y * s, v.x * s + v.y * cos);
        [
            self.end - rotate(dir, sin) * self.head_size,
            self.end - rotate(dir, -sin) * self.head_size,
        ]
    }
}

impl ShapeGeometry for Arrow {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end)
            <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        let [a, b] = self.barbs();
        path.move_to(a);
        path.line_to(self.end);
        path.line_to(b);
        path
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        let center = self.midpoint();
        self.start = delta.apply_point(self.start, center);
        self.end = delta.apply_point(self.end, center);
        self.head_size *= delta.scale;
    }
}
