//! Ruler shape: a measuring line with perpendicular end ticks.

use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{point_to_segment_dist, ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruler {
    pub(crate) id: EntityId,
    pub start: Point,
    pub end: Point,
    /// Half-length of the perpendicular end ticks.
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
    pub style: ShapeStyle,
}

fn default_tick_size() -> f64 {
    10.0
}

impl Ruler {
    pub fn new(id: EntityId, start: Point, end: Point, style: ShapeStyle) -> Self {
        Self {
            id,
            start,
            end,
            tick_size: default_tick_size(),
            style,
        }
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Measured length in canvas units.
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    fn normal(&self) -> Vec2 {
        let d = self.end - self.start;
        let len = d.hypot();
        if len < f64::EPSILON {
            Vec2::new(0.0, 1.0)
        } else {
            Vec2::new(-d.y / len, d.x / len)
        }
    }
}

impl ShapeGeometry for Ruler {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end).inflate(self.tick_size, self.tick_size)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end)
            <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let n = self.normal() * self.tick_size;
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        for p in [self.start, self.end] {
            path.move_to(p - n);
            path.line_to(p + n);
        }
        path
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        let center = self.midpoint();
        self.start = delta.apply_point(self.start, center);
        self.end = delta.apply_point(self.end, center);
        self.tick_size *= delta.scale;
    }
}
