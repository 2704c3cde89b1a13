//! Freehand stroke model.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::document::EntityId;
use crate::shapes::Rgba;

/// A freehand path: ordered points, a color, a width.
///
/// Strokes are immutable once finalized by the engine; the document owns
/// them exclusively. A fully transparent color marks an eraser stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: EntityId,
    pub points: Vec<Point>,
    pub color: Rgba,
    pub width: f64,
    /// Creation sequence number within the owning document.
    pub seq: u64,
}

impl Stroke {
    pub fn new(id: EntityId, seq: u64, first: Point, color: Rgba, width: f64) -> Self {
        Self {
            id,
            points: vec![first],
            color,
            width,
            seq,
        }
    }

    /// Rebuild a stroke from replayed data, keeping its original id.
    pub fn from_parts(id: EntityId, seq: u64, points: Vec<Point>, color: Rgba, width: f64) -> Self {
        Self {
            id,
            points,
            color,
            width,
            seq,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Append a sample point, coalescing points closer than `epsilon` to
    /// the previous one. Returns whether the point was kept.
    pub(crate) fn append(&mut self, point: Point, epsilon: f64) -> bool {
        if let Some(last) = self.points.last() {
            if (point - *last).hypot() < epsilon {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn is_eraser(&self) -> bool {
        self.color.is_transparent()
    }

    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_origin_size(self.points[0], (0.0, 0.0));
        for p in &self.points[1..] {
            rect = rect.union_pt(*p);
        }
        rect.inflate(self.width / 2.0, self.width / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_coalesces_close_points() {
        let mut stroke = Stroke::new(
            EntityId::new(1),
            0,
            Point::new(0.0, 0.0),
            Rgba::black(),
            5.0,
        );
        assert!(!stroke.append(Point::new(0.1, 0.1), 0.5));
        assert!(stroke.append(Point::new(1.0, 1.0), 0.5));
        assert_eq!(stroke.points.len(), 2);
    }

    #[test]
    fn test_bounds_include_pen_width() {
        let mut stroke = Stroke::new(
            EntityId::new(1),
            0,
            Point::new(0.0, 0.0),
            Rgba::black(),
            4.0,
        );
        stroke.append(Point::new(10.0, 0.0), 0.0);
        let b = stroke.bounds();
        assert!((b.x0 + 2.0).abs() < 1e-12);
        assert!((b.x1 - 12.0).abs() < 1e-12);
    }
}
