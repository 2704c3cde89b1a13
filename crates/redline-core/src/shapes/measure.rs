//! Measurement tool: a polyline built anchor-by-anchor.

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

use super::{point_to_polyline_dist, ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// Maximum number of anchor points a measurement accepts.
pub const MAX_ANCHORS: usize = 3;

/// A measurement tool under stepwise construction.
///
/// Anchors are placed one tap at a time; until [`MAX_ANCHORS`] are placed
/// the tool counts as in progress, and undo peels anchors off before
/// removing the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub(crate) id: EntityId,
    pub anchors: Vec<Point>,
    pub style: ShapeStyle,
}

impl Measure {
    pub fn new(id: EntityId, first: Point, style: ShapeStyle) -> Self {
        Self {
            id,
            anchors: vec![first],
            style,
        }
    }

    /// Add the next anchor. Returns false when the tool is already full.
    pub fn push_anchor(&mut self, point: Point) -> bool {
        if self.anchors.len() < MAX_ANCHORS {
            self.anchors.push(point);
            true
        } else {
            false
        }
    }

    /// Remove the most recent anchor. Returns it, or None if only the
    /// first anchor remains (the entity itself should be removed instead).
    pub fn pop_anchor(&mut self) -> Option<Point> {
        if self.anchors.len() > 1 {
            self.anchors.pop()
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.anchors.len() == MAX_ANCHORS
    }

    /// Current drawing step (number of anchors placed so far).
    pub fn drawing_step(&self) -> usize {
        self.anchors.len()
    }

    /// Total polyline length over the placed anchors.
    pub fn measured_length(&self) -> f64 {
        self.anchors
            .windows(2)
            .map(|w| (w[1] - w[0]).hypot())
            .sum()
    }

    fn centroid(&self) -> Point {
        let n = self.anchors.len() as f64;
        let sum = self
            .anchors
            .iter()
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.x, acc.1 + p.y));
        Point::new(sum.0 / n, sum.1 / n)
    }
}

impl ShapeGeometry for Measure {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut rect = Rect::from_origin_size(self.anchors[0], (0.0, 0.0));
        for p in &self.anchors[1..] {
            rect = rect.union_pt(*p);
        }
        rect
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.anchors)
            <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.anchors.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
        }
        path
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        let center = self.centroid();
        for p in &mut self.anchors {
            *p = delta.apply_point(*p, center);
        }
    }
}
