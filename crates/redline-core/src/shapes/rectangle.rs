//! Rectangle shape.

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

use super::{point_to_polyline_dist, ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// An axis-aligned rectangle with optional rotation about its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: EntityId,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(id: EntityId, center: Point, width: f64, height: f64, style: ShapeStyle) -> Self {
        Self {
            id,
            center,
            width,
            height,
            rotation: 0.0,
            style,
        }
    }

    /// Corner points in drawing order, rotation applied.
    pub fn corners(&self) -> [Point; 4] {
        let (sin, cos) = self.rotation.sin_cos();
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
            Point::new(
                self.center.x + dx * cos - dy * sin,
                self.center.y + dx * sin + dy * cos,
            )
        })
    }
}

impl ShapeGeometry for Rectangle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let corners = self.corners();
        let xs = corners.iter().map(|p| p.x);
        let ys = corners.iter().map(|p| p.y);
        Rect::new(
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let c = self.corners();
        let ring = [c[0], c[1], c[2], c[3], c[0]];
        point_to_polyline_dist(point, &ring) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let c = self.corners();
        let mut path = BezPath::new();
        path.move_to(c[0]);
        path.line_to(c[1]);
        path.line_to(c[2]);
        path.line_to(c[3]);
        path.close_path();
        path
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        self.center += delta.translate;
        self.width *= delta.scale;
        self.height *= delta.scale;
        self.rotation += delta.rotate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_unrotated() {
        let r = Rectangle::new(
            EntityId::new(1),
            Point::new(10.0, 10.0),
            4.0,
            2.0,
            ShapeStyle::default(),
        );
        let c = r.corners();
        assert_eq!(c[0], Point::new(8.0, 9.0));
        assert_eq!(c[2], Point::new(12.0, 11.0));
    }

    #[test]
    fn test_rotation_preserves_center() {
        let mut r = Rectangle::new(
            EntityId::new(1),
            Point::new(10.0, 10.0),
            4.0,
            2.0,
            ShapeStyle::default(),
        );
        r.transform(&ShapeTransform::rotation(std::f64::consts::FRAC_PI_2));
        assert_eq!(r.center, Point::new(10.0, 10.0));
        let b = r.bounds();
        // Width and height trade places under a quarter turn.
        assert!((b.width() - 2.0).abs() < 1e-9);
        assert!((b.height() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_on_border() {
        let r = Rectangle::new(
            EntityId::new(1),
            Point::new(10.0, 10.0),
            4.0,
            2.0,
            ShapeStyle::default(),
        );
        assert!(r.hit_test(Point::new(8.0, 10.0), 0.5));
        assert!(!r.hit_test(Point::new(10.0, 10.0), 0.5));
    }
}
