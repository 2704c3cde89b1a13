//! Triangle shape.

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

use super::{point_to_polyline_dist, ShapeGeometry, ShapeStyle, ShapeTransform};
use crate::document::EntityId;

/// An equilateral triangle, apex up, rotatable about its centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub(crate) id: EntityId,
    pub center: Point,
    /// Edge length.
    pub size: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Triangle {
    pub fn new(id: EntityId, center: Point, size: f64, style: ShapeStyle) -> Self {
        Self {
            id,
            center,
            size,
            rotation: 0.0,
            style,
        }
    }

    /// Vertex points with rotation applied, centroid at `center`.
    pub fn vertices(&self) -> [Point; 3] {
        // Circumradius of an equilateral triangle with edge `size`.
        let r = self.size / 3f64.sqrt();
        [0usize, 1, 2].map(|i| {
            let angle = self.rotation - std::f64::consts::FRAC_PI_2
                + i as f64 * 2.0 * std::f64::consts::FRAC_PI_3;
            Point::new(
                self.center.x + r * angle.cos(),
                self.center.y + r * angle.sin(),
            )
        })
    }
}

impl ShapeGeometry for Triangle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let v = self.vertices();
        let xs = v.iter().map(|p| p.x);
        let ys = v.iter().map(|p| p.y);
        Rect::new(
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let v = self.vertices();
        let ring = [v[0], v[1], v[2], v[0]];
        point_to_polyline_dist(point, &ring) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let v = self.vertices();
        let mut path = BezPath::new();
        path.move_to(v[0]);
        path.line_to(v[1]);
        path.line_to(v[2]);
        path.close_path();
        path
    }

    fn transform(&mut self, delta: &ShapeTransform) {
        self.center += delta.translate;
        self.size *= delta.scale;
        self.rotation += delta.rotate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices_centered() {
        let t = Triangle::new(
            EntityId::new(1),
            Point::new(0.0, 0.0),
            6.0,
            ShapeStyle::default(),
        );
        let v = t.vertices();
        let cx = (v[0].x + v[1].x + v[2].x) / 3.0;
        let cy = (v[0].y + v[1].y + v[2].y) / 3.0;
        assert!(cx.abs() < 1e-9);
        assert!(cy.abs() < 1e-9);
    }

    #[test]
    fn test_scale_grows_edges() {
        let mut t = Triangle::new(
            EntityId::new(1),
            Point::new(0.0, 0.0),
            6.0,
            ShapeStyle::default(),
        );
        t.transform(&ShapeTransform::scaling(2.0));
        let v = t.vertices();
        assert!(((v[1] - v[0]).hypot() - 12.0).abs() < 1e-9);
    }
}
