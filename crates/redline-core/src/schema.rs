//! Stable interchange schema for cross-engine sync.
//!
//! Records carry the full ordered entity list with original ids so a peer
//! engine can rebuild an equal document. Field names are stable snake_case;
//! unknown fields are ignored on read, so newer writers stay readable.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Entity, EntityId};
use crate::error::{EngineError, EngineResult};
use crate::shapes::{
    Arrow, BorderStyle, Circle, Measure, Rectangle, Rgba, Ruler, Shape, ShapeStyle, Text,
    Triangle,
};
use crate::stroke::Stroke;

/// One serialized entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    /// Entity kind: `stroke`, `circle`, `rect`, `triangle`, `arrow`,
    /// `ruler`, `text`, or `measure`.
    pub kind: String,
    /// Stroke samples or measurement anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    /// Primary drawing color.
    pub color: Rgba,
    /// Pen / outline width.
    pub width: f64,
    /// Stroke creation sequence number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleRecord>,
}

/// Kind-specific geometry parameters. Readers take what their kind needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

/// Selection border styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub border_color: Rgba,
    pub border_style: BorderStyle,
    pub border_width: f64,
}

/// Serialize the document's full ordered entity list.
pub fn to_records(doc: &Document) -> Vec<EntityRecord> {
    doc.entries().iter().map(from_entity).collect()
}

/// Encode records as a JSON array.
pub fn records_to_json(records: &[EntityRecord]) -> serde_json::Result<String> {
    serde_json::to_string(records)
}

/// Decode records from a JSON array, ignoring unknown fields.
pub fn records_from_json(json: &str) -> serde_json::Result<Vec<EntityRecord>> {
    serde_json::from_str(json)
}

pub fn from_entity(entity: &Entity) -> EntityRecord {
    match entity {
        Entity::Stroke(stroke) => EntityRecord {
            id: stroke.id().raw(),
            kind: "stroke".into(),
            points: Some(stroke.points.iter().map(|p| [p.x, p.y]).collect()),
            color: stroke.color,
            width: stroke.width,
            seq: Some(stroke.seq),
            geometry: None,
            style: None,
        },
        Entity::Shape(shape) => from_shape(shape),
    }
}

fn from_shape(shape: &Shape) -> EntityRecord {
    let style = shape.style();
    let mut points = None;
    let mut geo = GeometryRecord::default();
    match shape {
        Shape::Circle(c) => {
            geo.center = Some([c.center.x, c.center.y]);
            geo.radius = Some(c.radius);
        }
        Shape::Rect(r) => {
            geo.center = Some([r.center.x, r.center.y]);
            geo.width = Some(r.width);
            geo.height = Some(r.height);
            geo.rotation = Some(r.rotation);
        }
        Shape::Triangle(t) => {
            geo.center = Some([t.center.x, t.center.y]);
            geo.size = Some(t.size);
            geo.rotation = Some(t.rotation);
        }
        Shape::Arrow(a) => {
            geo.start = Some([a.start.x, a.start.y]);
            geo.end = Some([a.end.x, a.end.y]);
            geo.head_size = Some(a.head_size);
        }
        Shape::Ruler(r) => {
            geo.start = Some([r.start.x, r.start.y]);
            geo.end = Some([r.end.x, r.end.y]);
            geo.tick_size = Some(r.tick_size);
        }
        Shape::Text(t) => {
            geo.position = Some([t.position.x, t.position.y]);
            geo.content = Some(t.content.clone());
            geo.font_size = Some(t.font_size);
            geo.rotation = Some(t.rotation);
        }
        Shape::Measure(m) => {
            points = Some(m.anchors.iter().map(|p| [p.x, p.y]).collect());
        }
    }
    EntityRecord {
        id: shape.id().raw(),
        kind: kind_name(shape).into(),
        points,
        color: style.stroke_color,
        width: style.stroke_width,
        seq: None,
        geometry: (geo != GeometryRecord::default()).then_some(geo),
        style: Some(StyleRecord {
            border_color: style.border_color,
            border_style: style.border_style,
            border_width: style.border_width,
        }),
    }
}

fn kind_name(shape: &Shape) -> &'static str {
    match shape {
        Shape::Circle(_) => "circle",
        Shape::Rect(_) => "rect",
        Shape::Triangle(_) => "triangle",
        Shape::Arrow(_) => "arrow",
        Shape::Ruler(_) => "ruler",
        Shape::Text(_) => "text",
        Shape::Measure(_) => "measure",
    }
}

/// Rebuild an entity from a record, keeping its original id.
pub fn to_entity(record: &EntityRecord) -> EngineResult<Entity> {
    let id = EntityId::new(record.id);
    if record.kind == "stroke" {
        let points = points_from(record.points.as_deref(), "stroke points")?;
        return Ok(Entity::Stroke(Stroke::from_parts(
            id,
            record.seq.unwrap_or(0),
            points,
            record.color,
            record.width,
        )));
    }

    let style = shape_style_from(record);
    let geo = record.geometry.clone().unwrap_or_default();
    let shape = match record.kind.as_str() {
        "circle" => Shape::Circle(Circle::new(
            id,
            point_from(geo.center, "circle center")?,
            required(geo.radius, "circle radius")?,
            style,
        )),
        "rect" => {
            let mut rect = Rectangle::new(
                id,
                point_from(geo.center, "rect center")?,
                required(geo.width, "rect width")?,
                required(geo.height, "rect height")?,
                style,
            );
            rect.rotation = geo.rotation.unwrap_or(0.0);
            Shape::Rect(rect)
        }
        "triangle" => {
            let mut tri = Triangle::new(
                id,
                point_from(geo.center, "triangle center")?,
                required(geo.size, "triangle size")?,
                style,
            );
            tri.rotation = geo.rotation.unwrap_or(0.0);
            Shape::Triangle(tri)
        }
        "arrow" => {
            let mut arrow = Arrow::new(
                id,
                point_from(geo.start, "arrow start")?,
                point_from(geo.end, "arrow end")?,
                style,
            );
            if let Some(head) = geo.head_size {
                arrow.head_size = head;
            }
            Shape::Arrow(arrow)
        }
        "ruler" => {
            let mut ruler = Ruler::new(
                id,
                point_from(geo.start, "ruler start")?,
                point_from(geo.end, "ruler end")?,
                style,
            );
            if let Some(tick) = geo.tick_size {
                ruler.tick_size = tick;
            }
            Shape::Ruler(ruler)
        }
        "text" => {
            let content = geo
                .content
                .clone()
                .ok_or_else(|| EngineError::InvalidArgument("text content missing".into()))?;
            let mut text = Text::new(
                id,
                point_from(geo.position, "text position")?,
                content,
                geo.font_size.unwrap_or(Text::DEFAULT_FONT_SIZE),
                style,
            );
            text.rotation = geo.rotation.unwrap_or(0.0);
            Shape::Text(text)
        }
        "measure" => {
            let anchors = points_from(record.points.as_deref(), "measure anchors")?;
            let mut measure = Measure::new(id, anchors[0], style);
            measure.anchors = anchors;
            Shape::Measure(measure)
        }
        other => {
            return Err(EngineError::InvalidArgument(format!(
                "unknown entity kind {other:?}"
            )))
        }
    };
    Ok(Entity::Shape(shape))
}

fn shape_style_from(record: &EntityRecord) -> ShapeStyle {
    let mut style = ShapeStyle {
        stroke_color: record.color,
        stroke_width: record.width,
        ..ShapeStyle::default()
    };
    if let Some(border) = &record.style {
        style.border_color = border.border_color;
        style.border_style = border.border_style;
        style.border_width = border.border_width;
    }
    style
}

fn required<T>(value: Option<T>, what: &str) -> EngineResult<T> {
    value.ok_or_else(|| EngineError::InvalidArgument(format!("{what} missing")))
}

fn point_from(value: Option<[f64; 2]>, what: &str) -> EngineResult<Point> {
    required(value, what).map(|[x, y]| Point::new(x, y))
}

fn points_from(value: Option<&[[f64; 2]]>, what: &str) -> EngineResult<Vec<Point>> {
    let raw = value.ok_or_else(|| EngineError::InvalidArgument(format!("{what} missing")))?;
    if raw.is_empty() {
        return Err(EngineError::InvalidArgument(format!("{what} empty")));
    }
    Ok(raw.iter().map(|[x, y]| Point::new(*x, *y)).collect())
}
