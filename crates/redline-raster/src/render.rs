//! Document rasterization.
//!
//! Renders a core document into a pixmap: background image, under-sketch
//! overlays, ink (strokes and shapes in z-order), over-sketch overlays.
//! Eraser strokes clear ink coverage without touching the background,
//! matching the layered-bitmap behavior of handheld annotation canvases.

use kurbo::{PathEl, Point, Shape as KurboShape};
use redline_core::document::{ContentMode, Document, Entity, EntityId};
use redline_core::shapes::{BorderStyle, Shape};
use redline_core::Rgba;

use crate::export::ExportError;
use crate::font;
use crate::pixmap::Pixmap;

/// Flattening tolerance for shape outlines.
const PATH_TOLERANCE: f64 = 0.1;

/// Radius of the filled measurement anchor marker.
const ANCHOR_RADIUS: f64 = 6.0;

/// Radius of the measurement anchor ring.
const ANCHOR_RING_RADIUS: f64 = 8.0;

/// Rasterization parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Canvas size in pixels.
    pub width: u32,
    pub height: u32,
    /// Leave the backdrop transparent instead of filling it white.
    pub transparent: bool,
    pub include_background: bool,
    pub include_overlays: bool,
    /// Use the background image's native size as the canvas size.
    pub crop_to_background: bool,
    /// Shape to draw a selection border around.
    pub highlight: Option<EntityId>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            transparent: false,
            include_background: true,
            include_overlays: true,
            crop_to_background: false,
            highlight: None,
        }
    }
}

/// Render the document into a fresh pixmap.
pub fn render_document(doc: &Document, options: &RenderOptions) -> Result<Pixmap, ExportError> {
    if options.width == 0 || options.height == 0 {
        return Err(ExportError::InvalidOptions(
            "canvas size must be nonzero".into(),
        ));
    }

    let background = match &doc.background {
        Some(bg) if options.include_background || options.crop_to_background => {
            let decoded = image::load_from_memory(&bg.data)
                .map_err(|e| ExportError::Decode(e.to_string()))?
                .into_rgba8();
            Some((decoded, bg.content_mode))
        }
        _ => None,
    };

    let (width, height) = match (&background, options.crop_to_background) {
        (Some((decoded, _)), true) => (decoded.width(), decoded.height()),
        _ => (options.width, options.height),
    };

    let mut base = Pixmap::new(width, height);
    if !options.transparent {
        base.fill(Rgba::white());
    }

    if options.include_background {
        if let Some((decoded, mode)) = &background {
            draw_background(&mut base, decoded, *mode);
        }
    }

    if options.include_overlays {
        for overlay in doc.overlays.iter().filter(|o| !o.over_sketch) {
            font::draw_text(
                &mut base,
                &overlay.text,
                overlay.position,
                overlay.font_size,
                overlay.color,
            );
        }
    }

    let mut ink = Pixmap::new(width, height);
    for entity in doc.entries() {
        match entity {
            Entity::Stroke(stroke) => {
                ink.stroke_polyline(
                    &stroke.points,
                    stroke.width,
                    stroke.color,
                    stroke.is_eraser(),
                );
            }
            Entity::Shape(shape) => draw_shape(&mut ink, shape),
        }
    }

    if let Some(id) = options.highlight {
        if let Some(shape) = doc.shape(id) {
            draw_selection_border(&mut ink, shape);
        }
    }

    base.composite_over(&ink);

    if options.include_overlays {
        for overlay in doc.overlays.iter().filter(|o| o.over_sketch) {
            font::draw_text(
                &mut base,
                &overlay.text,
                overlay.position,
                overlay.font_size,
                overlay.color,
            );
        }
    }

    Ok(base)
}

fn draw_shape(ink: &mut Pixmap, shape: &Shape) {
    let style = shape.style();
    match shape {
        Shape::Text(text) => {
            // TODO: honor text rotation once the glyph blitter can step
            // through rotated cell grids.
            font::draw_text(
                ink,
                &text.content,
                text.position,
                text.font_size,
                style.stroke_color,
            );
        }
        Shape::Measure(measure) => {
            ink.stroke_polyline(
                &measure.anchors,
                style.stroke_width,
                style.stroke_color,
                false,
            );
            for anchor in &measure.anchors {
                ink.stamp_disc(*anchor, ANCHOR_RADIUS, style.stroke_color, false);
                let ring_path = kurbo::Circle::new(*anchor, ANCHOR_RING_RADIUS)
                    .to_path(PATH_TOLERANCE);
                for ring in flatten_path(ring_path.elements()) {
                    ink.stroke_polyline(&ring, 2.0, style.stroke_color, false);
                }
            }
        }
        _ => {
            let path = shape.to_path();
            for polyline in flatten_path(path.elements()) {
                ink.stroke_polyline(&polyline, style.stroke_width, style.stroke_color, false);
            }
        }
    }
}

fn draw_selection_border(ink: &mut Pixmap, shape: &Shape) {
    let style = shape.style();
    if style.border_color.is_transparent() {
        return;
    }
    let bounds = shape.bounds().inflate(4.0, 4.0);
    let ring = [
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
        Point::new(bounds.x0, bounds.y0),
    ];
    match style.border_style {
        BorderStyle::Dashed => {
            ink.stroke_dashed_polyline(&ring, style.border_width, style.border_color)
        }
        BorderStyle::Solid => {
            ink.stroke_polyline(&ring, style.border_width, style.border_color, false)
        }
    }
}

/// Flatten path elements into polylines, one per subpath.
fn flatten_path(elements: &[PathEl]) -> Vec<Vec<Point>> {
    let mut polylines = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut subpath_start = Point::ZERO;
    kurbo::flatten(elements.iter().copied(), PATH_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            if current.len() > 1 {
                polylines.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            subpath_start = p;
            current.push(p);
        }
        PathEl::LineTo(p) => current.push(p),
        PathEl::ClosePath => current.push(subpath_start),
        _ => unreachable!("flatten emits only moves, lines and closes"),
    });
    if current.len() > 1 {
        polylines.push(current);
    }
    polylines
}

fn draw_background(
    base: &mut Pixmap,
    decoded: &image::RgbaImage,
    mode: ContentMode,
) {
    let (cw, ch) = (base.width() as f64, base.height() as f64);
    let (iw, ih) = (decoded.width() as f64, decoded.height() as f64);
    if iw == 0.0 || ih == 0.0 {
        return;
    }
    // Target rect of the image in canvas coordinates.
    let (tx, ty, tw, th) = match mode {
        ContentMode::ScaleToFill => (0.0, 0.0, cw, ch),
        ContentMode::AspectFit => {
            let scale = (cw / iw).min(ch / ih);
            let (tw, th) = (iw * scale, ih * scale);
            ((cw - tw) / 2.0, (ch - th) / 2.0, tw, th)
        }
        ContentMode::AspectFill => {
            let scale = (cw / iw).max(ch / ih);
            let (tw, th) = (iw * scale, ih * scale);
            ((cw - tw) / 2.0, (ch - th) / 2.0, tw, th)
        }
    };

    let x0 = tx.max(0.0).floor() as i64;
    let y0 = ty.max(0.0).floor() as i64;
    let x1 = ((tx + tw).min(cw)).ceil() as i64;
    let y1 = ((ty + th).min(ch)).ceil() as i64;
    for y in y0..y1 {
        for x in x0..x1 {
            let u = ((x as f64 + 0.5 - tx) / tw * iw).floor();
            let v = ((y as f64 + 0.5 - ty) / th * ih).floor();
            let u = (u.max(0.0) as u32).min(decoded.width() - 1);
            let v = (v.max(0.0) as u32).min(decoded.height() - 1);
            let px = decoded.get_pixel(u, v).0;
            base.blend_pixel(x, y, Rgba::new(px[0], px[1], px[2], px[3]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::shapes::ShapeParams;
    use redline_core::SketchEngine;

    fn options(w: u32, h: u32) -> RenderOptions {
        RenderOptions {
            width: w,
            height: h,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_zero_canvas_is_rejected() {
        let doc = Document::new();
        assert!(matches!(
            render_document(&doc, &options(0, 10)),
            Err(ExportError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_stroke_leaves_ink() {
        let mut engine = SketchEngine::new();
        let id = engine
            .begin_stroke(Point::new(2.0, 8.0), Rgba::new(255, 0, 0, 255), 4.0)
            .unwrap();
        engine.extend_stroke(id, Point::new(13.0, 8.0)).unwrap();
        engine.end_stroke(id).unwrap();

        let pm = render_document(engine.document(), &options(16, 16)).unwrap();
        let px = pm.pixel(8, 8);
        assert_eq!((px.r, px.g, px.b, px.a), (255, 0, 0, 255));
    }

    #[test]
    fn test_eraser_restores_backdrop() {
        let mut engine = SketchEngine::new();
        let id = engine
            .begin_stroke(Point::new(2.0, 8.0), Rgba::black(), 4.0)
            .unwrap();
        engine.extend_stroke(id, Point::new(13.0, 8.0)).unwrap();
        engine.end_stroke(id).unwrap();
        let id = engine
            .begin_stroke(Point::new(2.0, 8.0), Rgba::transparent(), 6.0)
            .unwrap();
        engine.extend_stroke(id, Point::new(13.0, 8.0)).unwrap();
        engine.end_stroke(id).unwrap();

        let pm = render_document(engine.document(), &options(16, 16)).unwrap();
        assert_eq!(pm.pixel(8, 8), Rgba::white());
    }

    #[test]
    fn test_circle_outline_is_drawn() {
        let mut engine = SketchEngine::new();
        engine
            .add_shape(ShapeParams::Circle {
                center: Point::new(16.0, 16.0),
                radius: 10.0,
            })
            .unwrap();
        let pm = render_document(engine.document(), &options(32, 32)).unwrap();
        // On the outline, ink; at the center, backdrop.
        assert_eq!(pm.pixel(26, 16), Rgba::black());
        assert_eq!(pm.pixel(16, 16), Rgba::white());
    }

    #[test]
    fn test_highlight_draws_selection_border() {
        use redline_core::shapes::{BorderStyle, Rgba as CoreRgba, ShapeStyle};

        let mut engine = SketchEngine::new();
        engine.set_shape_defaults(ShapeStyle {
            border_color: CoreRgba::new(0, 0, 255, 255),
            border_style: BorderStyle::Solid,
            border_width: 2.0,
            ..ShapeStyle::default()
        });
        let id = engine
            .add_shape(ShapeParams::Circle {
                center: Point::new(16.0, 16.0),
                radius: 6.0,
            })
            .unwrap();

        let plain = render_document(engine.document(), &options(32, 32)).unwrap();
        let highlighted = render_document(
            engine.document(),
            &RenderOptions {
                highlight: Some(id),
                ..options(32, 32)
            },
        )
        .unwrap();
        assert_ne!(plain, highlighted);
        // Border ring sits 4px outside the shape bounds.
        assert_eq!(highlighted.pixel(6, 16), CoreRgba::new(0, 0, 255, 255));
    }

    #[test]
    fn test_flatten_closes_subpaths() {
        let path = kurbo::Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1);
        let polylines = flatten_path(path.elements());
        assert_eq!(polylines.len(), 1);
        let line = &polylines[0];
        assert_eq!(line.first(), line.last());
    }
}
