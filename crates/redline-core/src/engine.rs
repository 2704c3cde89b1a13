//! The sketch engine: command surface over one canvas document.
//!
//! All UI actions arrive here as serialized commands. The engine owns the
//! document, the stroke-capture state machine, the selection, and the
//! undo/redo stacks; it never touches rendering or input devices.

use std::sync::mpsc::Receiver;

use kurbo::Point;

use crate::config::{EngineConfig, MergePolicy};
use crate::document::{BackgroundImage, ContentMode, Document, Entity, EntityId, TextOverlay};
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, Notifier};
use crate::history::{History, Inverse};
use crate::schema::{self, EntityRecord};
use crate::shapes::{
    Arrow, Circle, Measure, Rectangle, Rgba, Ruler, Shape, ShapeParams, ShapeStyle,
    ShapeTransform, Text, Triangle,
};
use crate::stroke::Stroke;

/// Stroke-capture state.
#[derive(Debug)]
enum EngineState {
    Idle,
    /// A stroke is being captured; it joins the document on `end_stroke`.
    Drawing(Stroke),
}

/// One canvas instance's engine.
#[derive(Debug)]
pub struct SketchEngine {
    document: Document,
    config: EngineConfig,
    state: EngineState,
    selection: Option<EntityId>,
    shape_defaults: ShapeStyle,
    history: History,
    notifier: Notifier,
}

impl Default for SketchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SketchEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let history = History::new(config.history_limit);
        Self {
            document: Document::new(),
            config,
            state: EngineState::Idle,
            selection: None,
            shape_defaults: ShapeStyle::default(),
            history,
            notifier: Notifier::default(),
        }
    }

    /// Read-only view of the document for re-rendering.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Ordered entity snapshot (z-order, back to front).
    pub fn snapshot(&self) -> &[Entity] {
        self.document.entries()
    }

    /// Currently selected shape, if any.
    pub fn selection(&self) -> Option<EntityId> {
        self.selection
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, EngineState::Drawing(_))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Register a listener for change notifications.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.notifier.subscribe()
    }

    /// Style applied to shapes added after this call.
    pub fn set_shape_defaults(&mut self, style: ShapeStyle) {
        self.shape_defaults = style;
    }

    // ----- stroke lifecycle -----

    /// Start capturing a freehand stroke.
    pub fn begin_stroke(&mut self, point: Point, color: Rgba, width: f64) -> EngineResult<EntityId> {
        if self.is_drawing() {
            return Err(EngineError::InvalidState("a stroke is already in progress"));
        }
        if !(width > 0.0) || !width.is_finite() {
            return Err(EngineError::InvalidArgument(format!(
                "stroke width must be positive, got {width}"
            )));
        }
        require_finite(point)?;
        let id = self.document.allocate_id();
        let seq = self.document.bump_revision();
        log::debug!("begin stroke {id} at ({}, {})", point.x, point.y);
        self.state = EngineState::Drawing(Stroke::new(id, seq, point, color, width));
        self.emit_drawing_state();
        Ok(id)
    }

    /// Append a sample to the in-progress stroke.
    pub fn extend_stroke(&mut self, id: EntityId, point: Point) -> EngineResult<()> {
        require_finite(point)?;
        let epsilon = self.config.coalesce_epsilon;
        match &mut self.state {
            EngineState::Drawing(stroke) if stroke.id() == id => {
                stroke.append(point, epsilon);
                Ok(())
            }
            _ => Err(EngineError::NotFound(id.raw())),
        }
    }

    /// Finalize the in-progress stroke and append it to the document.
    pub fn end_stroke(&mut self, id: EntityId) -> EngineResult<&Stroke> {
        let stroke = match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::Drawing(stroke) if stroke.id() == id => stroke,
            other => {
                self.state = other;
                return Err(EngineError::NotFound(id.raw()));
            }
        };
        log::debug!("end stroke {id} with {} points", stroke.points.len());
        self.document.push(Entity::Stroke(stroke));
        self.history.record(Inverse::Remove { id });
        self.document.bump_revision();
        self.emit_paths();
        self.emit_drawing_state();
        match self.document.entries().last() {
            Some(Entity::Stroke(stroke)) => Ok(stroke),
            _ => Err(EngineError::NotFound(id.raw())),
        }
    }

    // ----- shapes -----

    /// Insert a new shape and select it.
    pub fn add_shape(&mut self, params: ShapeParams) -> EngineResult<EntityId> {
        self.ensure_idle()?;
        validate_params(&params)?;
        let id = self.document.allocate_id();
        let style = self.shape_defaults.clone();
        let shape = match params {
            ShapeParams::Circle { center, radius } => {
                Shape::Circle(Circle::new(id, center, radius, style))
            }
            ShapeParams::Rect {
                center,
                width,
                height,
            } => Shape::Rect(Rectangle::new(id, center, width, height, style)),
            ShapeParams::Square { center, size } => {
                Shape::Rect(Rectangle::new(id, center, size, size, style))
            }
            ShapeParams::Triangle { center, size } => {
                Shape::Triangle(Triangle::new(id, center, size, style))
            }
            ShapeParams::Arrow { start, end } => Shape::Arrow(Arrow::new(id, start, end, style)),
            ShapeParams::Ruler { start, end } => Shape::Ruler(Ruler::new(id, start, end, style)),
            ShapeParams::Text {
                position,
                content,
                font_size,
            } => Shape::Text(Text::new(id, position, content, font_size, style)),
            ShapeParams::Measure { first } => Shape::Measure(Measure::new(id, first, style)),
        };
        log::debug!("add {} shape {id}", shape.kind().label());
        self.document.push(Entity::Shape(shape));
        self.history.record(Inverse::Remove { id });
        self.document.bump_revision();
        self.set_selection(Some(id));
        self.emit_paths();
        self.emit_drawing_state();
        Ok(id)
    }

    /// Select a shape by id, implicitly deselecting any previous one.
    pub fn select_shape(&mut self, id: EntityId) -> EngineResult<()> {
        self.ensure_idle()?;
        if self.document.shape(id).is_none() {
            return Err(EngineError::NotFound(id.raw()));
        }
        self.set_selection(Some(id));
        self.emit_drawing_state();
        Ok(())
    }

    /// Select the topmost shape under `point`, deselecting on a miss.
    pub fn select_shape_at(&mut self, point: Point, tolerance: f64) -> EngineResult<Option<EntityId>> {
        self.ensure_idle()?;
        let hit = self.document.shape_at_point(point, tolerance);
        self.set_selection(hit);
        self.emit_drawing_state();
        Ok(hit)
    }

    pub fn deselect_shape(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.set_selection(None);
        self.emit_drawing_state();
        Ok(())
    }

    /// Apply a translate/scale/rotate delta to the selected shape.
    pub fn transform_selected_shape(&mut self, delta: ShapeTransform) -> EngineResult<()> {
        self.ensure_idle()?;
        let id = self
            .selection
            .ok_or(EngineError::InvalidState("no shape selected"))?;
        if !(delta.scale > 0.0)
            || !delta.scale.is_finite()
            || !delta.rotate.is_finite()
            || !delta.translate.x.is_finite()
            || !delta.translate.y.is_finite()
        {
            return Err(EngineError::InvalidArgument(
                "transform delta must be finite with positive scale".into(),
            ));
        }
        let shape = self
            .document
            .shape_mut(id)
            .ok_or(EngineError::NotFound(id.raw()))?;
        shape.transform(&delta);
        self.history.record(Inverse::Transform {
            id,
            delta: delta.inverse(),
        });
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    /// Delete the selected shape.
    pub fn delete_selected_shape(&mut self) -> EngineResult<EntityId> {
        self.ensure_idle()?;
        let id = self
            .selection
            .ok_or(EngineError::InvalidState("no shape selected"))?;
        let (index, entity) = self
            .document
            .remove(id)
            .ok_or(EngineError::NotFound(id.raw()))?;
        log::debug!("delete shape {id}");
        self.history.record(Inverse::Insert { index, entity });
        self.document.bump_revision();
        self.set_selection(None);
        self.emit_paths();
        self.emit_drawing_state();
        Ok(id)
    }

    /// Delete a finalized stroke by id (the sync scenario's undo forward).
    pub fn delete_path(&mut self, id: EntityId) -> EngineResult<()> {
        self.ensure_idle()?;
        match self.document.entity(id) {
            Some(entity) if entity.is_stroke() => {}
            _ => return Err(EngineError::NotFound(id.raw())),
        }
        let (index, entity) = self
            .document
            .remove(id)
            .ok_or(EngineError::NotFound(id.raw()))?;
        self.history.record(Inverse::Insert { index, entity });
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    /// Place the next anchor of the selected measurement tool.
    ///
    /// Returns true when the anchor was placed, false when the tool is
    /// already complete.
    pub fn extend_measurement(&mut self, point: Point) -> EngineResult<bool> {
        self.ensure_idle()?;
        require_finite(point)?;
        let id = self
            .selection
            .ok_or(EngineError::InvalidState("no measurement tool selected"))?;
        let measure = self
            .document
            .shape_mut(id)
            .and_then(Shape::as_measure_mut)
            .ok_or(EngineError::InvalidState("selection is not a measurement tool"))?;
        if !measure.push_anchor(point) {
            return Ok(false);
        }
        self.history.record(Inverse::PopAnchor { id });
        self.document.bump_revision();
        self.emit_paths();
        self.emit_drawing_state();
        Ok(true)
    }

    // ----- text editing -----

    /// Replace the selected text shape's content.
    pub fn set_selected_text(&mut self, content: impl Into<String>) -> EngineResult<()> {
        let content = content.into();
        if content.is_empty() {
            return Err(EngineError::InvalidArgument(
                "text content must not be empty".into(),
            ));
        }
        self.edit_selected_text(|text| text.content = content)
    }

    /// Grow (or shrink, for negative steps) the selected text's font size.
    pub fn grow_selected_font(&mut self, steps: i32) -> EngineResult<()> {
        self.edit_selected_text(|text| {
            text.font_size =
                (text.font_size + steps as f64 * Text::FONT_SIZE_STEP).max(Text::MIN_FONT_SIZE);
        })
    }

    fn edit_selected_text(&mut self, edit: impl FnOnce(&mut Text)) -> EngineResult<()> {
        self.ensure_idle()?;
        let id = self
            .selection
            .ok_or(EngineError::InvalidState("no shape selected"))?;
        let text = self
            .document
            .shape_mut(id)
            .and_then(Shape::as_text_mut)
            .ok_or(EngineError::InvalidState("selection is not a text shape"))?;
        let prior = Inverse::SetText {
            id,
            content: text.content.clone(),
            font_size: text.font_size,
        };
        edit(text);
        self.history.record(prior);
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    // ----- history -----

    pub fn undo(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.history.undo(&mut self.document)?;
        self.document.bump_revision();
        self.prune_selection();
        self.emit_paths();
        self.emit_drawing_state();
        Ok(())
    }

    pub fn redo(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.history.redo(&mut self.document)?;
        self.document.bump_revision();
        self.prune_selection();
        self.emit_paths();
        self.emit_drawing_state();
        Ok(())
    }

    /// Remove all entities; a single undo restores everything.
    pub fn clear(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        if self.document.is_empty() {
            return Ok(());
        }
        let entries = self.document.take_all();
        log::debug!("clear {} entities", entries.len());
        self.history.record(Inverse::Restore { entries });
        self.document.bump_revision();
        self.set_selection(None);
        self.emit_paths();
        self.emit_drawing_state();
        Ok(())
    }

    // ----- background and overlays -----

    /// Attach an encoded background image. Not undoable.
    pub fn set_background_image(&mut self, data: Vec<u8>, mode: ContentMode) -> EngineResult<()> {
        self.ensure_idle()?;
        if data.is_empty() {
            return Err(EngineError::InvalidArgument(
                "background image data must not be empty".into(),
            ));
        }
        self.document.background = Some(BackgroundImage {
            data,
            content_mode: mode,
        });
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    pub fn clear_background_image(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.document.background = None;
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    /// Replace the overlay text list.
    pub fn set_overlay_text(&mut self, overlays: Vec<TextOverlay>) -> EngineResult<()> {
        self.ensure_idle()?;
        self.document.overlays = overlays;
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    // ----- serialization / sync -----

    /// The full ordered entity list in the stable interchange schema.
    pub fn serialize_paths(&self) -> Vec<EntityRecord> {
        schema::to_records(&self.document)
    }

    /// Replay a single finished stroke record from a peer engine.
    pub fn append_finished_stroke(&mut self, record: &EntityRecord) -> EngineResult<EntityId> {
        self.ensure_idle()?;
        let entity = schema::to_entity(record)?;
        if !entity.is_stroke() {
            return Err(EngineError::InvalidArgument(format!(
                "record {} is not a stroke",
                record.id
            )));
        }
        let id = self.merge_entity(entity);
        self.document.bump_revision();
        self.emit_paths();
        Ok(id)
    }

    /// Replay a full record list from a peer engine, preserving order and
    /// ids. Conflicts follow the configured merge policy. Replayed entries
    /// are not added to the local undo history.
    pub fn apply_records(&mut self, records: &[EntityRecord]) -> EngineResult<()> {
        self.ensure_idle()?;
        // Convert everything first so a malformed record rejects the whole
        // batch without touching the document.
        let entities = records
            .iter()
            .map(schema::to_entity)
            .collect::<EngineResult<Vec<_>>>()?;
        for entity in entities {
            self.merge_entity(entity);
        }
        self.document.bump_revision();
        self.emit_paths();
        Ok(())
    }

    fn merge_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.document.reserve_id(id);
        match self.document.index_of(id) {
            Some(index) => match self.config.merge_policy {
                MergePolicy::LastWriteWins => {
                    self.document.remove(id);
                    self.document.insert(index, entity);
                }
                MergePolicy::KeepExisting => {
                    log::debug!("replay kept existing entity {id}");
                }
            },
            None => self.document.push(entity),
        }
        id
    }

    // ----- internals -----

    fn ensure_idle(&self) -> EngineResult<()> {
        if self.is_drawing() {
            Err(EngineError::InvalidState("a stroke is in progress"))
        } else {
            Ok(())
        }
    }

    fn set_selection(&mut self, next: Option<EntityId>) {
        if self.selection != next {
            self.selection = next;
            self.notifier
                .emit(EngineEvent::SelectionChanged { selected: next });
        }
    }

    /// Drop the selection if its entity no longer exists (e.g. undone).
    fn prune_selection(&mut self) {
        if let Some(id) = self.selection {
            if self.document.shape(id).is_none() {
                self.set_selection(None);
            }
        }
    }

    fn emit_paths(&mut self) {
        let count = self.document.stroke_count();
        self.notifier.emit(EngineEvent::PathsChanged { count });
    }

    fn emit_drawing_state(&mut self) {
        let selected = self.selection.and_then(|id| self.document.shape(id));
        let shape = if self.is_drawing() {
            Some("stroke")
        } else {
            selected.map(|s| s.kind().label())
        };
        let drawing_step = selected
            .and_then(Shape::as_measure)
            .filter(|m| !m.is_complete())
            .map(Measure::drawing_step);
        let event = EngineEvent::DrawingStateChanged {
            can_undo: self.history.can_undo(),
            can_delete: selected.is_some() && drawing_step.is_none(),
            shape,
            drawing_step,
        };
        self.notifier.emit(event);
    }
}

fn require_finite(point: Point) -> EngineResult<()> {
    if point.x.is_finite() && point.y.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "point ({}, {}) is not finite",
            point.x, point.y
        )))
    }
}

fn validate_params(params: &ShapeParams) -> EngineResult<()> {
    let invalid = |what: &str| Err(EngineError::InvalidArgument(what.into()));
    match params {
        ShapeParams::Circle { center, radius } => {
            require_finite(*center)?;
            if !(*radius > 0.0) || !radius.is_finite() {
                return invalid("circle radius must be positive");
            }
        }
        ShapeParams::Rect {
            center,
            width,
            height,
        } => {
            require_finite(*center)?;
            if !(*width > 0.0) || !(*height > 0.0) || !width.is_finite() || !height.is_finite() {
                return invalid("rectangle sides must be positive");
            }
        }
        ShapeParams::Square { center, size } | ShapeParams::Triangle { center, size } => {
            require_finite(*center)?;
            if !(*size > 0.0) || !size.is_finite() {
                return invalid("size must be positive");
            }
        }
        ShapeParams::Arrow { start, end } | ShapeParams::Ruler { start, end } => {
            require_finite(*start)?;
            require_finite(*end)?;
            if (*end - *start).hypot() < f64::EPSILON {
                return invalid("endpoints must be distinct");
            }
        }
        ShapeParams::Text {
            position,
            content,
            font_size,
        } => {
            require_finite(*position)?;
            if content.is_empty() {
                return invalid("text content must not be empty");
            }
            if !(*font_size > 0.0) || !font_size.is_finite() {
                return invalid("font size must be positive");
            }
        }
        ShapeParams::Measure { first } => require_finite(*first)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Rgba {
        Rgba::new(255, 0, 0, 255)
    }

    fn circle_params() -> ShapeParams {
        ShapeParams::Circle {
            center: Point::new(5.0, 5.0),
            radius: 3.0,
        }
    }

    #[test]
    fn test_stroke_capture_scenario() {
        let mut engine = SketchEngine::new();
        let id = engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        engine.extend_stroke(id, Point::new(10.0, 10.0)).unwrap();
        let stroke = engine.end_stroke(id).unwrap();
        assert_eq!(stroke.points.len(), 2);
        assert_eq!(stroke.color, red());
        assert!((stroke.width - 5.0).abs() < f64::EPSILON);
        assert_eq!(engine.document().len(), 1);

        engine.undo().unwrap();
        assert!(engine.document().is_empty());
    }

    #[test]
    fn test_begin_while_drawing_fails() {
        let mut engine = SketchEngine::new();
        engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        assert!(matches!(
            engine.begin_stroke(Point::new(1.0, 1.0), red(), 5.0),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_extend_unknown_id_fails_without_mutation() {
        let mut engine = SketchEngine::new();
        let id = engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        let bogus = EntityId::new(id.raw() + 100);
        assert_eq!(
            engine.extend_stroke(bogus, Point::new(5.0, 5.0)),
            Err(EngineError::NotFound(bogus.raw()))
        );
        let stroke = engine.end_stroke(id).unwrap();
        assert_eq!(stroke.points.len(), 1);
    }

    #[test]
    fn test_no_shape_commands_while_drawing() {
        let mut engine = SketchEngine::new();
        engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        assert!(matches!(
            engine.add_shape(circle_params()),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(engine.undo(), Err(EngineError::InvalidState(_))));
        assert!(matches!(engine.clear(), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn test_coalescing_bounds_point_growth() {
        let config = EngineConfig {
            coalesce_epsilon: 1.0,
            ..EngineConfig::default()
        };
        let mut engine = SketchEngine::with_config(config);
        let id = engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        for i in 0..100 {
            engine
                .extend_stroke(id, Point::new(i as f64 * 0.01, 0.0))
                .unwrap();
        }
        engine.extend_stroke(id, Point::new(10.0, 0.0)).unwrap();
        let stroke = engine.end_stroke(id).unwrap();
        assert_eq!(stroke.points.len(), 2);
    }

    #[test]
    fn test_transform_undo_scenario() {
        let mut engine = SketchEngine::new();
        let id = engine.add_shape(circle_params()).unwrap();
        engine
            .transform_selected_shape(ShapeTransform::translation(2.0, 0.0))
            .unwrap();
        let moved = match engine.document().shape(id).unwrap() {
            Shape::Circle(c) => c.center,
            _ => unreachable!(),
        };
        assert_eq!(moved, Point::new(7.0, 5.0));

        // First undo reverts only the transform.
        engine.undo().unwrap();
        let back = match engine.document().shape(id).unwrap() {
            Shape::Circle(c) => c.center,
            _ => unreachable!(),
        };
        assert_eq!(back, Point::new(5.0, 5.0));

        // Second undo removes the circle entirely.
        engine.undo().unwrap();
        assert!(engine.document().is_empty());
    }

    #[test]
    fn test_single_selection_invariant() {
        let mut engine = SketchEngine::new();
        let a = engine.add_shape(circle_params()).unwrap();
        let b = engine
            .add_shape(ShapeParams::Rect {
                center: Point::new(20.0, 20.0),
                width: 10.0,
                height: 6.0,
            })
            .unwrap();
        // add_shape auto-selects the newest shape.
        assert_eq!(engine.selection(), Some(b));
        engine.select_shape(a).unwrap();
        assert_eq!(engine.selection(), Some(a));
        engine.select_shape(b).unwrap();
        assert_eq!(engine.selection(), Some(b));
        engine.deselect_shape().unwrap();
        assert_eq!(engine.selection(), None);
    }

    #[test]
    fn test_select_unknown_id_fails() {
        let mut engine = SketchEngine::new();
        assert_eq!(
            engine.select_shape(EntityId::new(99)),
            Err(EngineError::NotFound(99))
        );
    }

    #[test]
    fn test_undo_until_empty_restores_initial_state() {
        let mut engine = SketchEngine::new();
        engine.add_shape(circle_params()).unwrap();
        engine
            .add_shape(ShapeParams::Triangle {
                center: Point::new(30.0, 30.0),
                size: 12.0,
            })
            .unwrap();
        engine.delete_selected_shape().unwrap();
        engine.clear().unwrap();

        while engine.can_undo() {
            engine.undo().unwrap();
        }
        assert!(engine.document().is_empty());
        assert_eq!(engine.undo(), Err(EngineError::NothingToUndo));
    }

    #[test]
    fn test_clear_restores_in_one_undo() {
        let mut engine = SketchEngine::new();
        engine.add_shape(circle_params()).unwrap();
        let id = engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 2.0)
            .unwrap();
        engine.end_stroke(id).unwrap();
        assert_eq!(engine.document().len(), 2);

        engine.clear().unwrap();
        assert!(engine.document().is_empty());

        engine.undo().unwrap();
        assert_eq!(engine.document().len(), 2);
    }

    #[test]
    fn test_new_mutation_discards_redo() {
        let mut engine = SketchEngine::new();
        engine.add_shape(circle_params()).unwrap();
        engine.undo().unwrap();
        assert!(engine.can_redo());
        engine.add_shape(circle_params()).unwrap();
        assert!(!engine.can_redo());
        assert_eq!(engine.redo(), Err(EngineError::NothingToRedo));
    }

    #[test]
    fn test_delete_path_rejects_shape_ids() {
        let mut engine = SketchEngine::new();
        let id = engine.add_shape(circle_params()).unwrap();
        assert_eq!(engine.delete_path(id), Err(EngineError::NotFound(id.raw())));
    }

    #[test]
    fn test_serialize_then_replay_yields_equal_document() {
        let mut source = SketchEngine::new();
        let id = source
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        source.extend_stroke(id, Point::new(10.0, 10.0)).unwrap();
        source.end_stroke(id).unwrap();
        source.add_shape(circle_params()).unwrap();
        source
            .add_shape(ShapeParams::Text {
                position: Point::new(1.0, 2.0),
                content: "note".into(),
                font_size: 20.0,
            })
            .unwrap();

        let records = source.serialize_paths();
        let mut replica = SketchEngine::new();
        replica.apply_records(&records).unwrap();

        assert_eq!(replica.snapshot(), source.snapshot());
    }

    #[test]
    fn test_replayed_ids_are_reserved() {
        let mut source = SketchEngine::new();
        source.add_shape(circle_params()).unwrap();
        let records = source.serialize_paths();

        let mut replica = SketchEngine::new();
        replica.apply_records(&records).unwrap();
        let fresh = replica.add_shape(circle_params()).unwrap();
        assert!(fresh.raw() > records[0].id);
    }

    #[test]
    fn test_merge_policy_keep_existing() {
        let mut source = SketchEngine::new();
        let id = source.add_shape(circle_params()).unwrap();
        let records = source.serialize_paths();

        let mut replica = SketchEngine::with_config(EngineConfig {
            merge_policy: MergePolicy::KeepExisting,
            ..EngineConfig::default()
        });
        replica.apply_records(&records).unwrap();
        // Locally grow the circle, then replay the original records again.
        replica.select_shape(id).unwrap();
        replica
            .transform_selected_shape(ShapeTransform::scaling(2.0))
            .unwrap();
        replica.apply_records(&records).unwrap();

        match replica.document().shape(id).unwrap() {
            Shape::Circle(c) => assert!((c.radius - 6.0).abs() < 1e-9),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_merge_policy_last_write_wins() {
        let mut source = SketchEngine::new();
        let id = source.add_shape(circle_params()).unwrap();
        let records = source.serialize_paths();

        let mut replica = SketchEngine::new();
        replica.apply_records(&records).unwrap();
        replica.select_shape(id).unwrap();
        replica
            .transform_selected_shape(ShapeTransform::scaling(2.0))
            .unwrap();
        replica.apply_records(&records).unwrap();

        match replica.document().shape(id).unwrap() {
            Shape::Circle(c) => assert!((c.radius - 3.0).abs() < 1e-9),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_append_finished_stroke_replays_one_path() {
        let mut source = SketchEngine::new();
        let id = source
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        source.extend_stroke(id, Point::new(4.0, 4.0)).unwrap();
        source.end_stroke(id).unwrap();
        let records = source.serialize_paths();

        let mut replica = SketchEngine::new();
        let replayed = replica.append_finished_stroke(&records[0]).unwrap();
        assert_eq!(replayed, id);
        assert_eq!(replica.snapshot(), source.snapshot());
    }

    #[test]
    fn test_append_finished_stroke_rejects_shapes() {
        let mut source = SketchEngine::new();
        source.add_shape(circle_params()).unwrap();
        let records = source.serialize_paths();

        let mut replica = SketchEngine::new();
        assert!(matches!(
            replica.append_finished_stroke(&records[0]),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_apply_records_rejects_whole_batch_on_bad_record() {
        let mut source = SketchEngine::new();
        source.add_shape(circle_params()).unwrap();
        let mut records = source.serialize_paths();
        records.push(EntityRecord {
            id: 99,
            kind: "hologram".into(),
            points: None,
            color: red(),
            width: 1.0,
            seq: None,
            geometry: None,
            style: None,
        });

        let mut replica = SketchEngine::new();
        assert!(matches!(
            replica.apply_records(&records),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(replica.document().is_empty());
    }

    #[test]
    fn test_measurement_stepwise_undo() {
        let mut engine = SketchEngine::new();
        let id = engine
            .add_shape(ShapeParams::Measure {
                first: Point::new(0.0, 0.0),
            })
            .unwrap();
        assert!(engine.extend_measurement(Point::new(10.0, 0.0)).unwrap());
        assert!(engine.extend_measurement(Point::new(10.0, 10.0)).unwrap());
        // Tool is full now.
        assert!(!engine.extend_measurement(Point::new(20.0, 20.0)).unwrap());

        let anchors = |engine: &SketchEngine| {
            engine
                .document()
                .shape(id)
                .and_then(Shape::as_measure)
                .map(|m| m.anchors.len())
        };
        assert_eq!(anchors(&engine), Some(3));

        // Undo peels anchors off one at a time before removing the tool.
        engine.undo().unwrap();
        assert_eq!(anchors(&engine), Some(2));
        engine.undo().unwrap();
        assert_eq!(anchors(&engine), Some(1));
        engine.undo().unwrap();
        assert!(engine.document().is_empty());
    }

    #[test]
    fn test_text_edit_undo_restores_content() {
        let mut engine = SketchEngine::new();
        engine
            .add_shape(ShapeParams::Text {
                position: Point::new(0.0, 0.0),
                content: "draft".into(),
                font_size: 20.0,
            })
            .unwrap();
        engine.set_selected_text("final").unwrap();
        engine.grow_selected_font(2).unwrap();

        let text_of = |engine: &SketchEngine| {
            engine.snapshot()[0]
                .as_shape()
                .and_then(|s| match s {
                    Shape::Text(t) => Some((t.content.clone(), t.font_size)),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(text_of(&engine), ("final".into(), 24.0));

        engine.undo().unwrap();
        assert_eq!(text_of(&engine), ("final".into(), 20.0));
        engine.undo().unwrap();
        assert_eq!(text_of(&engine), ("draft".into(), 20.0));
    }

    #[test]
    fn test_text_without_content_is_rejected() {
        let mut engine = SketchEngine::new();
        assert!(matches!(
            engine.add_shape(ShapeParams::Text {
                position: Point::new(0.0, 0.0),
                content: String::new(),
                font_size: 20.0,
            }),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_events_report_paths_and_selection() {
        let mut engine = SketchEngine::new();
        let events = engine.subscribe();
        let id = engine
            .begin_stroke(Point::new(0.0, 0.0), red(), 5.0)
            .unwrap();
        engine.end_stroke(id).unwrap();
        let shape_id = engine.add_shape(circle_params()).unwrap();

        let received: Vec<EngineEvent> = events.try_iter().collect();
        assert!(received.contains(&EngineEvent::PathsChanged { count: 1 }));
        assert!(received.contains(&EngineEvent::SelectionChanged {
            selected: Some(shape_id)
        }));
    }

    #[test]
    fn test_shape_defaults_apply_to_new_shapes() {
        let mut engine = SketchEngine::new();
        engine.set_shape_defaults(ShapeStyle {
            stroke_color: Rgba::new(0, 0, 255, 255),
            stroke_width: 9.0,
            border_color: Rgba::new(255, 255, 0, 255),
            border_style: crate::shapes::BorderStyle::Solid,
            border_width: 2.0,
        });
        let id = engine.add_shape(circle_params()).unwrap();
        let style = engine.document().shape(id).unwrap().style();
        assert_eq!(style.stroke_color, Rgba::new(0, 0, 255, 255));
        assert_eq!(style.border_style, crate::shapes::BorderStyle::Solid);
    }

    #[test]
    fn test_select_shape_at_picks_topmost() {
        let mut engine = SketchEngine::new();
        let _bottom = engine.add_shape(circle_params()).unwrap();
        let top = engine.add_shape(circle_params()).unwrap();
        let hit = engine.select_shape_at(Point::new(8.0, 5.0), 1.0).unwrap();
        assert_eq!(hit, Some(top));
        let miss = engine
            .select_shape_at(Point::new(500.0, 500.0), 1.0)
            .unwrap();
        assert_eq!(miss, None);
        assert_eq!(engine.selection(), None);
    }

    #[test]
    fn test_failed_command_leaves_document_unchanged() {
        let mut engine = SketchEngine::new();
        engine.add_shape(circle_params()).unwrap();
        let before = engine.snapshot().to_vec();
        let _ = engine.add_shape(ShapeParams::Circle {
            center: Point::new(0.0, 0.0),
            radius: -1.0,
        });
        let _ = engine.transform_selected_shape(ShapeTransform::scaling(f64::NAN));
        assert_eq!(engine.snapshot(), &before[..]);
    }
}
