//! Undo/redo as an explicit inverse-operation log.
//!
//! Every mutating command records the operation that reverses it. Undo pops
//! an inverse and applies it; applying yields the counter-inverse, which
//! goes onto the redo stack. Replaying a whole stack in LIFO order returns
//! the document to its initial state.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::document::{Document, Entity, EntityId};
use crate::error::{EngineError, EngineResult};
use crate::shapes::ShapeTransform;

/// A recorded action that reverses one prior mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inverse {
    /// Undoes an insertion.
    Remove { id: EntityId },
    /// Undoes a deletion, restoring the entity at its z-position.
    Insert { index: usize, entity: Entity },
    /// Undoes a shape transform by applying the opposite delta.
    Transform { id: EntityId, delta: ShapeTransform },
    /// Undoes `clear`, restoring the full prior entity list.
    Restore { entries: Vec<Entity> },
    /// Undoes the restore of a cleared document.
    Clear,
    /// Undoes a measurement anchor placement.
    PopAnchor { id: EntityId },
    /// Redoes a measurement anchor placement.
    PushAnchor { id: EntityId, point: Point },
    /// Undoes a text edit by restoring prior content and font size.
    SetText {
        id: EntityId,
        content: String,
        font_size: f64,
    },
}

impl Inverse {
    /// Apply this inverse to the document, returning its counter-inverse.
    pub(crate) fn apply(self, doc: &mut Document) -> EngineResult<Inverse> {
        match self {
            Inverse::Remove { id } => {
                let (index, entity) = doc
                    .remove(id)
                    .ok_or(EngineError::NotFound(id.raw()))?;
                Ok(Inverse::Insert { index, entity })
            }
            Inverse::Insert { index, entity } => {
                let id = entity.id();
                doc.insert(index, entity);
                Ok(Inverse::Remove { id })
            }
            Inverse::Transform { id, delta } => {
                let shape = doc
                    .shape_mut(id)
                    .ok_or(EngineError::NotFound(id.raw()))?;
                shape.transform(&delta);
                Ok(Inverse::Transform {
                    id,
                    delta: delta.inverse(),
                })
            }
            Inverse::Restore { entries } => {
                doc.restore_all(entries);
                Ok(Inverse::Clear)
            }
            Inverse::Clear => {
                let entries = doc.take_all();
                Ok(Inverse::Restore { entries })
            }
            Inverse::PopAnchor { id } => {
                let measure = doc
                    .shape_mut(id)
                    .and_then(|s| s.as_measure_mut())
                    .ok_or(EngineError::NotFound(id.raw()))?;
                let point = measure.pop_anchor().ok_or(EngineError::InvalidState(
                    "measurement has no anchors left to remove",
                ))?;
                Ok(Inverse::PushAnchor { id, point })
            }
            Inverse::PushAnchor { id, point } => {
                let measure = doc
                    .shape_mut(id)
                    .and_then(|s| s.as_measure_mut())
                    .ok_or(EngineError::NotFound(id.raw()))?;
                measure.push_anchor(point);
                Ok(Inverse::PopAnchor { id })
            }
            Inverse::SetText {
                id,
                content,
                font_size,
            } => {
                let text = doc
                    .shape_mut(id)
                    .and_then(|s| s.as_text_mut())
                    .ok_or(EngineError::NotFound(id.raw()))?;
                let prior = Inverse::SetText {
                    id,
                    content: std::mem::replace(&mut text.content, content),
                    font_size: std::mem::replace(&mut text.font_size, font_size),
                };
                Ok(prior)
            }
        }
    }
}

/// Bounded undo stack with a parallel redo stack.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Inverse>,
    redo_stack: Vec<Inverse>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Record the inverse of a fresh mutation. Any redo branch is
    /// discarded (standard branch-and-discard policy).
    pub fn record(&mut self, inverse: Inverse) {
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    pub fn undo(&mut self, doc: &mut Document) -> EngineResult<()> {
        let inverse = self.undo_stack.pop().ok_or(EngineError::NothingToUndo)?;
        let counter = inverse.apply(doc)?;
        self.redo_stack.push(counter);
        Ok(())
    }

    pub fn redo(&mut self, doc: &mut Document) -> EngineResult<()> {
        let inverse = self.redo_stack.pop().ok_or(EngineError::NothingToRedo)?;
        let counter = inverse.apply(doc)?;
        self.undo_stack.push(counter);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Shape, ShapeStyle};

    fn doc_with_circle() -> (Document, EntityId) {
        let mut doc = Document::new();
        let id = doc.allocate_id();
        doc.push(Entity::Shape(Shape::Circle(Circle::new(
            id,
            Point::new(5.0, 5.0),
            3.0,
            ShapeStyle::default(),
        ))));
        (doc, id)
    }

    #[test]
    fn test_undo_then_redo_insert() {
        let (mut doc, id) = doc_with_circle();
        let mut history = History::new(10);
        history.record(Inverse::Remove { id });

        history.undo(&mut doc).unwrap();
        assert!(doc.is_empty());
        assert!(history.can_redo());

        history.redo(&mut doc).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.entity(id).is_some());
    }

    #[test]
    fn test_record_discards_redo_branch() {
        let (mut doc, id) = doc_with_circle();
        let mut history = History::new(10);
        history.record(Inverse::Remove { id });
        history.undo(&mut doc).unwrap();

        history.record(Inverse::Clear);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_report_typed_errors() {
        let mut doc = Document::new();
        let mut history = History::new(10);
        assert_eq!(history.undo(&mut doc), Err(EngineError::NothingToUndo));
        assert_eq!(history.redo(&mut doc), Err(EngineError::NothingToRedo));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let (mut doc, id) = doc_with_circle();
        let mut history = History::new(2);
        history.record(Inverse::Remove { id });
        history.record(Inverse::Clear);
        history.record(Inverse::Clear);

        // The oldest entry (Remove) was discarded; both remaining are Clear.
        history.undo(&mut doc).unwrap();
        assert!(doc.is_empty());
        history.undo(&mut doc).unwrap();
        assert_eq!(history.undo(&mut doc), Err(EngineError::NothingToUndo));
    }
}
