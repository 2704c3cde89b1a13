//! Canvas document: the ordered collection of strokes and shapes.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shapes::{Rgba, Shape};
use crate::stroke::Stroke;

/// Unique identifier for document entities.
///
/// Ids are allocated from the document's monotonic counter and are never
/// reused, even after deletion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A drawable document entry: a finalized stroke or a parametric shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Stroke(Stroke),
    Shape(Shape),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Stroke(s) => s.id(),
            Entity::Shape(s) => s.id(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Entity::Stroke(s) => s.bounds(),
            Entity::Shape(s) => s.bounds(),
        }
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self, Entity::Stroke(_))
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Entity::Stroke(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Entity::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_shape_mut(&mut self) -> Option<&mut Shape> {
        match self {
            Entity::Shape(s) => Some(s),
            _ => None,
        }
    }
}

/// Background image fit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentMode {
    /// Stretch to cover the full canvas, ignoring aspect ratio.
    #[default]
    ScaleToFill,
    /// Fit entirely inside the canvas, preserving aspect ratio.
    AspectFit,
    /// Cover the canvas, preserving aspect ratio and cropping overflow.
    AspectFill,
}

/// Opaque encoded background image plus its fit rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    /// Encoded image bytes (PNG or JPEG), decoded by the renderer.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub content_mode: ContentMode,
}

/// Caller-supplied text composited at export time, not an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    pub position: Point,
    pub font_size: f64,
    pub color: Rgba,
    /// Drawn over the sketch when true, under it otherwise.
    #[serde(default)]
    pub over_sketch: bool,
}

/// The ordered collection of all entities belonging to one canvas.
///
/// Z-order equals creation order. Mutation happens only through engine
/// commands; the document itself only offers the primitive edits those
/// commands and their inverses need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identity.
    pub id: String,
    entries: Vec<Entity>,
    next_id: u64,
    /// Bumped on every mutation; also used as stroke sequence numbers.
    revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<TextOverlay>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entries: Vec::new(),
            next_id: 1,
            revision: 0,
            background: None,
            overlays: Vec::new(),
        }
    }

    /// Allocate the next entity id. Ids are never reused.
    pub(crate) fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Make sure future allocations never collide with a replayed id.
    pub(crate) fn reserve_id(&mut self, id: EntityId) {
        self.next_id = self.next_id.max(id.raw() + 1);
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Entities in z-order (back to front).
    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of finalized strokes (the `pathsCount` the UI listens for).
    pub fn stroke_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_stroke()).count()
    }

    pub(crate) fn push(&mut self, entity: Entity) {
        self.entries.push(entity);
    }

    /// Re-insert an entity at its original z-position.
    pub(crate) fn insert(&mut self, index: usize, entity: Entity) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entity);
    }

    /// Remove an entity, returning it with its z-position.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<(usize, Entity)> {
        let index = self.index_of(id)?;
        Some((index, self.entries.remove(index)))
    }

    /// Remove every entity, returning the prior list for undo.
    pub(crate) fn take_all(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn restore_all(&mut self, entries: Vec<Entity>) {
        self.entries = entries;
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn shape(&self, id: EntityId) -> Option<&Shape> {
        self.entity(id).and_then(Entity::as_shape)
    }

    pub(crate) fn shape_mut(&mut self, id: EntityId) -> Option<&mut Shape> {
        self.entity_mut(id).and_then(Entity::as_shape_mut)
    }

    /// Topmost shape hit by `point`, searching front to back.
    pub fn shape_at_point(&self, point: Point, tolerance: f64) -> Option<EntityId> {
        self.entries
            .iter()
            .rev()
            .filter_map(Entity::as_shape)
            .find(|s| s.hit_test(point, tolerance))
            .map(Shape::id)
    }

    /// Bounding box of all entities, or None for an empty document.
    pub fn bounds(&self) -> Option<Rect> {
        self.entries
            .iter()
            .map(Entity::bounds)
            .reduce(|a, b| a.union(b))
    }
}

/// Serde adapter encoding opaque byte buffers as base64 strings.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
