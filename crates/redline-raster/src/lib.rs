//! Redline Raster Library
//!
//! Deterministic CPU rasterizer and export pipeline for redline documents.
//! Rendering is pure: the same document snapshot and options always yield
//! byte-identical pixels, which the sync and save flows rely on.

pub mod export;
pub mod font;
pub mod pixmap;
pub mod render;

pub use export::{export_artifact, export_named, ExportArtifact, ExportError, ExportFormat, ExportJob};
pub use pixmap::Pixmap;
pub use render::{render_document, RenderOptions};
