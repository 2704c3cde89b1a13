//! Export pipeline: rasterize a document snapshot and encode it.
//!
//! Encoding can take a while on large canvases, so `export_artifact` runs
//! on a worker thread and hands the result back over a channel; the caller
//! is never blocked and may simply drop the job to discard the result.

use std::io::Cursor;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ExtendedColorType, ImageEncoder};
use redline_core::{Document, EntityRecord};
use thiserror::Error;

use crate::pixmap::Pixmap;
use crate::render::{render_document, RenderOptions};

/// Export pipeline errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid export options: {0}")]
    InvalidOptions(String),
    #[error("background decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("export worker terminated")]
    Worker,
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg { quality: u8 },
    /// Raw straight-alpha RGBA8 rows, top to bottom.
    Rgba,
}

impl ExportFormat {
    /// Default JPEG quality, matching common canvas save paths.
    pub const JPEG_QUALITY: u8 = 90;

    /// Resolve a caller-supplied format name.
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg {
                quality: Self::JPEG_QUALITY,
            }),
            "rgba" => Ok(ExportFormat::Rgba),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
            ExportFormat::Rgba => "rgba",
        }
    }
}

/// An encoded rendering of one document state, together with the entity
/// records that produced it. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    /// The serialized entity list the image was rendered from.
    pub records: Vec<EntityRecord>,
}

impl ExportArtifact {
    /// Base64 view for bridge-style consumers.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Handle to an in-flight export. Drop it to discard the result.
#[derive(Debug)]
pub struct ExportJob {
    receiver: Receiver<Result<ExportArtifact, ExportError>>,
}

impl ExportJob {
    /// Block until the artifact is ready.
    pub fn wait(self) -> Result<ExportArtifact, ExportError> {
        self.receiver.recv().unwrap_or(Err(ExportError::Worker))
    }

    /// Non-blocking poll; None while the worker is still rendering.
    pub fn poll(&self) -> Option<Result<ExportArtifact, ExportError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExportError::Worker)),
        }
    }
}

/// Render and encode the document on a worker thread.
///
/// The snapshot is taken eagerly, so later engine commands do not affect
/// the artifact. Identical document state and options produce
/// byte-identical artifacts.
pub fn export_artifact(doc: &Document, format: ExportFormat, options: RenderOptions) -> ExportJob {
    let snapshot = doc.clone();
    let (tx, rx) = channel();
    let worker = thread::Builder::new()
        .name("redline-export".into())
        .spawn(move || {
            let result = run_export(&snapshot, format, &options);
            if tx.send(result).is_err() {
                log::debug!("export result discarded by caller");
            }
        });
    if let Err(e) = worker {
        log::warn!("failed to spawn export worker: {e}");
    }
    ExportJob { receiver: rx }
}

/// Like [`export_artifact`], resolving the format from a name first.
pub fn export_named(
    doc: &Document,
    format_name: &str,
    options: RenderOptions,
) -> Result<ExportJob, ExportError> {
    let format = ExportFormat::parse(format_name)?;
    Ok(export_artifact(doc, format, options))
}

fn run_export(
    doc: &Document,
    format: ExportFormat,
    options: &RenderOptions,
) -> Result<ExportArtifact, ExportError> {
    let pixmap = render_document(doc, options)?;
    let (width, height) = (pixmap.width(), pixmap.height());
    log::debug!(
        "exporting {}x{} canvas as {}",
        width,
        height,
        format.extension()
    );
    let bytes = match format {
        ExportFormat::Png => encode_png(&pixmap)?,
        ExportFormat::Jpeg { quality } => encode_jpeg(&pixmap, quality)?,
        ExportFormat::Rgba => pixmap.into_data(),
    };
    Ok(ExportArtifact {
        format,
        width,
        height,
        bytes,
        records: redline_core::schema::to_records(doc),
    })
}

fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    writer
        .write_image_data(pixmap.data())
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> Result<Vec<u8>, ExportError> {
    // JPEG has no alpha channel; composite over white.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u32;
            [px[0], px[1], px[2]].map(|c| ((c as u32 * a + 255 * (255 - a)) / 255) as u8)
        })
        .collect();
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    encoder
        .write_image(&rgb, pixmap.width(), pixmap.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}
