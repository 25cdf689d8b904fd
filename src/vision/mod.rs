//! Vision/OCR Layer
//!
//! Bounding boxes and text fragments produced by an OCR backend. The
//! recognition core only consumes these; it never calls a backend itself.
//! The one backend shipped here replays box texts saved by an earlier run.

pub mod box_text;
pub mod geometry;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub use box_text::{BoxText, BoxTextError, BoxTextList};
pub use geometry::{squared_distance, BoundingBox, Point};

/// Source of (box, text) pairs for an image
pub trait OcrBackend {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Run OCR on the image at `image` (path or URL) and return its fragments
    fn image_to_box_texts(&self, image: &str) -> Result<BoxTextList>;
}

/// Backend that reads previously persisted OCR output instead of calling a service.
///
/// For an image `deck.jpg` it looks for `<dir>/deck.box_texts.txt`, or for
/// the image path itself when it already points at a box-text file.
#[derive(Debug, Clone)]
pub struct SavedBoxTexts {
    dir: Option<PathBuf>,
}

impl SavedBoxTexts {
    /// Resolve box-text files next to the image
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Resolve box-text files inside `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Path of the box-text file that stands in for `image`
    pub fn box_texts_path(&self, image: &str) -> PathBuf {
        let image_path = Path::new(image);
        if image_path.extension().is_some_and(|ext| ext == "txt") {
            return image_path.to_path_buf();
        }

        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let file_name = format!("{}.box_texts.txt", stem);

        match &self.dir {
            Some(dir) => dir.join(file_name),
            None => image_path.with_file_name(file_name),
        }
    }
}

impl Default for SavedBoxTexts {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for SavedBoxTexts {
    fn name(&self) -> &str {
        "saved"
    }

    fn image_to_box_texts(&self, image: &str) -> Result<BoxTextList> {
        let path = self.box_texts_path(image);
        info!("Replaying OCR output for {} from {:?}", image, path);
        let list = BoxTextList::load(&path)
            .with_context(|| format!("No saved OCR output for {}", image))?;
        Ok(list)
    }
}
