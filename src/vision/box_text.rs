//! OCR fragments and their persisted text form
//!
//! A box-text file holds one line of 8 space-separated box coordinates
//! followed by one line of raw text, repeated, and ends at the first blank
//! line (or end of file).

use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::geometry::BoundingBox;

/// Errors raised while reading or writing box-text files
#[derive(Error, Debug)]
pub enum BoxTextError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One OCR-detected text region, or a card resolved from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxText {
    /// Region on the source image
    pub bbox: BoundingBox,
    /// Raw OCR text, or the canonical card name once resolved
    pub text: String,
    /// Number of copies this fragment stands for
    pub count: u32,
}

impl BoxText {
    /// Create a fragment with the default count of 1
    pub fn new(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self::with_count(bbox, text, 1)
    }

    pub fn with_count(bbox: BoundingBox, text: impl Into<String>, count: u32) -> Self {
        Self {
            bbox,
            text: text.into(),
            count: count.max(1),
        }
    }
}

/// Ordered sequence of fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxTextList {
    box_texts: Vec<BoxText>,
}

impl BoxTextList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.box_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.box_texts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoxText> {
        self.box_texts.iter()
    }

    pub fn get(&self, index: usize) -> Option<&BoxText> {
        self.box_texts.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BoxText> {
        self.box_texts.get_mut(index)
    }

    pub fn as_slice(&self) -> &[BoxText] {
        &self.box_texts
    }

    /// Append a fragment with a count of 1
    pub fn add(&mut self, bbox: BoundingBox, text: impl Into<String>) {
        self.box_texts.push(BoxText::new(bbox, text));
    }

    pub fn push(&mut self, box_text: BoxText) {
        self.box_texts.push(box_text);
    }

    /// Sort fragments into reading order (stable, by box)
    pub fn sort(&mut self) {
        self.box_texts.sort_by(|a, b| a.bbox.cmp(&b.bbox));
    }

    /// Encode in the persisted box-text format
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for box_text in &self.box_texts {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{}", box_text.bbox);
            let _ = writeln!(out, "{}", box_text.text.replace('\n', " "));
        }
        out
    }

    /// Decode the persisted box-text format.
    ///
    /// Entries whose coordinate line is malformed are logged and skipped;
    /// reading stops at the first blank coordinate line.
    pub fn parse(content: &str) -> Self {
        let mut list = Self::new();
        let mut lines = content.lines().enumerate();

        while let Some((line_no, box_line)) = lines.next() {
            let box_line = box_line.trim_end_matches('\r');
            if box_line.trim().is_empty() {
                break;
            }
            let text = lines
                .next()
                .map(|(_, t)| t.trim_end_matches('\r').to_string())
                .unwrap_or_default();

            match parse_box_line(box_line) {
                Some(bbox) => list.add(bbox, text),
                None => warn!(
                    "Skipping malformed box on line {}: {:?} ({:?})",
                    line_no + 1,
                    box_line,
                    text
                ),
            }
        }

        list
    }

    /// Save to `path` in the persisted box-text format
    pub fn save(&self, path: &Path) -> Result<(), BoxTextError> {
        info!("Saving {} box texts to {:?}", self.len(), path);
        std::fs::write(path, self.to_text()).map_err(|source| BoxTextError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from a file in the persisted box-text format
    pub fn load(path: &Path) -> Result<Self, BoxTextError> {
        info!("Loading box texts from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| BoxTextError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&content))
    }
}

impl FromIterator<BoxText> for BoxTextList {
    fn from_iter<I: IntoIterator<Item = BoxText>>(iter: I) -> Self {
        Self {
            box_texts: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BoxTextList {
    type Item = BoxText;
    type IntoIter = std::vec::IntoIter<BoxText>;

    fn into_iter(self) -> Self::IntoIter {
        self.box_texts.into_iter()
    }
}

impl<'a> IntoIterator for &'a BoxTextList {
    type Item = &'a BoxText;
    type IntoIter = std::slice::Iter<'a, BoxText>;

    fn into_iter(self) -> Self::IntoIter {
        self.box_texts.iter()
    }
}

fn parse_box_line(line: &str) -> Option<BoundingBox> {
    let coords: Vec<i32> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    BoundingBox::try_from(coords.as_slice()).ok()
}
