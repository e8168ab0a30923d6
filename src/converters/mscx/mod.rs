//! MuseScore (`.mscx` / `.mscz`) converters
//!
//! Pipeline: `load` acquires the score text from a plain or compressed
//! container, `document` parses it into a read-only tree, and the
//! `mscx_to_*` modules walk that tree:
//!
//! - `mscx_to_positions`: pitches with `(measure, beat, tick)` positions
//! - `mscx_to_pitches`: pitch names only
//! - `mscx_to_midi`: Standard MIDI File export
//! - `mscx_to_text`: line-oriented reports of the above

pub mod document;
pub mod load;
pub mod mscx_to_midi;
pub mod mscx_to_pitches;
pub mod mscx_to_positions;
pub mod mscx_to_text;
pub mod scan;

pub use document::{ScoreDocument, DEFAULT_DIVISION, MSCX_NAMESPACE};
pub use load::{load_bytes, load_path, LoadError, ScoreSource};
pub use mscx_to_pitches::extract_pitches;
pub use mscx_to_positions::{decode_positions, DecodeOptions};

use crate::models::{ExtractedNote, MeasureRange};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MscxError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("xml parse error: {0}")]
    Xml(String),
    #[error("invalid <{element}> value '{value}'")]
    InvalidValue { element: String, value: String },
}

pub type Result<T> = std::result::Result<T, MscxError>;

/// Load a score file and decode its note positions
///
/// # Arguments
/// * `path` - `.mscx` or `.mscz` file
/// * `range` - Optional inclusive measure window
///
/// # Returns
/// * Notes ordered by tick; empty when the score has no pitched notes
pub fn extract_positions_from_path(
    path: &Path,
    range: Option<MeasureRange>,
) -> Result<Vec<ExtractedNote>> {
    let source = load_path(path)?;
    let doc = ScoreDocument::parse(&source.xml)?;
    decode_positions(&doc, &DecodeOptions { range })
}

/// Load a score file and list its pitch names in document order
pub fn extract_pitches_from_path(path: &Path) -> Result<Vec<String>> {
    let source = load_path(path)?;
    let doc = ScoreDocument::parse(&source.xml)?;
    extract_pitches(&doc)
}
