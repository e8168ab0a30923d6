//! Pitch-name extraction without timing
//!
//! Tries, in order, `Chord` → `Note` → `pitch`, any `Note` → `pitch`, and the
//! namespaced variant, keeping the first non-empty result.

use crate::converters::mscx::document::ScoreDocument;
use crate::converters::mscx::scan::{chord_note_pitches, namespaced_note_pitches, note_pitches};
use crate::converters::mscx::Result;
use crate::models::pitch_name;
use roxmltree::Node;

const SCANS: &[(&str, fn(Node) -> Result<Vec<i32>>)] = &[
    ("Chord/Note/pitch", chord_note_pitches),
    ("Note/pitch", note_pitches),
    ("namespaced Note/pitch", namespaced_note_pitches),
];

/// Pitch names in document order, empty when the score has none
pub fn extract_pitches(doc: &ScoreDocument) -> Result<Vec<String>> {
    for (path, scan) in SCANS {
        let pitches = scan(doc.root())?;
        if !pitches.is_empty() {
            log::info!("Extracted {} pitches ({})", pitches.len(), path);
            return Ok(pitches.into_iter().map(pitch_name).collect());
        }
    }
    log::info!("No pitches found");
    Ok(Vec::new())
}
