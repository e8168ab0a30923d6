//! Score position decoder
//!
//! Turns a parsed score into `(pitch name, measure, beat, tick)` records.
//!
//! Extraction runs an ordered list of strategies and keeps the first one that
//! finds anything:
//! 1. the structured measure walk (see [`timeline`]), which knows positions
//! 2. a scan of every `Chord` → `Note` → `pitch`, positions unknown
//! 3. the same kind of scan in the MuseScore XML namespace, positions unknown
//!
//! The measure range only applies to the structured walk.

pub mod timeline;

pub use timeline::{walk, ChordEvent};

use crate::converters::mscx::document::ScoreDocument;
use crate::converters::mscx::scan::{chord_note_pitches, namespaced_note_pitches};
use crate::converters::mscx::Result;
use crate::models::{pitch_name, ExtractedNote, MeasureRange, Position};

/// Caller choices for one decoding pass
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Inclusive measure window; `None` decodes the whole score
    pub range: Option<MeasureRange>,
}

struct Strategy {
    name: &'static str,
    run: fn(&ScoreDocument<'_>, &DecodeOptions) -> Result<Vec<ExtractedNote>>,
}

const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "structured walk",
        run: structured_walk,
    },
    Strategy {
        name: "chord scan",
        run: chord_scan,
    },
    Strategy {
        name: "namespaced note scan",
        run: namespaced_scan,
    },
];

/// Decode note positions from a parsed score
///
/// # Returns
/// * `Ok(notes)` - ordered by tick, ties in document order; empty when no
///   strategy found a pitched note
/// * `Err(_)` - the score holds a value that is not a valid number
pub fn decode_positions(doc: &ScoreDocument, options: &DecodeOptions) -> Result<Vec<ExtractedNote>> {
    for (index, strategy) in STRATEGIES.iter().enumerate() {
        let notes = (strategy.run)(doc, options)?;
        if !notes.is_empty() {
            log::info!("Extracted {} notes ({})", notes.len(), strategy.name);
            return Ok(notes);
        }

        // An empty window over a score that does have positioned notes is a
        // real answer, not a layout the walk failed to understand
        if index == 0 && options.range.is_some() && !walk(doc, None)?.is_empty() {
            log::info!("No notes in the requested measures");
            return Ok(notes);
        }
        log::debug!("{} found no notes, trying next strategy", strategy.name);
    }

    log::info!("No notes found");
    Ok(Vec::new())
}

fn structured_walk(doc: &ScoreDocument, options: &DecodeOptions) -> Result<Vec<ExtractedNote>> {
    let events = walk(doc, options.range)?;
    let notes = events
        .iter()
        .flat_map(|event| {
            let position = Position {
                measure: event.measure,
                beat: event.beat,
                tick: event.tick,
            };
            event
                .pitches
                .iter()
                .map(move |&pitch| ExtractedNote::positioned(pitch_name(pitch), position))
        })
        .collect();
    Ok(notes)
}

fn chord_scan(doc: &ScoreDocument, _options: &DecodeOptions) -> Result<Vec<ExtractedNote>> {
    unpositioned(chord_note_pitches(doc.root())?)
}

fn namespaced_scan(doc: &ScoreDocument, _options: &DecodeOptions) -> Result<Vec<ExtractedNote>> {
    unpositioned(namespaced_note_pitches(doc.root())?)
}

fn unpositioned(pitches: Vec<i32>) -> Result<Vec<ExtractedNote>> {
    Ok(pitches
        .into_iter()
        .map(|pitch| ExtractedNote::unpositioned(pitch_name(pitch)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_MEASURES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<museScore version="4.20">
  <Score>
    <Division>480</Division>
    <Staff id="1">
      <Measure>
        <voice>
          <Chord><duration>480</duration><Note><pitch>60</pitch></Note></Chord>
        </voice>
      </Measure>
      <Measure>
        <voice>
          <Chord><duration>480</duration><Note><pitch>64</pitch></Note></Chord>
        </voice>
      </Measure>
    </Staff>
  </Score>
</museScore>"#;

    fn simple(notes: &[ExtractedNote]) -> Vec<(String, Option<(u32, f64, u64)>)> {
        notes
            .iter()
            .map(|n| {
                (
                    n.pitch_name.clone(),
                    n.position.map(|p| (p.measure, p.beat, p.tick)),
                )
            })
            .collect()
    }

    #[test]
    fn test_two_measure_score() {
        let doc = ScoreDocument::parse(TWO_MEASURES).unwrap();
        let notes = decode_positions(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(
            simple(&notes),
            vec![
                ("C4".to_string(), Some((1, 1.0, 0))),
                ("E4".to_string(), Some((2, 1.0, 1920))),
            ]
        );
    }

    #[test]
    fn test_chord_notes_keep_document_order() {
        let xml = r#"<museScore><Measure>
            <Chord><Note><pitch>64</pitch></Note><Note><pitch>60</pitch></Note><Note><pitch>67</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let notes = decode_positions(&doc, &DecodeOptions::default()).unwrap();
        let names: Vec<&str> = notes.iter().map(|n| n.pitch_name.as_str()).collect();
        assert_eq!(names, vec!["E4", "C4", "G4"]);
    }

    #[test]
    fn test_chords_outside_measures_fall_back_to_scan() {
        let xml = r#"<museScore><Chord><Note><pitch>62</pitch></Note></Chord></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let notes = decode_positions(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(simple(&notes), vec![("D4".to_string(), None)]);
    }

    #[test]
    fn test_namespaced_score_falls_back_to_namespaced_scan() {
        let xml = r#"<museScore xmlns="http://www.musescore.org/mscx">
            <Measure><Note><pitch>69</pitch></Note></Measure>
        </museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let notes = decode_positions(&doc, &DecodeOptions::default()).unwrap();
        assert_eq!(simple(&notes), vec![("A4".to_string(), None)]);
    }

    #[test]
    fn test_no_notes_is_empty_not_error() {
        let doc = ScoreDocument::parse("<museScore><Measure><Rest/></Measure></museScore>").unwrap();
        let notes = decode_positions(&doc, &DecodeOptions::default()).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_range_past_the_end_is_empty() {
        let doc = ScoreDocument::parse(TWO_MEASURES).unwrap();
        let options = DecodeOptions {
            range: Some(MeasureRange::new(5, 8).unwrap()),
        };
        assert!(decode_positions(&doc, &options).unwrap().is_empty());
    }

    #[test]
    fn test_range_selects_measure() {
        let doc = ScoreDocument::parse(TWO_MEASURES).unwrap();
        let options = DecodeOptions {
            range: Some(MeasureRange::new(2, 2).unwrap()),
        };
        let notes = decode_positions(&doc, &options).unwrap();
        assert_eq!(simple(&notes), vec![("E4".to_string(), Some((2, 1.0, 0)))]);
    }
}
