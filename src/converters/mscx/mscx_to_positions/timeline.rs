//! Measure-by-measure tick walk
//!
//! Rebuilds the absolute tick timeline from measure lengths and chord
//! durations. Both the position report and the MIDI export consume the
//! events produced here.

use crate::converters::mscx::document::{
    get_child_text, is_element, parse_number, Measure, ScoreDocument,
};
use crate::converters::mscx::scan::note_pitch;
use crate::converters::mscx::{MscxError, Result};
use crate::models::MeasureRange;

/// One onset in the timeline: a chord, or a lone note in a chordless measure
#[derive(Debug, Clone, PartialEq)]
pub struct ChordEvent {
    pub measure: u32,
    /// `(tick - measure start) / division + 1`
    pub beat: f64,
    /// Tick relative to the walk origin (piece start, or the first
    /// measure of the requested range)
    pub tick: u64,
    pub duration: u64,
    /// MIDI pitches in document order
    pub pitches: Vec<i32>,
}

/// Walk the measures of a score and collect chord onsets
///
/// Events are ordered by tick. Onsets sharing a tick keep document order.
///
/// A chord's explicit `tick` attribute is read as measure-relative when it is
/// smaller than the measure length and as piece-absolute otherwise. Chords
/// without one start where the furthest-reaching earlier chord of the same
/// measure ended.
///
/// Negative ticks, absolute ticks before the start of their measure and
/// tick arithmetic past `u64` are `InvalidValue` errors.
pub fn walk(doc: &ScoreDocument, range: Option<MeasureRange>) -> Result<Vec<ChordEvent>> {
    let division = doc.division() as u64;
    let measures = doc.measures();
    log::debug!("Found {} measures", measures.len());

    // Ticks before the first selected measure; reported ticks are relative to it
    let origin = match range {
        Some(range) => {
            let mut offset = 0u64;
            for measure in measures.iter().filter(|m| m.number < range.start()) {
                offset = advance(offset, doc.measure_length(measure.node)?, measure)?;
            }
            offset
        }
        None => 0,
    };

    let selected: Vec<&Measure> = measures
        .iter()
        .filter(|m| range.map_or(true, |r| r.contains(m.number)))
        .collect();
    if let Some(range) = range {
        log::debug!(
            "Filtering to measures {}: {} measures found, origin tick {}",
            range,
            selected.len(),
            origin
        );
    }

    let mut events = Vec::new();
    let mut current_tick = origin;

    for measure in selected {
        let measure_length = doc.measure_length(measure.node)?;
        let mut measure_tick = 0u64;
        let mut has_chords = false;

        // absolute >= current_tick >= origin
        let event = |absolute: u64, offset: u64, duration: u64, pitches: Vec<i32>| ChordEvent {
            measure: measure.number,
            beat: offset as f64 / division as f64 + 1.0,
            tick: absolute - origin,
            duration,
            pitches,
        };

        for chord in measure.node.descendants().filter(|n| is_element(*n, "Chord")) {
            has_chords = true;

            // Offset of the chord from the start of its measure
            let offset = match chord.attribute("tick") {
                Some(text) => {
                    let tick: u64 = parse_number("tick", text)?;
                    if tick < measure_length {
                        tick
                    } else {
                        tick.checked_sub(current_tick).ok_or_else(|| invalid_tick(text))?
                    }
                }
                None => measure_tick,
            };
            let absolute = current_tick
                .checked_add(offset)
                .ok_or_else(|| invalid_tick(offset))?;

            let duration = match get_child_text(chord, "duration") {
                Some(text) => parse_number::<u32>("duration", text)? as u64,
                None => division,
            };

            let mut pitches = Vec::new();
            for note in chord.children().filter(|n| is_element(*n, "Note")) {
                if let Some(pitch) = note_pitch(note)? {
                    pitches.push(pitch);
                }
            }
            if !pitches.is_empty() {
                events.push(event(absolute, offset, duration, pitches));
            }

            let end = offset.checked_add(duration).ok_or_else(|| invalid_tick(offset))?;
            measure_tick = measure_tick.max(end);
        }

        if !has_chords {
            // Chordless layout: each pitched note takes one quarter in turn
            for note in measure.node.descendants().filter(|n| is_element(*n, "Note")) {
                if let Some(pitch) = note_pitch(note)? {
                    let absolute = current_tick
                        .checked_add(measure_tick)
                        .ok_or_else(|| invalid_tick(measure_tick))?;
                    events.push(event(absolute, measure_tick, division, vec![pitch]));
                    measure_tick = measure_tick.saturating_add(division);
                }
            }
        }

        current_tick = advance(current_tick, measure_length, measure)?;
    }

    events.sort_by_key(|e| e.tick);
    Ok(events)
}

fn advance(tick: u64, measure_length: u64, measure: &Measure) -> Result<u64> {
    tick.checked_add(measure_length).ok_or_else(|| MscxError::InvalidValue {
        element: "Measure".to_string(),
        value: measure.number.to_string(),
    })
}

fn invalid_tick(value: impl ToString) -> MscxError {
    MscxError::InvalidValue {
        element: "tick".to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(pitch: i32, duration: u32) -> String {
        format!(
            "<Chord><duration>{}</duration><Note><pitch>{}</pitch></Note></Chord>",
            duration, pitch
        )
    }

    #[test]
    fn test_sequential_chords_advance() {
        let xml = format!(
            "<museScore><Measure>{}{}{}</Measure></museScore>",
            chord(60, 480),
            chord(62, 240),
            chord(64, 960)
        );
        let doc = ScoreDocument::parse(&xml).unwrap();
        let events = walk(&doc, None).unwrap();

        let ticks: Vec<u64> = events.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 720]);
        let beats: Vec<f64> = events.iter().map(|e| e.beat).collect();
        assert_eq!(beats, vec![1.0, 2.0, 2.5]);
        assert_eq!(events[2].duration, 960);
    }

    #[test]
    fn test_missing_duration_is_a_quarter() {
        let xml = r#"<museScore><Division>240</Division><Measure>
            <Chord><Note><pitch>60</pitch></Note></Chord>
            <Chord><Note><pitch>62</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();
        assert_eq!(events[1].tick, 240);
        assert_eq!(events[1].beat, 2.0);
        assert_eq!(events[1].duration, 240);
    }

    #[test]
    fn test_relative_and_absolute_chord_ticks() {
        let xml = r#"<museScore>
            <Measure><Chord><Note><pitch>60</pitch></Note></Chord></Measure>
            <Measure>
                <Chord tick="960"><Note><pitch>62</pitch></Note></Chord>
                <Chord tick="3360"><Note><pitch>64</pitch></Note></Chord>
            </Measure>
        </museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();

        // 960 < 1920 is measure-relative, 3360 is already absolute
        assert_eq!(events[1].tick, 1920 + 960);
        assert_eq!(events[1].beat, 3.0);
        assert_eq!(events[2].tick, 3360);
        assert_eq!(events[2].beat, 4.0);
    }

    #[test]
    fn test_overlapping_chord_extends_measure_cursor() {
        // Second chord starts at 0 but lasts a half note, so the third
        // chord starts after it rather than after the first
        let xml = r#"<museScore><Measure>
            <Chord><duration>480</duration><Note><pitch>60</pitch></Note></Chord>
            <Chord tick="0"><duration>960</duration><Note><pitch>48</pitch></Note></Chord>
            <Chord><duration>480</duration><Note><pitch>62</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();

        let order: Vec<(u64, i32)> = events.iter().map(|e| (e.tick, e.pitches[0])).collect();
        assert_eq!(order, vec![(0, 60), (0, 48), (960, 62)]);
    }

    #[test]
    fn test_time_signatures_shift_later_measures() {
        let xml = format!(
            "<museScore>\
             <Measure><TimeSig><sigN>3</sigN><sigD>4</sigD></TimeSig>{}</Measure>\
             <Measure>{}</Measure>\
             </museScore>",
            chord(60, 480),
            chord(62, 480)
        );
        let doc = ScoreDocument::parse(&xml).unwrap();
        let events = walk(&doc, None).unwrap();
        assert_eq!(events[1].tick, 1440);
        assert_eq!(events[1].measure, 2);
        assert_eq!(events[1].beat, 1.0);
    }

    #[test]
    fn test_chordless_measure_uses_quarter_steps() {
        let xml = r#"<museScore><Measure>
            <Note><pitch>60</pitch></Note>
            <Note/>
            <Note><pitch>62</pitch></Note>
            <Note><pitch>64</pitch></Note>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();

        let beats: Vec<f64> = events.iter().map(|e| e.beat).collect();
        assert_eq!(beats, vec![1.0, 2.0, 3.0]);
        let ticks: Vec<u64> = events.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 960]);
    }

    #[test]
    fn test_unpitched_chords_still_take_time() {
        let xml = r#"<museScore><Measure>
            <Chord><duration>960</duration><Note/></Chord>
            <Chord><Note><pitch>67</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 960);
    }

    #[test]
    fn test_range_origin_uses_preceding_signatures() {
        let xml = format!(
            "<museScore>\
             <Measure><TimeSig><sigN>2</sigN><sigD>4</sigD></TimeSig>{}</Measure>\
             <Measure>{}</Measure>\
             <Measure>{}</Measure>\
             </museScore>",
            chord(60, 480),
            chord(62, 480),
            chord(64, 480)
        );
        let doc = ScoreDocument::parse(&xml).unwrap();
        let range = MeasureRange::new(3, 3).unwrap();
        let events = walk(&doc, Some(range)).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].measure, 3);
        assert_eq!(events[0].tick, 0);
        assert_eq!(events[0].beat, 1.0);
    }

    #[test]
    fn test_absolute_tick_inside_range_is_window_relative() {
        let xml = r#"<museScore>
            <Measure><Chord><Note><pitch>60</pitch></Note></Chord></Measure>
            <Measure><Chord tick="2400"><Note><pitch>62</pitch></Note></Chord></Measure>
        </museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let range = MeasureRange::new(2, 2).unwrap();
        let events = walk(&doc, Some(range)).unwrap();

        assert_eq!(events[0].tick, 480);
        assert_eq!(events[0].beat, 2.0);
    }

    fn tick_error(xml: &str) -> Option<String> {
        let doc = ScoreDocument::parse(xml).unwrap();
        match walk(&doc, None) {
            Err(MscxError::InvalidValue { element, value }) if element == "tick" => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_negative_chord_tick_is_rejected() {
        let xml = r#"<museScore><Measure>
            <Chord tick="-480"><Note><pitch>60</pitch></Note></Chord>
        </Measure></museScore>"#;
        assert_eq!(tick_error(xml), Some("-480".to_string()));
    }

    #[test]
    fn test_absolute_tick_before_its_measure_is_rejected() {
        // 2000 is not measure-relative (>= 1920) but measure 3 starts at 3840
        let xml = r#"<museScore>
            <Measure/><Measure/>
            <Measure><Chord tick="2000"><Note><pitch>60</pitch></Note></Chord></Measure>
        </museScore>"#;
        assert_eq!(tick_error(xml), Some("2000".to_string()));
    }

    #[test]
    fn test_huge_chord_ticks_do_not_wrap() {
        let xml = r#"<museScore><Measure>
            <Chord tick="9223372036854775807"><Note><pitch>60</pitch></Note></Chord>
            <Chord><Note><pitch>62</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        let events = walk(&doc, None).unwrap();
        assert_eq!(events[0].tick, i64::MAX as u64);
        assert_eq!(events[1].tick, i64::MAX as u64 + 480);
        assert!(events.iter().all(|e| e.beat >= 1.0));

        // The end of this chord does not fit in a tick counter
        let xml = r#"<museScore><Measure>
            <Chord tick="18446744073709551615"><Note><pitch>60</pitch></Note></Chord>
        </Measure></museScore>"#;
        assert_eq!(tick_error(xml), Some("18446744073709551615".to_string()));
    }

    #[test]
    fn test_bad_chord_tick_is_an_error() {
        let xml = r#"<museScore><Measure>
            <Chord tick="soon"><Note><pitch>60</pitch></Note></Chord>
        </Measure></museScore>"#;
        let doc = ScoreDocument::parse(xml).unwrap();
        assert!(walk(&doc, None).is_err());
    }
}
