//! Lean representation for MuseScore → MIDI export
//!
//! Just the note triples and the header values a single-track Standard MIDI
//! File needs.

use crate::converters::mscx::mscx_to_positions::ChordEvent;

/// Nominal tempo of exported files
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Velocity for every exported note
pub const DEFAULT_VELOCITY: u8 = 64;

#[derive(Debug, Clone)]
pub struct MidiScore {
    pub tpq: u16,       // Ticks per quarter note (the score's division)
    pub bpm: f64,       // Single tempo at tick 0
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub start_tick: u64,
    pub dur_tick: u64,
    pub pitch: u8, // MIDI note number 0-127
    pub vel: u8,   // Velocity 1-127
}

/// Flatten chord onsets into note triples, one per pitch
///
/// Pitches outside the MIDI range cannot be encoded and are dropped.
pub fn notes_from_events(events: &[ChordEvent]) -> Vec<Note> {
    let mut notes = Vec::new();
    for event in events {
        for &pitch in &event.pitches {
            match u8::try_from(pitch).ok().filter(|p| *p <= 127) {
                Some(pitch) => notes.push(Note {
                    start_tick: event.tick,
                    dur_tick: event.duration,
                    pitch,
                    vel: DEFAULT_VELOCITY,
                }),
                None => log::warn!(
                    "Skipping pitch {} in measure {}: outside MIDI range",
                    pitch,
                    event.measure
                ),
            }
        }
    }
    notes
}

/// Tempo meta value for a BPM
pub fn microseconds_per_quarter(bpm: f64) -> u32 {
    (60_000_000.0 / bpm) as u32
}
