//! Timing-agnostic pitch scans
//!
//! These ignore measures entirely and collect `pitch` values in document
//! order. They back up the structured walk for documents whose layout the
//! walk does not understand.

use crate::converters::mscx::document::{
    get_child, is_element, is_namespaced_element, non_empty_text, parse_number,
};
use crate::converters::mscx::Result;
use roxmltree::Node;

/// MIDI pitch of an un-namespaced `Note`, if it has one
pub fn note_pitch(note: Node) -> Result<Option<i32>> {
    get_child(note, "pitch")
        .and_then(non_empty_text)
        .map(|text| parse_number("pitch", text))
        .transpose()
}

/// Pitches of every `Chord` → `Note` → `pitch` path
pub fn chord_note_pitches(root: Node) -> Result<Vec<i32>> {
    let mut pitches = Vec::new();
    for chord in root.descendants().filter(|n| is_element(*n, "Chord")) {
        for note in chord.children().filter(|n| is_element(*n, "Note")) {
            if let Some(pitch) = note_pitch(note)? {
                pitches.push(pitch);
            }
        }
    }
    Ok(pitches)
}

/// Pitches of every `Note` → `pitch` path, wherever the note sits
pub fn note_pitches(root: Node) -> Result<Vec<i32>> {
    let mut pitches = Vec::new();
    for note in root.descendants().filter(|n| is_element(*n, "Note")) {
        if let Some(pitch) = note_pitch(note)? {
            pitches.push(pitch);
        }
    }
    Ok(pitches)
}

/// Pitches of every `Note` → `pitch` path in the MuseScore namespace
pub fn namespaced_note_pitches(root: Node) -> Result<Vec<i32>> {
    let mut pitches = Vec::new();
    for note in root.descendants().filter(|n| is_namespaced_element(*n, "Note")) {
        let pitch = note
            .children()
            .find(|n| is_namespaced_element(*n, "pitch"))
            .and_then(non_empty_text);
        if let Some(text) = pitch {
            pitches.push(parse_number("pitch", text)?);
        }
    }
    Ok(pitches)
}
