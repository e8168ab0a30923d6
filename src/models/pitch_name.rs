//! MIDI note number to pitch name conversion
//!
//! Names are always spelled with sharps (`C#`, never `Db`). Downstream tools
//! compare these strings verbatim, so the table must not change.

/// Chromatic note names, indexed by `pitch mod 12`
pub const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI note number to a name with octave (60 -> "C4")
///
/// Octave numbering follows the MIDI convention where note 0 is C-1.
/// Negative input uses floored division, so -1 becomes "B-2".
pub fn pitch_name(pitch: i32) -> String {
    let class = pitch.rem_euclid(12) as usize;
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", PITCH_NAMES[class], octave)
}
