//! Line-oriented text reports
//!
//! Position report lines look like `C4\tM1:1.00\t(tick: 0)`. Notes whose
//! position is unknown are written as `C4\tM?:?`.

use crate::models::ExtractedNote;

/// Suffix of position report files (`<stem>_pitches_with_position.txt`)
pub const POSITIONS_SUFFIX: &str = "_pitches_with_position.txt";

/// Suffix of pitch list files (`<stem>_pitches.txt`)
pub const PITCHES_SUFFIX: &str = "_pitches.txt";

/// `M{measure}:{beat}` with the beat to two decimals, or `M?:?`
pub fn format_position(note: &ExtractedNote) -> String {
    match note.position {
        Some(p) => format!("M{}:{:.2}", p.measure, p.beat),
        None => "M?:?".to_string(),
    }
}

/// One report line, without the newline
pub fn format_note_line(note: &ExtractedNote) -> String {
    match note.position {
        Some(p) => format!("{}\t{}\t(tick: {})", note.pitch_name, format_position(note), p.tick),
        None => format!("{}\t{}", note.pitch_name, format_position(note)),
    }
}

/// Full position report, one newline-terminated line per note
pub fn positions_report(notes: &[ExtractedNote]) -> String {
    let mut out = String::new();
    for note in notes {
        out.push_str(&format_note_line(note));
        out.push('\n');
    }
    out
}

/// Pitch list, one newline-terminated name per line
pub fn pitches_report(pitches: &[String]) -> String {
    let mut out = String::new();
    for pitch in pitches {
        out.push_str(pitch);
        out.push('\n');
    }
    out
}
