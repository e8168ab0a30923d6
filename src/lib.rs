//! Score Clipboard
//!
//! Reads MuseScore scores (`.mscx`, `.mscz`) and extracts their notes: pitch
//! names with measure and beat positions, plain pitch lists, and Standard
//! MIDI Files. A folder watcher turns newly saved scores into these
//! artifacts automatically.

pub mod config;
pub mod converters;
pub mod models;
pub mod output;
pub mod watch;

// Re-export commonly used types
pub use converters::mscx::{
    extract_pitches_from_path, extract_positions_from_path, MscxError,
};
pub use models::{ExtractedNote, MeasureRange, Position};
