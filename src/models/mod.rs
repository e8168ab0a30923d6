//! Models module
//!
//! Plain data types shared by the extractors and the output writers.

pub mod pitch_name;
pub mod position;

// Re-export commonly used types
pub use pitch_name::{pitch_name, PITCH_NAMES};
pub use position::{ExtractedNote, MeasureRange, Position, RangeError};
