//! Format converters
//!
//! This module contains converters from MuseScore scores to note listings
//! and MIDI.

pub mod mscx;
