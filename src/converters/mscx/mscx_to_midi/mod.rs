mod model;
mod native;
mod write;

pub use model::*;
pub use native::{find_musescore, NativeExporter, EXPORT_TIMEOUT};
pub use write::{write_smf, MAX_TICK, MAX_TPQ};

use crate::converters::mscx::mscx_to_positions::walk;
use crate::converters::mscx::{load_path, MscxError, ScoreDocument};
use crate::models::MeasureRange;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error(transparent)]
    Decode(#[from] MscxError),
    #[error("division {0} does not fit a MIDI header")]
    DivisionOutOfRange(u32),
    #[error("midi write error: {0}")]
    Write(String),
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("native export failed: {0}")]
    Native(String),
    #[error("all MIDI export strategies failed: {}", .0.join("; "))]
    AllStrategiesFailed(Vec<String>),
}

pub type Result<T> = std::result::Result<T, MidiError>;

/// Which strategy produced a MIDI file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMethod {
    /// Rendered by an installed MuseScore
    Native,
    /// Encoded from the decoded note timeline
    Library,
}

/// Options for [`export_midi`]
#[derive(Debug, Clone, Default)]
pub struct MidiExportOptions {
    /// Inclusive measure window; forces library encoding
    pub range: Option<MeasureRange>,
    /// Skip the native MuseScore export even when MuseScore is installed
    pub skip_native: bool,
    /// Use this executable instead of searching for MuseScore
    pub native: Option<NativeExporter>,
}

/// Build the exportable note list for a parsed score
///
/// Ticks per quarter note equal the score division. With a range, ticks
/// start at zero on the first selected measure.
pub fn score_from_document(doc: &ScoreDocument, range: Option<MeasureRange>) -> Result<MidiScore> {
    let tpq = u16::try_from(doc.division())
        .ok()
        .filter(|tpq| *tpq <= MAX_TPQ)
        .ok_or(MidiError::DivisionOutOfRange(doc.division()))?;

    let events = walk(doc, range)?;
    Ok(MidiScore {
        tpq,
        bpm: DEFAULT_TEMPO_BPM,
        notes: notes_from_events(&events),
    })
}

/// Convert score XML to SMF bytes
pub fn mscx_to_midi(xml: &str, range: Option<MeasureRange>) -> Result<Vec<u8>> {
    let doc = ScoreDocument::parse(xml)?;
    let score = score_from_document(&doc, range)?;
    if score.notes.is_empty() {
        log::warn!("No notes to encode, writing an empty track");
    }
    let mut out = Vec::new();
    write_smf(&score, &mut out)?;
    Ok(out)
}

/// Export a score file to a MIDI file
///
/// Strategies, in order:
/// 1. native MuseScore export (whole scores only)
/// 2. library encoding of the decoded timeline
///
/// Load and decode failures of the library encoder are returned as-is when
/// it was the only strategy tried.
pub fn export_midi(input: &Path, output: &Path, options: &MidiExportOptions) -> Result<ExportMethod> {
    let mut failures = Vec::new();

    if options.range.is_none() && !options.skip_native {
        match options.native.clone().or_else(NativeExporter::locate) {
            Some(native) => match native.export(input, output) {
                Ok(()) => {
                    log::info!("Exported MIDI with {}", native.executable().display());
                    return Ok(ExportMethod::Native);
                }
                Err(e) => {
                    log::warn!("{}, falling back to library encoding", e);
                    failures.push(e.to_string());
                }
            },
            None => log::debug!("MuseScore executable not found, using library encoding"),
        }
    }

    match library_export(input, output, options.range) {
        Ok(()) => Ok(ExportMethod::Library),
        Err(e) if failures.is_empty() => Err(e),
        Err(e) => {
            failures.push(e.to_string());
            Err(MidiError::AllStrategiesFailed(failures))
        }
    }
}

fn library_export(input: &Path, output: &Path, range: Option<MeasureRange>) -> Result<()> {
    let source = load_path(input).map_err(MscxError::from)?;
    let bytes = mscx_to_midi(&source.xml, range)?;
    std::fs::write(output, bytes).map_err(|source| MidiError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    log::info!("Encoded MIDI to {}", output.display());
    Ok(())
}
