//! Where extracted artifacts go
//!
//! Text reports land in `<root>/txts`, MIDI files in `<root>/midis`, named
//! after the score file. An explicit output path chosen by the caller always
//! wins over the layout.

use crate::converters::mscx::mscx_to_text::{PITCHES_SUFFIX, POSITIONS_SUFFIX};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TEXT_DIR: &str = "txts";
pub const MIDI_DIR: &str = "midis";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn text_dir(&self) -> PathBuf {
        self.root.join(TEXT_DIR)
    }

    pub fn midi_dir(&self) -> PathBuf {
        self.root.join(MIDI_DIR)
    }

    /// `<root>/txts/<stem>_pitches_with_position.txt`
    pub fn positions_path(&self, input: &Path) -> PathBuf {
        self.text_dir().join(format!("{}{}", stem(input), POSITIONS_SUFFIX))
    }

    /// `<root>/txts/<stem>_pitches.txt`
    pub fn pitches_path(&self, input: &Path) -> PathBuf {
        self.text_dir().join(format!("{}{}", stem(input), PITCHES_SUFFIX))
    }

    /// `<root>/midis/<stem>.mid`
    pub fn midi_path(&self, input: &Path) -> PathBuf {
        self.midi_dir().join(format!("{}.mid", stem(input)))
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

fn stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "score".to_string())
}

/// Create the parent directory of an artifact path
pub fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| OutputError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write an artifact, creating its directory first
pub fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    ensure_parent(path)?;
    std::fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete the artifact of the previous extraction
///
/// Never touches `current`. Returns true when a file was removed.
pub fn remove_previous(previous: Option<&Path>, current: &Path) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if previous == current || !previous.exists() {
        return false;
    }
    match std::fs::remove_file(previous) {
        Ok(()) => {
            log::info!("Deleted previous extraction: {}", previous.display());
            true
        }
        Err(e) => {
            log::warn!("Failed to delete previous extraction ({}): {}", previous.display(), e);
            false
        }
    }
}

/// Trim whitespace and one layer of surrounding quotes from a pasted path
pub fn clean_path_arg(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}
