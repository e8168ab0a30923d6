//! Persisted preferences
//!
//! Stored as JSON in the platform config directory. A missing or unreadable
//! file simply means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PREFERENCES_FILE: &str = "preferences.json";

/// Artifact kind produced for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pitch names with measure positions
    #[default]
    Text,
    /// Standard MIDI File
    Midi,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Folder scanned for new scores
    pub watch_folder: Option<PathBuf>,
    /// Whether watching was active when preferences were last saved
    pub watching: bool,
    pub output_format: OutputFormat,
    /// Delete the previous artifact after each successful extraction
    pub delete_previous: bool,
    /// Root for the `txts` / `midis` output directories
    pub output_root: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot save preferences to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the per-user config directory, if the platform has one
    pub fn default_location() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("org", "score-clipboard", "score-clipboard")?;
        Some(Self::new(dirs.config_dir().join(PREFERENCES_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("No preferences at {} ({}), using defaults", self.path.display(), e);
                return Preferences::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable preferences {}: {}", self.path.display(), e);
            Preferences::default()
        })
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(preferences)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved preferences: {}", self.path.display());
        Ok(())
    }
}

/// Folder to watch when the user has not picked one that still exists
///
/// Saved folder, then `~/Documents/MuseScore4/Scores`, then `~/Documents`.
pub fn resolve_watch_folder(saved: Option<&Path>) -> Option<PathBuf> {
    if let Some(saved) = saved.filter(|p| p.is_dir()) {
        return Some(saved.to_path_buf());
    }

    let documents = directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().join("Documents")))?;

    let scores = documents.join("MuseScore4").join("Scores");
    if scores.is_dir() {
        Some(scores)
    } else {
        Some(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("none.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("nested").join(PREFERENCES_FILE));
        let preferences = Preferences {
            watch_folder: Some(PathBuf::from("/scores")),
            watching: true,
            output_format: OutputFormat::Midi,
            delete_previous: true,
            output_root: None,
        };

        store.save(&preferences).unwrap();
        assert_eq!(store.load(), preferences);
    }

    #[test]
    fn test_partial_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let store = PreferencesStore::new(&path);

        std::fs::write(&path, r#"{"watching": true, "output_format": "midi"}"#).unwrap();
        let loaded = store.load();
        assert!(loaded.watching);
        assert_eq!(loaded.output_format, OutputFormat::Midi);
        assert_eq!(loaded.watch_folder, None);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn test_saved_watch_folder_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_watch_folder(Some(dir.path())),
            Some(dir.path().to_path_buf())
        );
        let gone = dir.path().join("gone");
        assert_ne!(resolve_watch_folder(Some(&gone)), Some(gone));
    }
}
