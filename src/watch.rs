//! Folder watcher for newly saved scores
//!
//! Polls a folder, remembering which score files it has already reported.
//! Files present when watching starts are never reported. A new file is
//! reported once its modification time is at least the settle delay old, so
//! a file still being written is picked up on a later poll.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

pub const SCORE_EXTENSIONS: &[&str] = &["mscx", "mscz"];

#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    /// Minimum age of a file's modification time before it is reported
    pub settle_delay: Duration,
    /// Pause after a failed folder listing
    pub error_backoff: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            error_backoff: Duration::from_secs(2),
        }
    }
}

pub fn is_score_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCORE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

pub struct FolderWatcher {
    folder: PathBuf,
    settings: WatchSettings,
    processed: HashSet<PathBuf>,
}

impl FolderWatcher {
    /// Start watching; existing score files count as already processed
    pub fn new(folder: impl Into<PathBuf>, settings: WatchSettings) -> std::io::Result<Self> {
        let folder = folder.into();
        let processed = list_scores(&folder)?.into_iter().collect();
        Ok(Self {
            folder,
            settings,
            processed,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// One scan of the folder, returning settled files not yet reported
    ///
    /// Files that disappeared are forgotten, so a score saved again under
    /// the same name is reported again.
    pub fn poll(&mut self) -> std::io::Result<Vec<PathBuf>> {
        let current = list_scores(&self.folder)?;
        let listed: HashSet<&PathBuf> = current.iter().collect();
        self.processed.retain(|p| listed.contains(p));

        let now = SystemTime::now();
        let mut ready = Vec::new();
        for path in current {
            if self.processed.contains(&path) {
                continue;
            }
            if !is_settled(&path, now, self.settings.settle_delay) {
                log::debug!("Waiting for {} to settle", path.display());
                continue;
            }
            self.processed.insert(path.clone());
            ready.push(path);
        }
        Ok(ready)
    }

    /// Poll until `running` is cleared or the receiver hangs up
    pub fn run(mut self, running: Arc<AtomicBool>, tx: Sender<PathBuf>) {
        log::info!("Watching {}", self.folder.display());
        while running.load(Ordering::Relaxed) {
            match self.poll() {
                Ok(ready) => {
                    for path in ready {
                        log::info!("New score detected: {}", path.display());
                        if tx.send(path).is_err() {
                            return;
                        }
                    }
                    std::thread::sleep(self.settings.poll_interval);
                }
                Err(e) => {
                    log::warn!("Cannot list {}: {}", self.folder.display(), e);
                    std::thread::sleep(self.settings.error_backoff);
                }
            }
        }
        log::info!("Stopped watching {}", self.folder.display());
    }

    pub fn spawn(self, running: Arc<AtomicBool>, tx: Sender<PathBuf>) -> JoinHandle<()> {
        std::thread::spawn(move || self.run(running, tx))
    }

    /// Poll on a background thread until the receiver is dropped
    pub fn spawn_until_hangup(self, tx: Sender<PathBuf>) -> JoinHandle<()> {
        self.spawn(Arc::new(AtomicBool::new(true)), tx)
    }
}

fn list_scores(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut scores = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_score_file(&path) {
            scores.push(path);
        }
    }
    scores.sort();
    Ok(scores)
}

fn is_settled(path: &Path, now: SystemTime, settle_delay: Duration) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    // mtime in the future counts as just written
    now.duration_since(modified)
        .map(|age| age >= settle_delay)
        .unwrap_or(false)
}
