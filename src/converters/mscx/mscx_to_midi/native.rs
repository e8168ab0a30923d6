//! MIDI export through an installed MuseScore
//!
//! MuseScore's command line renders MIDI itself (`mscore -o out.mid in.mscz`),
//! which handles repeats, ties and dynamics that the library encoder ignores.

use crate::converters::mscx::mscx_to_midi::{MidiError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// How long one MuseScore invocation may run
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/MuseScore 4.app/Contents/MacOS/mscore",
    "/Applications/MuseScore 4.app/Contents/MacOS/MuseScore4",
    "/Applications/MuseScore.app/Contents/MacOS/mscore",
];

#[cfg(windows)]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\MuseScore 4\bin\MuseScore4.exe",
    r"C:\Program Files (x86)\MuseScore 4\bin\MuseScore4.exe",
    r"C:\Program Files\MuseScore 3\bin\MuseScore3.exe",
    r"C:\Program Files (x86)\MuseScore 3\bin\MuseScore3.exe",
];

#[cfg(not(any(target_os = "macos", windows)))]
const INSTALL_PATHS: &[&str] = &[];

const PATH_NAMES: &[&str] = &["mscore", "MuseScore4", "MuseScore3"];

/// A located MuseScore executable
#[derive(Debug, Clone)]
pub struct NativeExporter {
    executable: PathBuf,
    timeout: Duration,
}

impl NativeExporter {
    pub fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            timeout: EXPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find MuseScore in the platform install locations, then on `PATH`
    pub fn locate() -> Option<Self> {
        find_musescore().map(Self::new)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Render `input` to a MIDI file at `output`
    ///
    /// Tries `-o <out> <in>` first, then `<in> -o <out>` for older builds.
    /// Succeeds only if MuseScore exits cleanly and the file exists.
    pub fn export(&self, input: &Path, output: &Path) -> Result<()> {
        let flag = OsStr::new("-o");
        let attempts = [
            [flag, output.as_os_str(), input.as_os_str()],
            [input.as_os_str(), flag, output.as_os_str()],
        ];

        let mut last_failure = String::new();
        for args in attempts {
            let mut command = Command::new(&self.executable);
            command.args(args);
            log::debug!("Running {:?}", command);

            match run_with_timeout(&mut command, self.timeout) {
                Ok(Some(status)) if status.success() && output.exists() => return Ok(()),
                Ok(Some(status)) => last_failure = format!("exited with {}", status),
                Ok(None) => {
                    last_failure = format!("timed out after {}s", self.timeout.as_secs())
                }
                Err(e) => last_failure = e.to_string(),
            }
        }

        Err(MidiError::Native(format!(
            "{}: {}",
            self.executable.display(),
            last_failure
        )))
    }
}

/// Locate a MuseScore executable for this platform
pub fn find_musescore() -> Option<PathBuf> {
    INSTALL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .or_else(|| PATH_NAMES.iter().find_map(|name| search_path(name)))
}

fn search_path(name: &str) -> Option<PathBuf> {
    let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Run a command to completion, killing it once `timeout` elapses
///
/// Returns `Ok(None)` on timeout.
fn run_with_timeout(command: &mut Command, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
