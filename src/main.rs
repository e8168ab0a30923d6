//! score-clipboard - extract notes from MuseScore scores
//!
//! Subcommands:
//! - `score-clipboard positions <file>` - Pitch names with measure/beat positions
//! - `score-clipboard pitches <file>` - Pitch names only
//! - `score-clipboard midi <file>` - Standard MIDI File export
//! - `score-clipboard watch [folder]` - Extract every newly saved score

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use score_clipboard::config::{resolve_watch_folder, OutputFormat, PreferencesStore};
use score_clipboard::converters::mscx::mscx_to_midi::{export_midi, MidiExportOptions};
use score_clipboard::converters::mscx::mscx_to_text::{format_note_line, pitches_report, positions_report};
use score_clipboard::converters::mscx::{extract_pitches_from_path, extract_positions_from_path};
use score_clipboard::models::MeasureRange;
use score_clipboard::output::{clean_path_arg, ensure_parent, remove_previous, write_artifact, OutputLayout};
use score_clipboard::watch::{FolderWatcher, WatchSettings};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Notes echoed to the terminal after an extraction
const PREVIEW_NOTES: usize = 10;

#[derive(Parser)]
#[command(name = "score-clipboard")]
#[command(about = "Extract notes, positions and MIDI from MuseScore scores")]
#[command(version)]
struct Cli {
    /// Root directory for the txts/ and midis/ output folders
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pitch names with measure and beat positions
    Positions {
        /// .mscx or .mscz file
        file: String,

        /// Inclusive measure window, e.g. 5-12
        #[arg(short, long)]
        measures: Option<MeasureRange>,

        /// Write the report here instead of txts/
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pitch names only, in document order
    Pitches {
        /// .mscx or .mscz file
        file: String,

        /// Write the list here instead of txts/
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a Standard MIDI File
    Midi {
        /// .mscx or .mscz file
        file: String,

        /// Inclusive measure window, e.g. 5-12
        #[arg(short, long)]
        measures: Option<MeasureRange>,

        /// Write the MIDI file here instead of midis/
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Never call an installed MuseScore
        #[arg(long)]
        no_native: bool,
    },

    /// Watch a folder and extract every newly saved score (runs until interrupted)
    Watch {
        /// Folder to watch (defaults to the saved one, then the MuseScore scores folder)
        folder: Option<String>,

        /// Artifact to produce for each score
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Delete the previous artifact after each extraction
        #[arg(long)]
        delete_previous: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = PreferencesStore::default_location();
    let mut preferences = store.as_ref().map(PreferencesStore::load).unwrap_or_default();
    let layout = OutputLayout::new(
        cli.output_root
            .clone()
            .or_else(|| preferences.output_root.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
    );

    match cli.command {
        Commands::Positions { file, measures, output } => {
            let input = clean_path_arg(&file);
            let path = output.unwrap_or_else(|| layout.positions_path(&input));
            extract_positions(&input, measures, &path)?;
        }
        Commands::Pitches { file, output } => {
            let input = clean_path_arg(&file);
            let pitches = extract_pitches_from_path(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            if pitches.is_empty() {
                bail!("no notes extracted from {}", input.display());
            }
            let path = output.unwrap_or_else(|| layout.pitches_path(&input));
            write_artifact(&path, pitches_report(&pitches).as_bytes())?;
            print_preview(pitches.iter().cloned(), pitches.len());
            println!("Saved {} pitches to {}", pitches.len(), path.display());
        }
        Commands::Midi {
            file,
            measures,
            output,
            no_native,
        } => {
            let input = clean_path_arg(&file);
            let path = output.unwrap_or_else(|| layout.midi_path(&input));
            let options = MidiExportOptions {
                range: measures,
                skip_native: no_native,
                native: None,
            };
            ensure_parent(&path)?;
            let method = export_midi(&input, &path, &options)?;
            println!("Saved MIDI ({:?}) to {}", method, path.display());
        }
        Commands::Watch {
            folder,
            format,
            delete_previous,
        } => {
            let folder = folder
                .map(|f| clean_path_arg(&f))
                .or_else(|| resolve_watch_folder(preferences.watch_folder.as_deref()))
                .context("no folder to watch")?;
            let format = format.unwrap_or(preferences.output_format);
            let delete_previous = delete_previous || preferences.delete_previous;

            preferences.watch_folder = Some(folder.clone());
            preferences.output_format = format;
            preferences.delete_previous = delete_previous;
            preferences.watching = true;
            if let Some(store) = &store {
                if let Err(e) = store.save(&preferences) {
                    log::warn!("{}", e);
                }
            }

            watch(&folder, &layout, format, delete_previous)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // try_init also bridges `log` records into tracing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn extract_positions(input: &Path, range: Option<MeasureRange>, path: &Path) -> Result<usize> {
    let notes = extract_positions_from_path(input, range)
        .with_context(|| format!("cannot read {}", input.display()))?;
    if notes.is_empty() {
        bail!("no notes extracted from {}", input.display());
    }

    write_artifact(path, positions_report(&notes).as_bytes())?;
    print_preview(notes.iter().map(format_note_line), notes.len());
    println!("Saved {} notes to {}", notes.len(), path.display());
    Ok(notes.len())
}

fn print_preview(lines: impl Iterator<Item = String>, total: usize) {
    for line in lines.take(PREVIEW_NOTES) {
        println!("  {}", line);
    }
    if total > PREVIEW_NOTES {
        println!("  ... and {} more", total - PREVIEW_NOTES);
    }
}

fn watch(folder: &Path, layout: &OutputLayout, format: OutputFormat, delete_previous: bool) -> Result<()> {
    let watcher = FolderWatcher::new(folder, WatchSettings::default())
        .with_context(|| format!("cannot watch {}", folder.display()))?;
    let (tx, rx) = mpsc::channel();
    // Keeps polling for as long as this loop receives; runs until interrupted
    let _watcher = watcher.spawn_until_hangup(tx);

    let mut previous: Option<PathBuf> = None;
    for score in rx {
        let result = match format {
            OutputFormat::Text => {
                let path = layout.positions_path(&score);
                extract_positions(&score, None, &path).map(|_| path)
            }
            OutputFormat::Midi => {
                let path = layout.midi_path(&score);
                ensure_parent(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|()| export_midi(&score, &path, &MidiExportOptions::default()).map_err(Into::into))
                    .map(|method| {
                        println!("Saved MIDI ({:?}) to {}", method, path.display());
                        path
                    })
            }
        };

        match result {
            Ok(path) => {
                if delete_previous {
                    remove_previous(previous.as_deref(), &path);
                }
                previous = Some(path);
            }
            Err(e) => log::warn!("Extraction failed for {}: {:#}", score.display(), e),
        }
    }

    Ok(())
}
