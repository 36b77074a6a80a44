//! Command-line front end over a file-backed palette.

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use swatchkeep_core::storage::FileStorage;
use swatchkeep_core::{Color, ColorFormat, PaletteSession, PendingSave, StorageError};
use thiserror::Error;

/// Keep named palettes of colors.
#[derive(Parser, Debug)]
#[command(name = "swatchkeep", version, about)]
pub struct Cli {
    /// Directory holding storage.json (overrides SWATCHKEEP_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List collections, marking the current one
    List,
    /// Show the slots of the current collection
    Show {
        #[arg(long)]
        format: Option<ColorFormat>,
    },
    /// Store a color in a slot (the slot after the last appends)
    Set { slot: usize, color: String },
    /// Remove the color in a slot
    Remove { slot: usize },
    /// Create a collection and make it current
    New { name: String },
    /// Rename the current collection
    Rename { name: String },
    /// Make another collection current
    Switch { name: String },
    /// Delete the current collection
    Delete,
    /// Copy a slot's color to the clipboard
    Copy {
        slot: usize,
        #[arg(long)]
        format: Option<ColorFormat>,
    },
    /// Print a color in every format
    Convert { color: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not a color: {0:?}")]
    InvalidColor(String),
    #[error("slot {0} holds no color")]
    EmptySlot(usize),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Somewhere copied text goes.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), CliError>;
}

/// The system clipboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), CliError> {
        let mut clipboard = arboard::Clipboard::new().map_err(|e| CliError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| CliError::Clipboard(e.to_string()))
    }
}

/// Run `command` against the palette stored under `config`.
pub fn run<W: Write, C: ClipboardSink>(
    command: Command,
    config: &AppConfig,
    out: &mut W,
    clipboard: &mut C,
) -> Result<(), CliError> {
    if let Command::Convert { color } = &command {
        return convert(color, out);
    }

    let storage = FileStorage::in_dir(&config.storage_dir()?)?;
    log::debug!("Using storage at {}", storage.path().display());
    let mut session = pollster::block_on(PaletteSession::open(Arc::new(storage)))?;

    execute(command, &mut session, config.format, out, clipboard)
}

fn execute<W: Write, C: ClipboardSink>(
    command: Command,
    session: &mut PaletteSession<FileStorage>,
    default_format: ColorFormat,
    out: &mut W,
    clipboard: &mut C,
) -> Result<(), CliError> {
    match command {
        Command::List => {
            let store = session.store();
            for name in store.names() {
                let marker = if name == store.current_name() { '*' } else { ' ' };
                let count = store.get(name).map_or(0, |c| c.iter().filter(|s| !s.is_empty()).count());
                writeln!(out, "{} {} ({})", marker, name, count)?;
            }
        }
        Command::Show { format } => {
            let format = format.unwrap_or(default_format);
            writeln!(out, "{}", session.store().current_name())?;
            for view in session.slots() {
                writeln!(out, "{:>3}  {}", view.index, view.value(format).unwrap_or("(empty)"))?;
            }
        }
        Command::Set { slot, color } => {
            let parsed = Color::parse(&color).ok_or(CliError::InvalidColor(color))?;
            let save = session.set_color(slot, parsed);
            report(out, save, format!("Slot {} set to {}", slot, parsed))?;
        }
        Command::Remove { slot } => {
            let save = session.remove_color(slot);
            report(out, save, format!("Removed slot {}", slot))?;
        }
        Command::New { name } => {
            let save = session.create_collection(&name);
            report(out, save, format!("Created collection {:?}", name.trim()))?;
        }
        Command::Rename { name } => {
            let old = session.store().current_name().to_string();
            let save = session.rename_current(&name);
            report(out, save, format!("Renamed {:?} to {:?}", old, name.trim()))?;
        }
        Command::Switch { name } => {
            let save = session.switch_current(&name);
            report(out, save, format!("Switched to {:?}", name.trim()))?;
        }
        Command::Delete => {
            let old = session.store().current_name().to_string();
            let save = session.delete_current();
            let message = format!(
                "Deleted {:?}, current is now {:?}",
                old,
                session.store().current_name()
            );
            report(out, save, message)?;
        }
        Command::Copy { slot, format } => {
            let format = format.unwrap_or(default_format);
            let color = session
                .store()
                .current()
                .get(slot)
                .and_then(|s| s.color())
                .ok_or(CliError::EmptySlot(slot))?;
            let text = color.format(format);
            clipboard.set_text(&text)?;
            writeln!(out, "Copied {}", text)?;
        }
        Command::Convert { color } => convert(&color, out)?,
    }
    Ok(())
}

/// Run the pending write, or tell the user nothing changed.
fn report<W: Write>(out: &mut W, save: Option<PendingSave>, message: String) -> Result<(), CliError> {
    match save {
        Some(save) => {
            pollster::block_on(save)?;
            writeln!(out, "{}", message)?;
        }
        None => writeln!(out, "Nothing changed")?,
    }
    Ok(())
}

fn convert<W: Write>(text: &str, out: &mut W) -> Result<(), CliError> {
    let color = Color::parse(text).ok_or_else(|| CliError::InvalidColor(text.to_string()))?;
    for format in [ColorFormat::Hex, ColorFormat::Rgb, ColorFormat::Hsl] {
        writeln!(out, "{}", color.format(format))?;
    }
    Ok(())
}
