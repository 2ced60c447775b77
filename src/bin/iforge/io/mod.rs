mod infer;

pub use infer::defaults_format as infer_defaults_format;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};

pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn stdin_is_tty() -> bool {
    io::stdin().is_terminal()
}

/// What a file argument is read as; only used to word errors.
#[derive(Debug, Clone, Copy)]
pub enum InputKind {
    Deck,
    Defaults,
    Schema,
}

impl InputKind {
    fn describe(self) -> &'static str {
        match self {
            InputKind::Deck => "input deck",
            InputKind::Defaults => "defaults file",
            InputKind::Schema => "tag schema",
        }
    }
}

/// Opens `path`, or stdin when no path is given.
pub fn open_input(path: Option<&Path>, kind: InputKind) -> Result<Box<dyn BufRead>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdin().lock()));
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}: {}", kind.describe(), path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Creates `path` for writing, or locks stdout when no path is given.
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

pub fn read_text(path: &Path, kind: InputKind) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", kind.describe(), path.display()))
}
