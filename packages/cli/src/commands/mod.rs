pub mod convert;
pub mod init;
pub mod inspect;
pub mod merge;
pub mod render;

pub use convert::{convert, ConvertArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use merge::{merge, MergeArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

/// Write `content` to `output`, or to stdout when no file was given
pub(crate) fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            eprintln!("  {} {}", "✓".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}
