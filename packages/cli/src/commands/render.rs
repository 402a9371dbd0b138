use super::emit;
use anyhow::{anyhow, Result};
use clap::Args;
use pagekit_editor::{Editor, EditorConfig};
use pagekit_markup::SerializeMode;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Page id (defaults to the active page)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Serialization mode (authoring, publish); overrides config
    #[arg(short, long)]
    pub mode: Option<SerializeMode>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn render(args: RenderArgs, mut config: EditorConfig) -> Result<()> {
    if let Some(mode) = args.mode {
        config.serialize_mode = mode;
    }
    let editor = Editor::open(&args.document, config)?;

    let page = args
        .page
        .unwrap_or_else(|| editor.document().active_page_id.clone());
    let html = editor
        .render(&page)
        .ok_or_else(|| anyhow!("Page not found: {}", page))?;

    emit(&html, args.output.as_deref())
}
