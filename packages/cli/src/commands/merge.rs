use super::{emit, read_input};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagekit_editor::{Editor, EditorConfig};
use pagekit_markup::Codec;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Document JSON file holding the user's edits
    pub document: PathBuf,

    /// Incoming HTML (e.g. a fresh generation)
    pub incoming: PathBuf,

    /// Page id (defaults to the active page)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Codec for the incoming HTML; overrides config
    #[arg(short, long)]
    pub codec: Option<Codec>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn merge(args: MergeArgs, mut config: EditorConfig) -> Result<()> {
    if let Some(codec) = args.codec {
        config.default_codec = codec;
    }
    let html = read_input(&args.incoming)?;
    let mut editor = Editor::open(&args.document, config)?;

    let page = args
        .page
        .unwrap_or_else(|| editor.document().active_page_id.clone());
    let before = editor.document().page(&page).map(|p| p.layout.len()).unwrap_or(0);
    editor.import_markup(&html, &page)?;
    let after = editor.document().page(&page).map(|p| p.layout.len()).unwrap_or(0);

    eprintln!(
        "{} Merged {} into {} ({} → {} sections)",
        "✓".green(),
        args.incoming.display(),
        page,
        before,
        after
    );

    emit(&editor.document().to_json()?, args.output.as_deref())
}
