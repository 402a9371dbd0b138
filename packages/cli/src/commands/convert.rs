use super::{emit, read_input};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagekit_editor::{Editor, EditorConfig};
use pagekit_markup::Codec;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// HTML file to convert
    pub input: PathBuf,

    /// Codec (semantic, lossless); overrides config
    #[arg(short, long)]
    pub codec: Option<Codec>,

    /// Name of the page holding the converted sections
    #[arg(long, default_value = "Home")]
    pub page_name: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn convert(args: ConvertArgs, mut config: EditorConfig) -> Result<()> {
    if let Some(codec) = args.codec {
        config.default_codec = codec;
    }
    let html = read_input(&args.input)?;
    let editor = Editor::from_markup(&html, &args.page_name, config);

    let document = editor.document();
    eprintln!(
        "{} {} → {} sections, {} elements",
        "🔨".bright_blue(),
        args.input.display(),
        document.active_page().map(|p| p.layout.len()).unwrap_or(0),
        document.element_count()
    );

    emit(&document.to_json()?, args.output.as_deref())
}
