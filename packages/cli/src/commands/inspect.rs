use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagekit_document::{walk, NodeRef};
use pagekit_editor::{Editor, EditorConfig};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Document JSON file
    pub document: PathBuf,
}

fn describe(node: &NodeRef<'_>) -> String {
    match node {
        NodeRef::Page(page) => format!("\"{}\" v{}", page.name, page.version),
        NodeRef::Section(section) => format!("{} v{}", section.kind.as_str(), section.version),
        NodeRef::Column(column) => column.width().unwrap_or("-").to_string(),
        NodeRef::Element(element) => element.kind.as_str().to_string(),
    }
}

pub fn inspect(args: InspectArgs, config: EditorConfig) -> Result<()> {
    let editor = Editor::open(&args.document, config)?;
    let document = editor.document();

    for (path, node) in walk(document) {
        let mut line = format!("{:<40} {:<8} {}", path.to_string(), node.level(), node.id());
        if path.page_id() == Some(document.active_page_id.as_str()) && node.level() == "page" {
            line = line.bold().to_string();
        }
        println!("{}  {}", line, describe(&node).dimmed());
    }

    eprintln!(
        "{} {} pages, {} elements",
        "✓".green(),
        document.pages.len(),
        document.element_count()
    );
    Ok(())
}
