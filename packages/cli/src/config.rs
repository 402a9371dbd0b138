use anyhow::{Context, Result};
use pagekit_editor::EditorConfig;
use std::path::Path;

/// Config from `--config`, else `pagekit.config.json` in `cwd`, else defaults
pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<EditorConfig> {
    match explicit {
        Some(path) => EditorConfig::load_file(path)
            .with_context(|| format!("Cannot read config {}", path.display())),
        None => EditorConfig::load(cwd).context("Cannot read pagekit.config.json"),
    }
}
