use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagekit_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            DEFAULT_CONFIG_NAME
        ));
    }

    let json = serde_json::to_string_pretty(&EditorConfig::default())?;
    fs::write(&config_path, json)?;

    eprintln!("{} {}", "✓".green(), format!("Created {}", DEFAULT_CONFIG_NAME).bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        init(InitArgs { force: false }, dir.path()).unwrap();

        let written = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(written, EditorConfig::default());

        assert!(init(InitArgs { force: false }, dir.path()).is_err());
        assert!(init(InitArgs { force: true }, dir.path()).is_ok());
    }
}
