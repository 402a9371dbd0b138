use crate::errors::EditorResult;
use crate::history::DEFAULT_CAPACITY;
use pagekit_document::{IdGenerator, NodeFactory};
use pagekit_markup::{Codec, SerializeMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "pagekit.config.json";

/// Pagekit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Codec used for imported and generated markup
    #[serde(default)]
    pub default_codec: Codec,

    #[serde(default)]
    pub serialize_mode: SerializeMode,

    /// Seeds node ids, so repeated runs produce the same ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,

    /// Fallback log filter for the CLI
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_history_limit() -> usize {
    DEFAULT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EditorConfig {
    /// Load `pagekit.config.json` from a directory, or defaults if absent
    pub fn load(dir: &Path) -> EditorResult<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_file(path: &Path) -> EditorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Node factory honouring `idPrefix`
    pub fn node_factory(&self) -> NodeFactory {
        match &self.id_prefix {
            Some(prefix) => NodeFactory::with_ids(IdGenerator::with_prefix(prefix)),
            None => NodeFactory::new(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            default_codec: Codec::default(),
            serialize_mode: SerializeMode::default(),
            id_prefix: None,
            log_level: default_log_level(),
        }
    }
}
