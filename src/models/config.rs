// Configuration model
// Stored as YAML frontmatter in the global config.md

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub rootDir: PathBuf,     // Directory mirrored by the folder tree
    pub treePath: PathBuf,    // Persisted FolderTreeDocument (JSON)
    #[serde(default = "default_bind_address")]
    pub bindAddress: String,  // MCP server listen address
    #[serde(default = "default_log_level")]
    pub logLevel: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:44055".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Defaults anchored at the user's home and config directories
    pub fn defaultsFor(home: &std::path::Path, configDir: &std::path::Path) -> Self {
        Self {
            rootDir: home.join("Projects"),
            treePath: configDir.join("tree.json"),
            bindAddress: default_bind_address(),
            logLevel: default_log_level(),
        }
    }

    pub fn tracingLevel(&self) -> tracing::Level {
        self.logLevel.parse().unwrap_or(tracing::Level::INFO)
    }
}
