//! Engine configuration
//!
//! Configuration loaded from the .diff-review.toml file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// View type used until the reviewer switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTypePreference {
    #[default]
    Inline,
    SideBySide,
}

/// Engine configuration loaded from .diff-review.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Only the unified projection is maintained; context expansion always
    /// lands there regardless of the view type
    #[serde(default = "default_unified_diff_lines")]
    pub unified_diff_lines: bool,

    /// View type on startup
    #[serde(default)]
    pub default_view_type: ViewTypePreference,

    /// Number of files requested per batch
    #[serde(default = "default_batch_page_size")]
    pub batch_page_size: u32,

    /// Whether whitespace-only changes are shown
    #[serde(default = "default_show_whitespace")]
    pub show_whitespace: bool,

    /// Whether the file tree is rendered as a tree (false: flat list)
    #[serde(default = "default_render_tree_list")]
    pub render_tree_list: bool,
}

fn default_unified_diff_lines() -> bool {
    false
}

fn default_batch_page_size() -> u32 {
    20
}

fn default_show_whitespace() -> bool {
    true
}

fn default_render_tree_list() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unified_diff_lines: default_unified_diff_lines(),
            default_view_type: ViewTypePreference::default(),
            batch_page_size: default_batch_page_size(),
            show_whitespace: default_show_whitespace(),
            render_tree_list: default_render_tree_list(),
        }
    }
}

impl EngineConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded engine config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default engine config");
        Self::default()
    }

    /// Load config from an explicit path; unlike [`EngineConfig::load`] a
    /// missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}
