//! Injected toolkit configuration.
//!
//! Consumers receive a config value explicitly; nothing here runs at import
//! time or mutates process-global state.

use std::fs;
use std::path::PathBuf;

use log::debug;

/// Toolkit-wide settings shared by reporting flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecToolkitConfig {
    /// Working directory for generated report files.
    pub dir_workspace: PathBuf,
    /// Collection names excluded from reporting.
    pub l_excluded_collections: Vec<String>,
}

impl Default for SpecToolkitConfig {
    fn default() -> Self {
        let dir_home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            dir_workspace: dir_home.join("temp"),
            l_excluded_collections: Vec::new(),
        }
    }
}

impl SpecToolkitConfig {
    /// True when `collection` is on the exclusion list (case-insensitive).
    pub fn is_excluded(&self, collection: &str) -> bool {
        self.l_excluded_collections
            .iter()
            .any(|c_name| c_name.eq_ignore_ascii_case(collection))
    }
}

/// Ensure the configured workspace directory exists and return its path.
pub fn init_workspace(config: &SpecToolkitConfig) -> Result<PathBuf, String> {
    fs::create_dir_all(&config.dir_workspace).map_err(|err| {
        format!(
            "Failed to create workspace directory {:?}: {err}",
            config.dir_workspace
        )
    })?;
    debug!("Workspace ready at {:?}.", config.dir_workspace);
    Ok(config.dir_workspace.clone())
}
