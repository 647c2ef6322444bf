use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use treebank_common::FileSystem;
use treebank_editor::{EditorConfig, DEFAULT_CONFIG_NAME};

/// Config named on the command line, else the one in `cwd`, else defaults
pub fn load_config(fs: &dyn FileSystem, explicit: Option<&Path>, cwd: &Path) -> Result<EditorConfig> {
    match explicit {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            EditorConfig::load_file(fs, path)
                .with_context(|| format!("Cannot load config {}", path.display()))
        }
        None => {
            debug!(dir = %cwd.display(), name = DEFAULT_CONFIG_NAME, "looking for config");
            Ok(EditorConfig::load(fs, cwd)?)
        }
    }
}
