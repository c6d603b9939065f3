//! Config Command
//!
//! Inspect treedoc configuration.
//!
//! Usage:
//!   treedoc config show [ROOT] [-f json]
//!   treedoc config path [ROOT]

use std::path::Path;

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the effective configuration for a root (merged from all sources)
pub fn show(root: &Path, explicit: Option<&Path>, format: &str) -> Result<()> {
    ConfigLoader::show_config(root, explicit, format == "json")
}

/// Show configuration file paths for a root
pub fn path(root: &Path) -> Result<()> {
    ConfigLoader::show_path(root);
    Ok(())
}
