//! Common paths for Plume data storage
//!
//! All Plume data is stored under ~/.config/plume/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted app passwords
//! - plume.sqlite - Accounts and saved drafts

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Plume data directory (~/.config/plume/)
///
/// This is consistent across all platforms for simplicity.
pub fn plume_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let plume_dir = home.join(".config").join("plume");
    fs::create_dir_all(&plume_dir).context("Failed to create plume directory")?;
    Ok(plume_dir)
}

/// Get the config file path (~/.config/plume/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(plume_dir()?.join("config.toml"))
}

/// Get the database file path (~/.config/plume/plume.sqlite)
pub fn database_path() -> Result<PathBuf> {
    Ok(plume_dir()?.join("plume.sqlite"))
}

/// Get the credentials file path (~/.config/plume/credentials.enc)
pub fn credentials_path() -> Result<PathBuf> {
    Ok(plume_dir()?.join("credentials.enc"))
}
