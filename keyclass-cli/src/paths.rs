use anyhow::{anyhow, Result};
use keyclass_core::KeyclassConfig;
use std::path::{Path, PathBuf};

/// Default storage directory for uploaded files and records
pub fn default_storage_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let base = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
        Ok(base.join("keyclass"))
    }

    #[cfg(not(windows))]
    {
        // ~/.local/share/keyclass on macOS too
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(home.join(".local").join("share").join("keyclass"))
    }
}

/// `--storage-dir` beats `storage.root_dir`, which beats the default.
pub fn resolve_storage_dir(flag: Option<&Path>, config: &KeyclassConfig) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = &config.storage.root_dir {
        return Ok(dir.clone());
    }
    default_storage_dir()
}
