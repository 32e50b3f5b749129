// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Config file persistence — pretty JSON next to the other per-user settings.

use std::path::{Path, PathBuf};

use heftwerk_core::AppConfig;
use heftwerk_core::error::Result;
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";

/// Where the config lives and how to read/write it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at an explicit file path (`--config`).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the per-user config directory.
    pub fn default_location() -> Self {
        Self::at(data_dir::config_dir().join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, or the defaults when the file is missing or unreadable.
    pub fn load(&self) -> AppConfig {
        match self.try_load() {
            Ok(Some(config)) => config,
            Ok(None) => AppConfig::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                AppConfig::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<AppConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        let config: AppConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Persist `config`, creating the parent directory if needed.
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
