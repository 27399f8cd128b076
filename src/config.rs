//! Configuration file handling for the enrollment system.
//!
//! A small JSON document naming where the text-file store lives, the
//! per-student credit cap and, optionally, an SQLite audit log.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::DEFAULT_MAX_CREDITS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    /// Directory holding courses.txt, registered.txt, waitlist.txt, ...
    pub data_dir: PathBuf,

    /// Per-student academic unit cap (`null` disables it)
    pub max_credits: Option<u32>,

    /// SQLite file for the enrollment audit log
    pub audit_db: Option<PathBuf>,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        EnrollmentConfig {
            data_dir: PathBuf::from("db"),
            max_credits: Some(DEFAULT_MAX_CREDITS),
            audit_db: None,
        }
    }
}

impl EnrollmentConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file; missing keys take their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("Data directory must be specified");
        }

        if self.max_credits == Some(0) {
            anyhow::bail!("Credit cap must be greater than zero (use null to disable it)");
        }

        Ok(())
    }
}
