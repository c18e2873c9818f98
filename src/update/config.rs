//! Update queue configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Which admission policy the scheduler applies to incoming regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicyKind {
    /// Queue every region, duplicates included.
    #[default]
    AlwaysAdmit,
    /// Keep at most one pending entry per chunk column.
    DedupeByColumn,
}

impl AdmissionPolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            AdmissionPolicyKind::AlwaysAdmit => "always_admit",
            AdmissionPolicyKind::DedupeByColumn => "dedupe_by_column",
        }
    }
}

/// Configuration for coalescing and scheduling render updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Horizontal chunk edge length in blocks.
    pub chunk_size: i32,
    /// Lowest block row of a chunk column.
    pub column_min_y: i32,
    /// Highest block row of a chunk column (inclusive).
    pub column_max_y: i32,
    /// Blocks added on every side when a single point changes.
    pub safety_margin: i32,
    /// Admission policy applied by the scheduler.
    pub admission: AdmissionPolicyKind,
    /// Pending-region cap. `None` = unbounded.
    pub max_pending: Option<usize>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            column_min_y: 0,
            column_max_y: 255,
            safety_margin: 1,
            admission: AdmissionPolicyKind::AlwaysAdmit,
            max_pending: None,
        }
    }
}

impl UpdateConfig {
    /// Offset from a column's min corner to its priority anchor (half a chunk).
    pub fn anchor_offset(&self) -> i32 {
        self.chunk_size / 2
    }

    /// Reject settings the coalescer cannot align with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size <= 0 {
            return Err(Error::Config(format!(
                "chunk_size must be positive, got {}",
                self.chunk_size
            )));
        }
        if self.column_min_y > self.column_max_y {
            return Err(Error::Config(format!(
                "column_min_y ({}) is above column_max_y ({})",
                self.column_min_y, self.column_max_y
            )));
        }
        if self.safety_margin < 0 {
            return Err(Error::Config(format!(
                "safety_margin must not be negative, got {}",
                self.safety_margin
            )));
        }
        if self.max_pending == Some(0) {
            return Err(Error::Config("max_pending must be at least 1".into()));
        }
        Ok(())
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync). Missing fields take their defaults.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: UpdateConfig = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }
}
