use crate::core::chain::CUT_OFF_AGE;
use crate::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for the block tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Retention horizon in blocks: a new block must attach at a height
    /// strictly above `canonical height - cut_off_age`, and branches that
    /// fall entirely below that boundary are pruned.
    pub cut_off_age: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            cut_off_age: CUT_OFF_AGE,
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cut_off_age == 0 {
            return Err(ChainError::Config(
                "cut_off_age must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ChainConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }
}
