use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SimulationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Worker threads in the pool that runs the node tasks.
    pub workers: usize,
    /// Round cap. `None` means one more round than there are nodes.
    pub max_rounds: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_rounds: None,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimulationConfig = serde_json::from_str(&content)
            .map_err(|e| SimulationError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SimulationError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.workers == 0 {
            return Err(SimulationError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(SimulationError::Config(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Round cap for a network of `nodes` nodes.
    pub fn round_limit(&self, nodes: usize) -> usize {
        self.max_rounds.unwrap_or(nodes + 1)
    }
}
