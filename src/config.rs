//! Configuration management for MarketChain

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Exchanges a block holds before it is sealed and a new one opened.
    #[serde(default = "default_block_capacity")]
    pub block_capacity: usize,
    /// Validators sampled per transfer; all of them must approve.
    #[serde(default = "default_quorum_size")]
    pub quorum_size: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            block_capacity: default_block_capacity(),
            quorum_size: default_quorum_size(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file is absent or empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let config_str = fs::read_to_string(path).unwrap_or_default();
        let config: MarketConfig = if config_str.is_empty() {
            MarketConfig::default()
        } else {
            toml::from_str(&config_str)
                .map_err(|e| ChainError::ConfigError(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.block_capacity == 0 {
            return Err(ChainError::ConfigError(
                "block_capacity must be a positive integer".to_string(),
            ));
        }
        if self.quorum_size == 0 {
            return Err(ChainError::ConfigError(
                "quorum_size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_block_capacity() -> usize {
    4
}

fn default_quorum_size() -> usize {
    3
}
