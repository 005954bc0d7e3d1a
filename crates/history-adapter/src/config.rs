//! Adapter configuration: history limit, JSON loading, validation.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// Configuration captured once when a `HistoryAdapter` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryAdapterConfig {
    /// Maximum number of entries kept in `past`. `None` = unbounded.
    pub limit: Option<usize>,
}

impl HistoryAdapterConfig {
    /// Returns a copy of this config bounded to `limit` past entries.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parses a config from JSON, e.g. `{"limit": 50}`.
    ///
    /// Missing fields fall back to their defaults. The parsed config is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the limit is zero.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse history adapter config")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that could never record history.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::InvalidLimit` when `limit` is `Some(0)`.
    pub fn validate(&self) -> Result<(), HistoryError> {
        match self.limit {
            Some(0) => Err(HistoryError::InvalidLimit(0)),
            _ => Ok(()),
        }
    }
}
