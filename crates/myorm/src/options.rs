//! Manager options.
//!
//! Options are plain values passed to a manager at construction. They can also be loaded
//! from TOML:
//!
//! ```toml
//! syntax_check = true
//!
//! [sharding]
//! enabled = true
//! table_count = 16
//! db_count = 4
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{OrmError, OrmResult};

/// Table/database sharding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShardConfig {
    pub enabled: bool,
    /// Number of database shards.
    pub db_count: i64,
    /// Number of table shards.
    pub table_count: i64,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_count: 1,
            table_count: 1,
        }
    }
}

/// Options shared by a manager and the queriers it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Syntax-check raw queries before running them.
    pub syntax_check: bool,
    pub sharding: ShardConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            syntax_check: true,
            sharding: ShardConfig::default(),
        }
    }
}

impl Options {
    /// Options with sharding enabled.
    pub fn sharding(table_count: i64, db_count: i64) -> Self {
        Self {
            syntax_check: true,
            sharding: ShardConfig {
                enabled: true,
                db_count,
                table_count,
            },
        }
    }

    /// Disable (or enable) raw query syntax checking.
    pub fn with_syntax_check(mut self, enabled: bool) -> Self {
        self.syntax_check = enabled;
        self
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read options file {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e: toml::de::Error| {
            OrmError::config(format!("failed to parse options file {}: {e}", path.display()))
        })
    }
}
