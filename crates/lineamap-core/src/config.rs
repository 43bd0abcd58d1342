//! Configuration schema (lineamap.toml)

use serde::{Deserialize, Serialize};

/// Which side of a focus node a subgraph query expands into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ancestors only
    Upstream,

    /// Descendants only
    Downstream,

    /// Ancestors and descendants
    #[default]
    Both,
}

impl Direction {
    pub fn includes_upstream(&self) -> bool {
        matches!(self, Self::Upstream | Self::Both)
    }

    pub fn includes_downstream(&self) -> bool {
        matches!(self, Self::Downstream | Self::Both)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Defaults for focus/filter queries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Direction to expand from focus nodes
    #[serde(default)]
    pub direction: Direction,

    /// Maximum number of hops (unlimited when absent)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Only keep focus nodes and their immediate neighbours
    #[serde(default)]
    pub direct_only: bool,
}

/// Order in which imputed placeholder nodes are appended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeOrder {
    /// Order in which the missing ids are first referenced
    #[default]
    Discovery,

    /// Lexicographic by id
    Sorted,
}

/// Settings for missing-reference imputation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImputationConfig {
    #[serde(default)]
    pub order: ImputeOrder,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineageConfig {
    /// Traversal defaults
    #[serde(default)]
    pub traversal: TraversalConfig,

    /// Imputation settings
    #[serde(default)]
    pub imputation: ImputationConfig,
}

impl LineageConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
