//! Lineamap Core
//!
//! Entity model, error taxonomy and configuration shared by the
//! lineage graph engine and its collaborators (parsers, renderers, writers).

pub mod model;
pub mod error;
pub mod config;

pub use model::{Node, NodeSpec, NodeId, Connection, ConnectionSpec, ConnectionType, DataType, DataLevel};
pub use error::{ValidationError, GraphError};
pub use config::{LineageConfig, TraversalConfig, ImputationConfig, ImputeOrder, Direction, ConfigError};
