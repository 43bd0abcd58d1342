//! Error taxonomy for the lineage core
//!
//! Every error is raised synchronously by the call that detects it.
//! Nothing here is retried or downgraded to a warning.

use crate::model::NodeId;

/// Raised when a `Node` or `Connection` is constructed from invalid fields
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required string field was empty
    #[error("{entity}.{field} must be a non-empty string")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },

    /// A node lists its own id in `select_from`
    #[error("node '{id}' cannot select from itself")]
    SelfReference { id: NodeId },

    /// A categorical value is not present in its registry
    #[error("unknown {kind} '{value}'")]
    UnknownCategory { kind: &'static str, value: String },
}

/// Raised by graph queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The id is not a vertex of the graph (or has no node payload)
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
}

impl GraphError {
    /// The id that triggered the error
    pub fn node_id(&self) -> &str {
        match self {
            Self::NodeNotFound(id) => id,
        }
    }
}
