//! Lineage entities: nodes and connections
//!
//! Entities are immutable value objects. Validation happens once, at
//! construction (including deserialization), and every accessor afterwards
//! can rely on the invariants below:
//! - `id`, `label`, `from_id`, `to_id` are non-empty
//! - a node never lists its own id in `select_from`
//! - `select_from` holds no duplicates and keeps first-seen order

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::ValidationError;

/// Node identifier (possibly schema-qualified, e.g. `"dwh.orders"`)
pub type NodeId = String;

/// Kind of data object a node stands for
///
/// Drives the shape a renderer picks; graph semantics never look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Table,
    View,
    ExternalSource,
    ExternalResourcelink,
    ManualSource,
    Unknown,
}

impl DataType {
    /// Registry of every accepted data type
    pub const ALL: &'static [DataType] = &[
        Self::Table,
        Self::View,
        Self::ExternalSource,
        Self::ExternalResourcelink,
        Self::ManualSource,
        Self::Unknown,
    ];

    /// Stable wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::ExternalSource => "external-source",
            Self::ExternalResourcelink => "external-resourcelink",
            Self::ManualSource => "manual-source",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCategory {
                kind: "data_type",
                value: s.to_string(),
            })
    }
}

/// Layer of the warehouse architecture a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLevel {
    Source,
    Staging,
    Base,
    Dimension,
    Fact,
    Export,
    Unknown,
}

impl DataLevel {
    /// Registry of every accepted data level
    pub const ALL: &'static [DataLevel] = &[
        Self::Source,
        Self::Staging,
        Self::Base,
        Self::Dimension,
        Self::Fact,
        Self::Export,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Staging => "staging",
            Self::Base => "base",
            Self::Dimension => "dimension",
            Self::Fact => "fact",
            Self::Export => "export",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DataLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCategory {
                kind: "data_level",
                value: s.to_string(),
            })
    }
}

/// Edge semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// Directed data flow: `from_id` feeds `to_id`
    #[default]
    SelectFrom,

    /// Undirected relationship between two nodes
    ConnectedTo,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectFrom => "select_from",
            Self::ConnectedTo => "connected_to",
        }
    }

    /// Whether the edge carries data-flow direction
    pub fn is_directed(&self) -> bool {
        matches!(self, Self::SelectFrom)
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select_from" => Ok(Self::SelectFrom),
            "connected_to" => Ok(Self::ConnectedTo),
            other => Err(ValidationError::UnknownCategory {
                kind: "connection_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Unvalidated node fields, as produced by parsers
///
/// Doubles as the builder for [`Node`] and as its serde representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,

    pub label: String,

    #[serde(default)]
    pub data_type: Option<DataType>,

    #[serde(default)]
    pub data_level: Option<DataLevel>,

    #[serde(default)]
    pub select_from: Vec<NodeId>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type: None,
            data_level: None,
            select_from: Vec::new(),
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_data_level(mut self, data_level: DataLevel) -> Self {
        self.data_level = Some(data_level);
        self
    }

    pub fn with_select_from<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_from = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and freeze into a [`Node`]
    pub fn build(self) -> Result<Node, ValidationError> {
        Node::try_from(self)
    }
}

/// A data object in the lineage (table, view, external source, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NodeSpec", into = "NodeSpec")]
pub struct Node {
    id: NodeId,
    label: String,
    data_type: Option<DataType>,
    data_level: Option<DataLevel>,
    select_from: Vec<NodeId>,
}

impl Node {
    /// Node with only an id and label
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Result<Self, ValidationError> {
        NodeSpec::new(id, label).build()
    }

    /// Start building a node with optional fields
    pub fn builder(id: impl Into<String>, label: impl Into<String>) -> NodeSpec {
        NodeSpec::new(id, label)
    }

    /// Stand-in for an id that is referenced but never defined.
    ///
    /// Label mirrors the id, categories stay unset, no upstream references.
    pub fn placeholder(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        NodeSpec::new(id.clone(), id).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn data_level(&self) -> Option<DataLevel> {
        self.data_level
    }

    /// Upstream dependencies, in declaration order
    pub fn select_from(&self) -> &[NodeId] {
        &self.select_from
    }

    /// The inline `select_from` entries expressed as `source -> self` connections
    pub fn inline_connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.select_from.iter().map(move |source| Connection {
            from_id: source.clone(),
            to_id: self.id.clone(),
            connection_type: ConnectionType::SelectFrom,
        })
    }

    /// One [`Node::placeholder`] per `select_from` entry, in declaration order.
    ///
    /// Entries were validated when this node was built, so every placeholder
    /// is valid without another check.
    pub fn upstream_placeholders(&self) -> impl Iterator<Item = Node> + '_ {
        self.select_from.iter().map(|source| Node {
            id: source.clone(),
            label: source.clone(),
            data_type: None,
            data_level: None,
            select_from: Vec::new(),
        })
    }
}

impl TryFrom<NodeSpec> for Node {
    type Error = ValidationError;

    fn try_from(spec: NodeSpec) -> Result<Self, Self::Error> {
        if spec.id.is_empty() {
            return Err(ValidationError::EmptyField { entity: "node", field: "id" });
        }

        if spec.label.is_empty() {
            return Err(ValidationError::EmptyField { entity: "node", field: "label" });
        }

        let mut seen = HashSet::new();
        let mut select_from = Vec::with_capacity(spec.select_from.len());

        for source in spec.select_from {
            if source.is_empty() {
                return Err(ValidationError::EmptyField { entity: "node", field: "select_from" });
            }
            if source == spec.id {
                return Err(ValidationError::SelfReference { id: spec.id });
            }
            if seen.insert(source.clone()) {
                select_from.push(source);
            }
        }

        Ok(Self {
            id: spec.id,
            label: spec.label,
            data_type: spec.data_type,
            data_level: spec.data_level,
            select_from,
        })
    }
}

impl From<Node> for NodeSpec {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            label: node.label,
            data_type: node.data_type,
            data_level: node.data_level,
            select_from: node.select_from,
        }
    }
}

/// Unvalidated connection fields, also the serde representation of [`Connection`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub from_id: String,

    pub to_id: String,

    #[serde(default)]
    pub connection_type: ConnectionType,
}

/// An edge between two node ids
///
/// Referenced ids are not checked for existence here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ConnectionSpec", into = "ConnectionSpec")]
pub struct Connection {
    from_id: NodeId,
    to_id: NodeId,
    connection_type: ConnectionType,
}

impl Connection {
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Result<Self, ValidationError> {
        Self::try_from(ConnectionSpec {
            from_id: from_id.into(),
            to_id: to_id.into(),
            connection_type,
        })
    }

    /// Directed data-flow edge `from_id -> to_id`
    pub fn select_from(from_id: impl Into<String>, to_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(from_id, to_id, ConnectionType::SelectFrom)
    }

    /// Undirected relationship edge
    pub fn connected_to(from_id: impl Into<String>, to_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(from_id, to_id, ConnectionType::ConnectedTo)
    }

    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }
}

impl TryFrom<ConnectionSpec> for Connection {
    type Error = ValidationError;

    fn try_from(spec: ConnectionSpec) -> Result<Self, Self::Error> {
        if spec.from_id.is_empty() {
            return Err(ValidationError::EmptyField { entity: "connection", field: "from_id" });
        }

        if spec.to_id.is_empty() {
            return Err(ValidationError::EmptyField { entity: "connection", field: "to_id" });
        }

        Ok(Self {
            from_id: spec.from_id,
            to_id: spec.to_id,
            connection_type: spec.connection_type,
        })
    }
}

impl From<Connection> for ConnectionSpec {
    fn from(connection: Connection) -> Self {
        Self {
            from_id: connection.from_id,
            to_id: connection.to_id,
            connection_type: connection.connection_type,
        }
    }
}
