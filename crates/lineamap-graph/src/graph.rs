//! Lineage graph construction and traversal
//!
//! The graph is a pure projection of a node list and a connection list:
//! every node id becomes a vertex, every explicit connection and every
//! inline `select_from` entry becomes an edge. Nothing is updated
//! incrementally; build a new graph when the entities change.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use lineamap_core::{Connection, Direction, GraphError, Node, NodeId, TraversalConfig};
use serde::Serialize;

/// Induced sub-collection of a graph
///
/// Order follows graph insertion order; callers that need a rendering order
/// must sort explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl Subgraph {
    /// Ids of the selected nodes, sorted
    pub fn node_ids(&self) -> BTreeSet<NodeId> {
        self.nodes.iter().map(|node| node.id().to_string()).collect()
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Connection>) {
        (self.nodes, self.connections)
    }
}

/// Directed lineage graph with forward and reverse adjacency
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    /// Node payloads by id
    nodes: HashMap<NodeId, Node>,

    /// Every vertex in insertion order, including payload-less edge endpoints
    vertices: Vec<NodeId>,

    /// Position of each vertex in `vertices`
    index: HashMap<NodeId, usize>,

    /// Deduplicated edges in insertion order
    connections: Vec<Connection>,

    /// vertex -> vertices it is reachable from in one hop
    parents: HashMap<NodeId, Vec<NodeId>>,

    /// vertex -> vertices reachable from it in one hop
    children: HashMap<NodeId, Vec<NodeId>>,

    /// Successors along each edge's stored `from -> to` orientation
    oriented_children: HashMap<NodeId, Vec<NodeId>>,
}

impl LineageGraph {
    /// Build a graph from nodes and explicit connections.
    ///
    /// A later node with an already-seen id replaces the earlier payload.
    /// Edges may reference ids that have no node; those ids become
    /// traversable vertices without a payload. Two edges with the same
    /// `(from_id, to_id)` collapse into the later one.
    pub fn build<N, C>(nodes: N, connections: C) -> Self
    where
        N: IntoIterator<Item = Node>,
        C: IntoIterator<Item = Connection>,
    {
        let mut graph = Self::default();

        for node in nodes {
            let id = node.id().to_string();
            graph.add_vertex(&id);
            if graph.nodes.insert(id.clone(), node).is_some() {
                tracing::debug!(node_id = %id, "duplicate node id, keeping last definition");
            }
        }

        // Inline edges come from the surviving payloads; explicit connections
        // are inserted afterwards so they win over an inline edge on the same pair.
        let inline: Vec<Connection> = graph
            .vertices
            .iter()
            .filter_map(|id| graph.nodes.get(id))
            .flat_map(|node| node.inline_connections())
            .collect();

        let mut edge_index: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for connection in inline.into_iter().chain(connections) {
            graph.add_vertex(connection.from_id());
            graph.add_vertex(connection.to_id());

            let key = (connection.from_id().to_string(), connection.to_id().to_string());
            match edge_index.get(&key) {
                Some(&position) => graph.connections[position] = connection,
                None => {
                    edge_index.insert(key, graph.connections.len());
                    graph.connections.push(connection);
                }
            }
        }

        graph.index_edges();

        tracing::debug!(
            vertices = graph.vertices.len(),
            payloads = graph.nodes.len(),
            edges = graph.connections.len(),
            "built lineage graph"
        );

        let dangling = graph.vertices.len() - graph.nodes.len();
        if dangling > 0 {
            tracing::debug!(dangling, "edges reference ids without a node definition");
        }

        graph
    }

    fn add_vertex(&mut self, id: &str) {
        if !self.index.contains_key(id) {
            self.index.insert(id.to_string(), self.vertices.len());
            self.vertices.push(id.to_string());
        }
    }

    fn index_edges(&mut self) {
        for connection in &self.connections {
            let from = connection.from_id();
            let to = connection.to_id();

            push_unique(self.children.entry(from.to_string()).or_default(), to);
            push_unique(self.parents.entry(to.to_string()).or_default(), from);
            push_unique(self.oriented_children.entry(from.to_string()).or_default(), to);

            if !connection.connection_type().is_directed() {
                push_unique(self.children.entry(to.to_string()).or_default(), from);
                push_unique(self.parents.entry(from.to_string()).or_default(), to);
            }
        }
    }

    /// Check if an id is a vertex (with or without payload)
    pub fn has_node(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// Look up the node payload for an id
    pub fn get_node(&self, node_id: &str) -> Result<&Node, GraphError> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))
    }

    /// Node payloads in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.vertices.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Deduplicated edges, inline `select_from` edges included
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// All vertex ids in insertion order
    pub fn vertex_ids(&self) -> &[NodeId] {
        &self.vertices
    }

    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn ensure_vertex(&self, node_id: &str) -> Result<(), GraphError> {
        if self.has_node(node_id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(node_id.to_string()))
        }
    }

    pub(crate) fn vertex_position(&self, node_id: &str) -> Option<usize> {
        self.index.get(node_id).copied()
    }

    pub(crate) fn successors(&self, node_id: &str) -> &[NodeId] {
        self.children.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Successors with every edge taken once, as stored; `connected_to` included
    pub(crate) fn oriented_successors(&self, node_id: &str) -> &[NodeId] {
        self.oriented_children.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    fn adjacency(&self, flow: Flow) -> &HashMap<NodeId, Vec<NodeId>> {
        match flow {
            Flow::Upstream => &self.parents,
            Flow::Downstream => &self.children,
        }
    }

    /// Get all upstream node ids (ancestors).
    ///
    /// `max_depth` bounds the number of hops; `None` follows the transitive
    /// closure. The queried node is part of the result only when a walk
    /// leaves it and comes back, as on a self-loop or a cycle.
    pub fn get_upstream_nodes(
        &self,
        node_id: &str,
        max_depth: Option<usize>,
    ) -> Result<BTreeSet<NodeId>, GraphError> {
        self.ensure_vertex(node_id)?;
        tracing::debug!(node_id, ?max_depth, "upstream query");
        Ok(self.reachable(node_id, Flow::Upstream, max_depth))
    }

    /// Get all downstream node ids (descendants)
    pub fn get_downstream_nodes(
        &self,
        node_id: &str,
        max_depth: Option<usize>,
    ) -> Result<BTreeSet<NodeId>, GraphError> {
        self.ensure_vertex(node_id)?;
        tracing::debug!(node_id, ?max_depth, "downstream query");
        Ok(self.reachable(node_id, Flow::Downstream, max_depth))
    }

    /// Immediate predecessors and successors of a node, itself included on a self-loop
    pub fn get_direct_connections(&self, node_id: &str) -> Result<BTreeSet<NodeId>, GraphError> {
        self.ensure_vertex(node_id)?;

        let upstream = self.parents.get(node_id).into_iter().flatten();
        let downstream = self.children.get(node_id).into_iter().flatten();

        Ok(upstream
            .chain(downstream)
            .cloned()
            .collect())
    }

    /// Focus nodes plus their upstream and/or downstream sets
    pub fn get_subgraph<I>(
        &self,
        focus_ids: I,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Subgraph, GraphError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut selected: HashSet<NodeId> = HashSet::new();

        for focus in focus_ids {
            let focus = focus.as_ref();
            self.ensure_vertex(focus)?;
            selected.insert(focus.to_string());

            if direction.includes_upstream() {
                selected.extend(self.reachable(focus, Flow::Upstream, max_depth));
            }
            if direction.includes_downstream() {
                selected.extend(self.reachable(focus, Flow::Downstream, max_depth));
            }
        }

        tracing::debug!(%direction, ?max_depth, selected = selected.len(), "subgraph query");
        Ok(self.induced(&selected))
    }

    /// Focus nodes plus their immediate neighbours in both directions
    pub fn get_direct_subgraph<I>(&self, focus_ids: I) -> Result<Subgraph, GraphError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut selected: HashSet<NodeId> = HashSet::new();

        for focus in focus_ids {
            let focus = focus.as_ref();
            selected.extend(self.get_direct_connections(focus)?);
            selected.insert(focus.to_string());
        }

        Ok(self.induced(&selected))
    }

    /// Apply configured traversal defaults to a focus set
    pub fn filter<I>(&self, focus_ids: I, config: &TraversalConfig) -> Result<Subgraph, GraphError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if config.direct_only {
            self.get_direct_subgraph(focus_ids)
        } else {
            self.get_subgraph(focus_ids, config.direction, config.max_depth)
        }
    }

    /// Every payload whose id is selected and every edge with both endpoints selected
    fn induced(&self, selected: &HashSet<NodeId>) -> Subgraph {
        let nodes = self
            .vertices
            .iter()
            .filter(|id| selected.contains(id.as_str()))
            .filter_map(|id| self.nodes.get(id))
            .cloned()
            .collect();

        let connections = self
            .connections
            .iter()
            .filter(|c| selected.contains(c.from_id()) && selected.contains(c.to_id()))
            .cloned()
            .collect();

        Subgraph { nodes, connections }
    }
}

fn push_unique(list: &mut Vec<NodeId>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}

/// Which way a traversal walks the edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Upstream,
    Downstream,
}

impl Flow {
    /// Whether one hop over `connection` leads from `from` to `to`
    fn steps(self, connection: &Connection, from: &str, to: &str) -> bool {
        let (tail, head) = match self {
            Flow::Downstream => (from, to),
            Flow::Upstream => (to, from),
        };
        let along = connection.from_id() == tail && connection.to_id() == head;
        let against = !connection.connection_type().is_directed()
            && connection.from_id() == head
            && connection.to_id() == tail;
        along || against
    }
}

impl LineageGraph {
    /// Vertices within `max_depth` hops of `start`.
    ///
    /// `start` is included when some edge leads back into it. Crossing a
    /// `connected_to` edge and immediately returning over that same edge
    /// does not count.
    fn reachable(&self, start: &str, flow: Flow, max_depth: Option<usize>) -> BTreeSet<NodeId> {
        let adjacency = self.adjacency(flow);
        let hops = hop_counts(adjacency, start, max_depth, None);

        let closes = self.connections.iter().enumerate().any(|(position, closing)| {
            let other = if closing.to_id() == start {
                closing.from_id()
            } else if closing.from_id() == start {
                closing.to_id()
            } else {
                return false;
            };
            if !flow.steps(closing, other, start) {
                return false;
            }

            // the closing hop adds one edge to the walk
            let fits = |distance: usize| max_depth.map_or(true, |limit| distance < limit);
            if other == start {
                return fits(0);
            }

            let bounce = flow.steps(closing, start, other)
                && !self
                    .connections
                    .iter()
                    .enumerate()
                    .any(|(i, c)| i != position && flow.steps(c, start, other));

            if bounce {
                hop_counts(adjacency, start, max_depth, Some(other))
                    .get(other)
                    .is_some_and(|&distance| fits(distance))
            } else {
                hops.get(other).is_some_and(|&distance| fits(distance))
            }
        });

        let mut result: BTreeSet<NodeId> = hops.into_keys().map(str::to_string).collect();
        if closes {
            result.insert(start.to_string());
        }
        result
    }
}

/// Breadth-first hop counts from `start`, stopping after `max_depth` layers.
///
/// `start` is not part of the map. `skip` is never entered directly from `start`.
fn hop_counts<'a>(
    adjacency: &'a HashMap<NodeId, Vec<NodeId>>,
    start: &'a str,
    max_depth: Option<usize>,
    skip: Option<&str>,
) -> HashMap<&'a str, usize> {
    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(start, 0)]);
    let mut hops = HashMap::new();

    while let Some((current, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|limit| depth >= limit) {
            continue;
        }

        let Some(neighbors) = adjacency.get(current) else {
            continue;
        };

        for neighbor in neighbors {
            if current == start && skip == Some(neighbor.as_str()) {
                continue;
            }
            if visited.insert(neighbor.as_str()) {
                hops.insert(neighbor.as_str(), depth + 1);
                queue.push_back((neighbor.as_str(), depth + 1));
            }
        }
    }

    hops
}
