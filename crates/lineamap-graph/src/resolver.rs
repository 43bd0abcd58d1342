//! Missing-reference detection and placeholder imputation
//!
//! Only inline `select_from` references are scanned. An explicit
//! `Connection` pointing at an undefined id is not reported here; such
//! endpoints show up in the graph as payload-less vertices instead.

use std::collections::{BTreeSet, HashSet};

use lineamap_core::{ImputationConfig, ImputeOrder, Node, NodeId};
use serde::Serialize;

/// Summary of one imputation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImputationStats {
    /// Number of placeholder nodes appended
    pub nodes_added: usize,

    /// Ids of the appended placeholders, in append order
    pub missing_node_ids: Vec<NodeId>,
}

impl std::fmt::Display for ImputationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Imputation Summary:\n  - Missing nodes added: {}", self.nodes_added)?;
        if !self.missing_node_ids.is_empty() {
            write!(f, "\n  - Added node IDs:")?;
            for node_id in &self.missing_node_ids {
                write!(f, "\n    * {}", node_id)?;
            }
        }
        Ok(())
    }
}

/// Synthesizes placeholder nodes for ids that are referenced but never defined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    order: ImputeOrder,
}

impl Resolver {
    pub fn new(order: ImputeOrder) -> Self {
        Self { order }
    }

    pub fn from_config(config: &ImputationConfig) -> Self {
        Self::new(config.order)
    }

    /// Missing ids in the configured append order, without duplicates
    pub fn missing_ids(&self, nodes: &[Node]) -> Vec<NodeId> {
        self.placeholders(nodes)
            .iter()
            .map(|placeholder| placeholder.id().to_string())
            .collect()
    }

    /// One placeholder per missing id, in the configured append order
    fn placeholders(&self, nodes: &[Node]) -> Vec<Node> {
        let defined: HashSet<&str> = nodes.iter().map(Node::id).collect();
        let mut seen: HashSet<NodeId> = HashSet::new();

        let mut missing: Vec<Node> = nodes
            .iter()
            .flat_map(|node| node.upstream_placeholders())
            .filter(|placeholder| {
                !defined.contains(placeholder.id()) && seen.insert(placeholder.id().to_string())
            })
            .collect();

        if self.order == ImputeOrder::Sorted {
            missing.sort_by(|a, b| a.id().cmp(b.id()));
        }

        missing
    }

    /// Append a placeholder for every missing id.
    ///
    /// Existing nodes are returned untouched and in their original order.
    /// Running this on its own output adds nothing.
    pub fn impute(&self, nodes: Vec<Node>) -> Vec<Node> {
        self.impute_with_stats(nodes).0
    }

    /// Same as [`Resolver::impute`], also reporting what was added
    pub fn impute_with_stats(&self, mut nodes: Vec<Node>) -> (Vec<Node>, ImputationStats) {
        let missing = self.placeholders(&nodes);
        let mut stats = ImputationStats {
            nodes_added: missing.len(),
            missing_node_ids: Vec::with_capacity(missing.len()),
        };

        for node in missing {
            stats.missing_node_ids.push(node.id().to_string());
            nodes.push(node);
        }

        if stats.nodes_added > 0 {
            tracing::info!(
                nodes_added = stats.nodes_added,
                ids = ?stats.missing_node_ids,
                "imputed placeholder nodes"
            );
        }

        (nodes, stats)
    }
}

/// Every id referenced through `select_from` that no node defines
pub fn find_missing(nodes: &[Node]) -> BTreeSet<NodeId> {
    Resolver::default().missing_ids(nodes).into_iter().collect()
}

/// Append placeholders for missing ids, in first-discovery order
pub fn impute(nodes: Vec<Node>) -> Vec<Node> {
    Resolver::default().impute(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, select_from: &[&str]) -> Node {
        Node::builder(id, id)
            .with_select_from(select_from.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn find_single_missing_node() {
        let nodes = vec![node("node_a", &["node_b", "node_c"]), node("node_b", &[])];
        assert_eq!(Resolver::default().missing_ids(&nodes), vec!["node_c".to_string()]);
    }

    #[test]
    fn discovery_order_and_deduplication() {
        let nodes = vec![
            node("node_a", &["node_z", "node_y"]),
            node("node_b", &["node_x", "node_z"]),
        ];
        assert_eq!(
            Resolver::default().missing_ids(&nodes),
            vec!["node_z".to_string(), "node_y".to_string(), "node_x".to_string()]
        );
        assert_eq!(
            Resolver::new(ImputeOrder::Sorted).missing_ids(&nodes),
            vec!["node_x".to_string(), "node_y".to_string(), "node_z".to_string()]
        );
    }

    #[test]
    fn nothing_missing() {
        let nodes = vec![node("node_a", &["node_b"]), node("node_b", &[])];
        assert!(find_missing(&nodes).is_empty());
        assert_eq!(impute(nodes.clone()), nodes);
    }

    #[test]
    fn schema_qualified_ids() {
        let nodes = vec![
            node(
                "dwh_sales.sv_customers",
                &["source_system.sometable", "rl_source_thirdparty.anothertable"],
            ),
            node("source_system.sometable", &[]),
        ];
        assert_eq!(
            find_missing(&nodes),
            BTreeSet::from(["rl_source_thirdparty.anothertable".to_string()])
        );
    }

    #[test]
    fn impute_appends_after_originals() {
        let nodes = vec![node("fact_orders", &["stg_orders"]), node("dim_date", &[])];
        let imputed = impute(nodes.clone());

        assert_eq!(imputed.len(), 3);
        assert_eq!(&imputed[..2], &nodes[..]);
        assert_eq!(imputed[2], Node::placeholder("stg_orders").unwrap());
    }

    #[test]
    fn stats_summary() {
        let nodes = vec![node("a", &["b", "c"])];
        let (_, stats) = Resolver::default().impute_with_stats(nodes);

        assert_eq!(stats.nodes_added, 2);
        assert_eq!(
            stats.to_string(),
            "Imputation Summary:\n  - Missing nodes added: 2\n  - Added node IDs:\n    * b\n    * c"
        );

        let (_, empty) = Resolver::default().impute_with_stats(Vec::new());
        assert_eq!(empty.to_string(), "Imputation Summary:\n  - Missing nodes added: 0");
    }

    #[test]
    fn every_missing_reference_gets_a_placeholder() {
        let nodes = vec![node("a", &["x", "b", "y"]), node("b", &["x", "z"])];
        let (imputed, stats) = Resolver::new(ImputeOrder::Sorted).impute_with_stats(nodes);

        assert_eq!(stats.nodes_added, stats.missing_node_ids.len());
        assert_eq!(stats.missing_node_ids, vec!["x", "y", "z"]);
        assert_eq!(
            imputed[2..].to_vec(),
            vec![
                Node::placeholder("x").unwrap(),
                Node::placeholder("y").unwrap(),
                Node::placeholder("z").unwrap(),
            ]
        );
    }

    #[test]
    fn from_config_uses_order() {
        let config = ImputationConfig { order: ImputeOrder::Sorted };
        assert_eq!(Resolver::from_config(&config), Resolver::new(ImputeOrder::Sorted));
    }
}
