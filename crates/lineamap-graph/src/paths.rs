//! Path enumeration between two vertices

use lineamap_core::{GraphError, NodeId};

use crate::graph::LineageGraph;

impl LineageGraph {
    /// Every simple path from `from_id` to `to_id`, endpoints included.
    ///
    /// Follows the same edges as downstream traversal (a `connected_to`
    /// edge can be walked either way). With `max_depth`, paths longer than
    /// that many edges are dropped. A vertex is not a path to itself.
    pub fn get_all_paths(
        &self,
        from_id: &str,
        to_id: &str,
        max_depth: Option<usize>,
    ) -> Result<Vec<Vec<NodeId>>, GraphError> {
        self.ensure_vertex(from_id)?;
        self.ensure_vertex(to_id)?;

        let mut paths = Vec::new();
        if from_id == to_id {
            return Ok(paths);
        }

        let mut path: Vec<&str> = vec![from_id];
        let mut cursors = vec![0usize];

        while let Some(&cursor) = cursors.last() {
            let top = cursors.len() - 1;
            let current = path[top];

            let next = self.successors(current).get(cursor);
            let Some(next) = next else {
                cursors.pop();
                path.pop();
                continue;
            };
            cursors[top] += 1;

            // path.len() is the edge count once `next` is appended
            if max_depth.is_some_and(|limit| path.len() > limit) {
                continue;
            }

            if next == to_id {
                let mut found: Vec<NodeId> = path.iter().map(|id| id.to_string()).collect();
                found.push(next.clone());
                paths.push(found);
            } else if !path.contains(&next.as_str()) {
                path.push(next.as_str());
                cursors.push(0);
            }
        }

        tracing::debug!(from_id, to_id, paths = paths.len(), "path enumeration finished");
        Ok(paths)
    }

    /// Whether `to_id` is reachable from `from_id`
    pub fn has_path(&self, from_id: &str, to_id: &str) -> Result<bool, GraphError> {
        self.ensure_vertex(to_id)?;
        Ok(self.get_downstream_nodes(from_id, None)?.contains(to_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineamap_core::{Connection, Node};
    use pretty_assertions::assert_eq;

    fn graph(edges: &[(&str, &str)]) -> LineageGraph {
        let mut ids: Vec<&str> = edges.iter().flat_map(|(a, b)| [*a, *b]).collect();
        ids.dedup();
        let nodes = ids.into_iter().map(|id| Node::new(id, id).unwrap());
        let connections = edges
            .iter()
            .map(|(from, to)| Connection::select_from(*from, *to).unwrap());
        LineageGraph::build(nodes, connections)
    }

    fn path(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn diamond_has_two_paths() {
        let g = graph(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        let mut paths = g.get_all_paths("a", "d", None).unwrap();
        paths.sort();
        assert_eq!(paths, vec![path(&["a", "b", "d"]), path(&["a", "c", "d"])]);
    }

    #[test]
    fn direct_edge_is_single_path() {
        let g = graph(&[("a", "c"), ("c", "d")]);
        assert_eq!(g.get_all_paths("a", "c", None).unwrap(), vec![path(&["a", "c"])]);
    }

    #[test]
    fn wrong_direction_has_no_path() {
        let g = graph(&[("a", "b"), ("b", "c")]);
        assert!(g.get_all_paths("c", "a", None).unwrap().is_empty());
        assert!(!g.has_path("c", "a").unwrap());
        assert!(g.has_path("a", "c").unwrap());
    }

    #[test]
    fn depth_limit_drops_long_paths() {
        // a -> d directly, and a -> b -> c -> d
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);

        let mut all = g.get_all_paths("a", "d", None).unwrap();
        all.sort();
        assert_eq!(all, vec![path(&["a", "b", "c", "d"]), path(&["a", "d"])]);

        assert_eq!(g.get_all_paths("a", "d", Some(2)).unwrap(), vec![path(&["a", "d"])]);
        assert!(g.get_all_paths("a", "d", Some(0)).unwrap().is_empty());
    }

    #[test]
    fn cycles_do_not_loop_forever() {
        let g = graph(&[("a", "b"), ("b", "a"), ("b", "c"), ("c", "c")]);
        assert_eq!(g.get_all_paths("a", "c", None).unwrap(), vec![path(&["a", "b", "c"])]);
    }

    #[test]
    fn unknown_endpoint_fails() {
        let g = graph(&[("a", "b")]);
        assert_eq!(
            g.get_all_paths("a", "zzz", None),
            Err(GraphError::NodeNotFound("zzz".to_string()))
        );
        assert_eq!(
            g.get_all_paths("zzz", "a", None),
            Err(GraphError::NodeNotFound("zzz".to_string()))
        );
    }

    #[test]
    fn same_endpoint_has_no_path() {
        let g = graph(&[("a", "b"), ("b", "a")]);
        assert!(g.get_all_paths("a", "a", None).unwrap().is_empty());
    }
}
