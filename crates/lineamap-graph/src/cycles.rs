//! Cycle detection over stored edge orientation
//!
//! Every edge counts once, `from_id -> to_id`. A `connected_to` edge takes
//! part in the direction it was declared, so on its own it never forms a
//! 2-cycle, while a `connected_to` self-loop or back edge does close one.

use std::collections::VecDeque;

use lineamap_core::NodeId;

use crate::graph::LineageGraph;

impl LineageGraph {
    /// Find every simple cycle.
    ///
    /// Each cycle is listed once, starting at its earliest-inserted vertex,
    /// without repeating the start at the end. A self-loop is a one-vertex
    /// cycle. Returns an empty list for a DAG.
    pub fn find_cycles(&self) -> Vec<Vec<NodeId>> {
        let successors = self.oriented_adjacency();
        let components = strongly_connected_components(&successors);
        let mut cycles = Vec::new();

        for start in 0..successors.len() {
            // A vertex can only be on a cycle with members of its own component
            let component = components[start];
            let allowed = |v: usize| v >= start && components[v] == component;
            collect_cycles_from(start, &successors, &allowed, &mut cycles);
        }

        tracing::debug!(cycles = cycles.len(), "cycle search finished");

        cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|v| self.vertex_ids()[v].clone()).collect())
            .collect()
    }

    /// Whether no data-flow cycle exists
    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }

    /// Vertices ordered so every data-flow edge points forward.
    ///
    /// Kahn's algorithm; ties are broken by insertion order. Returns `None`
    /// when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        let successors = self.oriented_adjacency();
        let mut in_degree = vec![0usize; successors.len()];

        for targets in &successors {
            for &target in targets {
                in_degree[target] += 1;
            }
        }

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(v, _)| v)
            .collect();
        let mut order = Vec::with_capacity(successors.len());

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &target in &successors[v] {
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    queue.push_back(target);
                }
            }
        }

        if order.len() == successors.len() {
            Some(order.into_iter().map(|v| self.vertex_ids()[v].clone()).collect())
        } else {
            None
        }
    }

    /// Oriented successors by vertex position
    fn oriented_adjacency(&self) -> Vec<Vec<usize>> {
        self.vertex_ids()
            .iter()
            .map(|id| {
                self.oriented_successors(id)
                    .iter()
                    .filter_map(|target| self.vertex_position(target))
                    .collect()
            })
            .collect()
    }
}

/// Enumerate the simple cycles through `start` whose other vertices are `allowed`
fn collect_cycles_from(
    start: usize,
    successors: &[Vec<usize>],
    allowed: &dyn Fn(usize) -> bool,
    cycles: &mut Vec<Vec<usize>>,
) {
    let mut on_path = vec![false; successors.len()];
    let mut path = vec![start];
    // next successor to try, one cursor per path entry
    let mut cursors = vec![0usize];
    on_path[start] = true;

    while let Some(&cursor) = cursors.last() {
        let top = cursors.len() - 1;
        let current = path[top];

        match successors[current].get(cursor) {
            Some(&next) => {
                cursors[top] += 1;
                if next == start {
                    cycles.push(path.clone());
                } else if allowed(next) && !on_path[next] {
                    on_path[next] = true;
                    path.push(next);
                    cursors.push(0);
                }
            }
            None => {
                cursors.pop();
                if let Some(done) = path.pop() {
                    on_path[done] = false;
                }
            }
        }
    }
}

/// Tarjan's algorithm with an explicit call stack; returns a component label per vertex
fn strongly_connected_components(successors: &[Vec<usize>]) -> Vec<usize> {
    let count = successors.len();
    let mut index: Vec<Option<usize>> = vec![None; count];
    let mut lowlink = vec![0; count];
    let mut on_stack = vec![false; count];
    let mut stack: Vec<usize> = Vec::new();
    let mut component = vec![0; count];
    let mut next_index = 0;
    let mut next_component = 0;

    // (vertex, next successor to try)
    let mut calls: Vec<(usize, usize)> = Vec::new();

    for root in 0..count {
        if index[root].is_some() {
            continue;
        }
        calls.push((root, 0));

        while let Some(&(v, cursor)) = calls.last() {
            if cursor == 0 && index[v].is_none() {
                index[v] = Some(next_index);
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            if let Some(&w) = successors[v].get(cursor) {
                let top = calls.len() - 1;
                calls[top].1 += 1;
                match index[w] {
                    None => calls.push((w, 0)),
                    Some(w_index) if on_stack[w] => lowlink[v] = lowlink[v].min(w_index),
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }

            if Some(lowlink[v]) == index[v] {
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component[w] = next_component;
                    if w == v {
                        break;
                    }
                }
                next_component += 1;
            }
        }
    }

    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineamap_core::{Connection, Node};
    use pretty_assertions::assert_eq;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> LineageGraph {
        let nodes = ids.iter().map(|id| Node::new(*id, *id).unwrap());
        let connections = edges
            .iter()
            .map(|(from, to)| Connection::select_from(*from, *to).unwrap());
        LineageGraph::build(nodes, connections)
    }

    fn path(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn triangle_cycle() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(g.find_cycles(), vec![path(&["a", "b", "c"])]);
        assert!(!g.is_acyclic());
        assert_eq!(g.topological_order(), None);
    }

    #[test]
    fn chain_has_no_cycles() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert!(g.find_cycles().is_empty());
        assert!(g.is_acyclic());
        assert_eq!(g.topological_order(), Some(path(&["a", "b", "c"])));
    }

    #[test]
    fn self_loop_is_one_cycle() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        assert_eq!(g.find_cycles(), vec![path(&["a"])]);
    }

    #[test]
    fn overlapping_cycles_listed_once() {
        // a <-> b, b <-> c
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")]);
        let mut cycles = g.find_cycles();
        cycles.sort();
        assert_eq!(cycles, vec![path(&["a", "b"]), path(&["b", "c"])]);
    }

    #[test]
    fn cycle_starts_at_earliest_vertex() {
        let g = graph(&["x", "c", "d"], &[("x", "c"), ("c", "d"), ("d", "c")]);
        assert_eq!(g.find_cycles(), vec![path(&["c", "d"])]);
    }

    #[test]
    fn single_connected_to_is_not_a_cycle() {
        let nodes = vec![Node::new("a", "A").unwrap(), Node::new("b", "B").unwrap()];
        let g = LineageGraph::build(nodes, vec![Connection::connected_to("a", "b").unwrap()]);
        assert!(g.find_cycles().is_empty());
        assert!(g.is_acyclic());
    }

    #[test]
    fn connected_to_self_loop_is_one_cycle() {
        let nodes = vec![Node::new("a", "A").unwrap()];
        let g = LineageGraph::build(nodes, vec![Connection::connected_to("a", "a").unwrap()]);
        assert_eq!(g.find_cycles(), vec![path(&["a"])]);
        assert!(!g.is_acyclic());
        assert_eq!(g.topological_order(), None);
    }

    #[test]
    fn connected_to_back_edge_closes_cycle() {
        // inline a -> b, then b connected_to a
        let nodes = vec![
            Node::new("a", "A").unwrap(),
            Node::builder("b", "B").with_select_from(["a"]).build().unwrap(),
        ];
        let g = LineageGraph::build(nodes, vec![Connection::connected_to("b", "a").unwrap()]);
        assert_eq!(g.find_cycles(), vec![path(&["a", "b"])]);
        assert!(!g.is_acyclic());
    }

    #[test]
    fn long_chain_does_not_exhaust_the_stack() {
        let ids: Vec<String> = (0..100_000).map(|i| format!("v{i}")).collect();
        let nodes = ids.iter().map(|id| Node::new(id.as_str(), id.as_str()).unwrap());
        let connections = ids
            .windows(2)
            .map(|pair| Connection::select_from(pair[0].as_str(), pair[1].as_str()).unwrap());
        let g = LineageGraph::build(nodes, connections);

        assert!(g.find_cycles().is_empty());
        assert_eq!(g.topological_order().map(|order| order.len()), Some(100_000));
    }

    #[test]
    fn topological_order_respects_edges() {
        let g = graph(&["d", "c", "b", "a"], &[("a", "b"), ("b", "c"), ("a", "d"), ("c", "d")]);
        let order = g.topological_order().unwrap();
        let position = |id: &str| order.iter().position(|v| v == id).unwrap();

        assert!(position("a") < position("b"));
        assert!(position("b") < position("c"));
        assert!(position("c") < position("d"));
    }
}
