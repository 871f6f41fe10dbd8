//! Herd contact network built from movement events: which herds can an
//! infection have reached from (or arrived at) a given herd, following
//! recorded livestock movements.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use polars::prelude::*;

use crate::error::{require_columns, BtbError, Result};
use crate::schema::{contact, direction, movement};

/// Directed herd-to-herd contact graph. One edge per recorded movement
/// event, weighted by how many events link the pair.
pub struct ContactTracer {
    graph: DiGraph<String, u32>,
    /// Herd number → NodeIndex for fast lookup.
    node_map: HashMap<String, NodeIndex>,
}

impl ContactTracer {
    /// Build the graph from a movements DataFrame.
    pub fn from_movements(movements: &DataFrame) -> Result<Self> {
        require_columns(movements, &[movement::MOVE_FROM, movement::MOVE_TO])?;
        let source = movements.column(movement::MOVE_FROM)?.str()?;
        let dest = movements.column(movement::MOVE_TO)?.str()?;

        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        let get_or_insert = |map: &mut HashMap<String, NodeIndex>,
                             g: &mut DiGraph<String, u32>,
                             id: &str|
         -> NodeIndex {
            *map.entry(id.to_string())
                .or_insert_with(|| g.add_node(id.to_string()))
        };

        for i in 0..movements.height() {
            let src = source
                .get(i)
                .ok_or_else(|| BtbError::InvalidData(format!("Null move_from at row {i}")))?;
            let dst = dest
                .get(i)
                .ok_or_else(|| BtbError::InvalidData(format!("Null move_to at row {i}")))?;

            let src_idx = get_or_insert(&mut node_map, &mut graph, src);
            let dst_idx = get_or_insert(&mut node_map, &mut graph, dst);
            if let Some(edge) = graph.find_edge(src_idx, dst_idx) {
                graph[edge] += 1;
            } else {
                graph.add_edge(src_idx, dst_idx, 1);
            }
        }

        log::debug!(
            "contact graph: {} herds, {} links",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self { graph, node_map })
    }

    /// Trace every herd reachable from the origin herds, both ways.
    ///
    /// Returns a DataFrame with columns origin_herd, traced_herd and
    /// direction: `identity` for the origin itself, `forward` for herds
    /// livestock moved on to, `backward` for herds livestock came from.
    /// A herd absent from the graph yields only its identity row.
    pub fn trace(&self, origin_herds: &[String]) -> Result<DataFrame> {
        let mut origins = Vec::new();
        let mut traced = Vec::new();
        let mut directions = Vec::new();

        for origin in origin_herds {
            origins.push(origin.clone());
            traced.push(origin.clone());
            directions.push(direction::IDENTITY.to_string());

            let Some(&origin_idx) = self.node_map.get(origin) else {
                continue;
            };

            for (dir_label, dir) in [
                (direction::FORWARD, Direction::Outgoing),
                (direction::BACKWARD, Direction::Incoming),
            ] {
                for node in self.reachable(origin_idx, dir) {
                    origins.push(origin.clone());
                    traced.push(self.graph[node].clone());
                    directions.push(dir_label.to_string());
                }
            }
        }

        Ok(DataFrame::new(vec![
            Column::new(contact::ORIGIN_HERD.into(), &origins),
            Column::new(contact::TRACED_HERD.into(), &traced),
            Column::new(contact::TRACE_DIRECTION.into(), &directions),
        ])?)
    }

    /// All nodes reachable from `start` following edges in `direction`,
    /// excluding `start` itself.
    fn reachable(&self, start: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeIndex> = self.graph.neighbors_directed(start, direction).collect();
        let mut visited = HashSet::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            result.push(node);
            for neighbor in self.graph.neighbors_directed(node, direction) {
                if !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movements(rows: &[(&str, &str)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                movement::MOVE_FROM.into(),
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            ),
            Column::new(
                movement::MOVE_TO.into(),
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            ),
        ])
        .unwrap()
    }

    fn rows_for<'a>(df: &'a DataFrame, dir: &str) -> Vec<String> {
        let dirs = df.column(contact::TRACE_DIRECTION).unwrap().str().unwrap();
        let herds = df.column(contact::TRACED_HERD).unwrap().str().unwrap();
        let mut out: Vec<String> = dirs
            .into_iter()
            .zip(herds)
            .filter(|(d, _)| d.as_deref() == Some(dir))
            .filter_map(|(_, h)| h.map(str::to_string))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn forward_and_backward_reachability() {
        // H1 -> H2 -> H3, plus H0 -> H2.
        let tracer =
            ContactTracer::from_movements(&movements(&[("H1", "H2"), ("H2", "H3"), ("H0", "H2")]))
                .unwrap();
        let df = tracer.trace(&["H2".to_string()]).unwrap();

        assert_eq!(rows_for(&df, direction::FORWARD), vec!["H3"]);
        assert_eq!(rows_for(&df, direction::BACKWARD), vec!["H0", "H1"]);
        assert_eq!(rows_for(&df, direction::IDENTITY), vec!["H2"]);
    }

    #[test]
    fn unknown_herd_yields_identity_only() {
        let tracer = ContactTracer::from_movements(&movements(&[("H1", "H2")])).unwrap();
        let df = tracer.trace(&["H9".to_string()]).unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn repeat_movements_accumulate_edge_weight() {
        let tracer =
            ContactTracer::from_movements(&movements(&[("H1", "H2"), ("H1", "H2")])).unwrap();
        assert_eq!(tracer.graph.edge_count(), 1);
        assert_eq!(tracer.graph[tracer.graph.edge_indices().next().unwrap()], 2);
    }
}
