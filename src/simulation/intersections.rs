//! Intersection index over the road set
//!
//! Two roads intersect when their paths share at least one grid cell. The
//! relation is derived once from the full road set and read per-tick by the
//! lookahead and collision passes; it is never mutated during a tick.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use super::road::SimRoad;
use super::types::{Cell, RoadId};

/// Symmetric, deduplicated "shares a cell" relation between roads
///
/// Backed by an undirected graph whose nodes are road ids and whose edges
/// carry one of the shared cells. Self-pairs are excluded.
#[derive(Default)]
pub struct IntersectionIndex {
    graph: UnGraph<RoadId, Cell>,
    road_to_node: HashMap<RoadId, NodeIndex>,
}

impl IntersectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from the full set of roads
    pub fn build<'a>(roads: impl Iterator<Item = &'a SimRoad>) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut road_to_node = HashMap::new();
        let mut cell_owners: HashMap<Cell, Vec<NodeIndex>> = HashMap::new();

        for road in roads {
            let node = graph.add_node(road.id);
            road_to_node.insert(road.id, node);
            for &cell in road.path().cells() {
                cell_owners.entry(cell).or_default().push(node);
            }
        }

        for (cell, owners) in cell_owners {
            if owners.len() < 2 {
                continue;
            }
            // Path cells are distinct within a road, so co-occurring nodes
            // always belong to different roads. update_edge deduplicates
            // pairs that share more than one cell.
            for (i, &a) in owners.iter().enumerate() {
                for &b in &owners[i + 1..] {
                    graph.update_edge(a, b, cell);
                }
            }
        }

        Self {
            graph,
            road_to_node,
        }
    }

    /// All roads intersecting the given road
    pub fn intersecting(&self, road: RoadId) -> Vec<RoadId> {
        match self.road_to_node.get(&road) {
            Some(&node) => self
                .graph
                .neighbors(node)
                .map(|neighbor| self.graph[neighbor])
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn intersects(&self, a: RoadId, b: RoadId) -> bool {
        match (self.road_to_node.get(&a), self.road_to_node.get(&b)) {
            (Some(&node_a), Some(&node_b)) => self.graph.find_edge(node_a, node_b).is_some(),
            _ => false,
        }
    }

    /// One of the cells shared by two intersecting roads
    pub fn shared_cell(&self, a: RoadId, b: RoadId) -> Option<Cell> {
        let node_a = *self.road_to_node.get(&a)?;
        let node_b = *self.road_to_node.get(&b)?;
        let edge = self.graph.find_edge(node_a, node_b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Number of intersecting road pairs
    pub fn pair_count(&self) -> usize {
        self.graph.edge_count()
    }
}
