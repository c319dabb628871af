//! Contraction of pass-through vertices
//!
//! A way split into several edges leaves vertices of degree 2 whose two
//! edges come from the same way. Those vertices are contracted away: their
//! two edges become one, spanning both `ndref` lists. Intersections and
//! boundaries between different ways are never touched.

use log::info;

use super::{EdgeKey, OsmGraph};
use crate::osm::NodeId;

impl OsmGraph {
    /// Contracts every same-way pass-through vertex, until none is left
    pub fn simplify(&mut self) {
        let edges_before = self.edges.len();
        let mut contracted = 0usize;

        loop {
            let mut candidates: Vec<NodeId> = self.incident.keys().copied().collect();
            candidates.sort_unstable();
            let mut changed = false;

            for id in candidates {
                if let Some((first, second)) = self.contractible(id) {
                    self.contract(id, first, second);
                    contracted += 1;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        info!(
            "Simplified graph: {contracted} pass-through nodes removed, {edges_before} -> {} edges",
            self.edges.len()
        );
    }

    /// Both edges of a degree-2 vertex, when they belong to the same way
    fn contractible(&self, id: NodeId) -> Option<(EdgeKey, EdgeKey)> {
        let keys = self.incident.get(&id)?;
        if keys.len() != 2 {
            return None;
        }

        let mut keys = keys.iter().copied();
        let (first, second) = (keys.next()?, keys.next()?);
        if first.is_loop() || second.is_loop() {
            return None;
        }

        let same_way = match (self.edges.get(&first)?.osm_id, self.edges.get(&second)?.osm_id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        same_way.then_some((first, second))
    }

    /// Replaces the two edges at `via` with one edge and removes `via`.
    ///
    /// The merged edge is walked through `via`; an edge that has to be walked
    /// against its stored direction is reversed, and its segments are marked
    /// as reversed.
    fn contract(&mut self, via: NodeId, first: EdgeKey, second: EdgeKey) {
        // Walk into `via` along an edge that already ends there, if any.
        let (first, second) = if first.v != via && second.v == via {
            (second, first)
        } else {
            (first, second)
        };

        let (Some(head), Some(tail)) = (self.remove_edge(&first), self.remove_edge(&second)) else {
            return;
        };

        let (start, head) = if first.v == via {
            (first.u, head)
        } else {
            (first.v, head.reversed())
        };
        let (end, tail) = if second.u == via {
            (second.v, tail)
        } else {
            (second.u, tail.reversed())
        };

        let mut merged = head;
        merged.ndref.extend(tail.ndref.into_iter().skip(1));
        merged.parts.extend(tail.parts);
        merged.geometry = None;

        self.retire_node(via);
        self.add_edge(start, end, merged);
    }
}
