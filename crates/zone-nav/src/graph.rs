//! Zone adjacency discovery and immutable graph snapshots.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::math::point_in_polygon;
use crate::{Extent, GeometryConfig, GeometryError, GraphInconsistency, Vec2, Zone, ZoneId};

/// Directed adjacency from the owning zone to `zone_id` across one shared border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighboringZone {
    pub zone_id: ZoneId,
    pub border_start: Vec2,
    pub border_end: Vec2,
    pub border_center: Vec2,
    /// Center of the owning zone.
    pub center: Vec2,
    /// Distance between the two zone centers; the search cost of this hop.
    pub dist_to: f32,
}

impl NeighboringZone {
    pub fn border_length(&self) -> f32 {
        self.border_start.distance(self.border_end)
    }

    /// Same segment as `other`'s border within `eps`, in either orientation.
    pub fn border_matches(&self, other: &NeighboringZone, eps: f32) -> bool {
        let eps2 = eps * eps;
        let same = self.border_start.distance_squared(other.border_start) <= eps2
            && self.border_end.distance_squared(other.border_end) <= eps2;
        let reversed = self.border_start.distance_squared(other.border_end) <= eps2
            && self.border_end.distance_squared(other.border_start) <= eps2;
        same || reversed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneNode {
    pub id: ZoneId,
    pub center: Vec2,
    pub extent: Extent,
    pub polygon: Vec<Vec2>,
    pub neighbors: Vec<NeighboringZone>,
}

/// Immutable mapping from zone id to its adjacency list.
///
/// Built in full by [`ZoneGraphBuilder`] and never patched; geometry changes produce a new
/// graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneGraph {
    /// Sorted by id.
    nodes: Vec<ZoneNode>,
}

impl ZoneGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ZoneNode] {
        &self.nodes
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn contains(&self, id: ZoneId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn node(&self, id: ZoneId) -> Option<&ZoneNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn neighbors(&self, id: ZoneId) -> &[NeighboringZone] {
        self.node(id).map(|n| n.neighbors.as_slice()).unwrap_or(&[])
    }

    pub fn center(&self, id: ZoneId) -> Option<Vec2> {
        self.node(id).map(|n| n.center)
    }

    /// Index of the first entry in `zone`'s neighbor list pointing at `candidate`.
    pub fn neighbor_index(&self, zone: ZoneId, candidate: ZoneId) -> Option<usize> {
        self.neighbors(zone)
            .iter()
            .position(|n| n.zone_id == candidate)
    }

    /// Zone whose polygon contains `p`; the lowest id wins on shared borders.
    pub fn zone_at(&self, p: Vec2) -> Option<ZoneId> {
        self.nodes
            .iter()
            .find(|n| n.extent.contains(p) && point_in_polygon(&n.polygon, p))
            .map(|n| n.id)
    }

    /// Total number of directed adjacency entries.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum()
    }

    pub(crate) fn index_of(&self, id: ZoneId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }

    pub(crate) fn node_at(&self, index: usize) -> &ZoneNode {
        &self.nodes[index]
    }
}

/// What a build pass excluded or repaired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub rejected: Vec<GeometryError>,
    pub repaired: Vec<GraphInconsistency>,
    /// Zones accepted despite being concave.
    pub concave: Vec<ZoneId>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.repaired.is_empty()
    }
}

/// Computes zone adjacency from polygon geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneGraphBuilder {
    config: GeometryConfig,
}

impl ZoneGraphBuilder {
    pub fn new(config: GeometryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Build a graph from `zones`. Degenerate zones are excluded and reported.
    pub fn build<'a, I>(&self, zones: I) -> (ZoneGraph, BuildReport)
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        let mut report = BuildReport::default();

        let mut accepted: Vec<&Zone> = Vec::new();
        for zone in zones {
            if let Err(err) = zone.validate(&self.config) {
                tracing::warn!(zone = zone.id().0, error = %err, "zone excluded from graph");
                report.rejected.push(err);
                continue;
            }
            accepted.push(zone);
        }

        // Stable sort keeps the first occurrence of a duplicated id ahead of later ones.
        accepted.sort_by_key(|z| z.id());
        let mut unique: Vec<&Zone> = Vec::with_capacity(accepted.len());
        for zone in accepted {
            if unique.last().map(|z| z.id()) == Some(zone.id()) {
                let err = GeometryError::DuplicateId { zone: zone.id() };
                tracing::warn!(zone = zone.id().0, error = %err, "zone excluded from graph");
                report.rejected.push(err);
                continue;
            }
            if !zone.is_convex() {
                tracing::debug!(zone = zone.id().0, "concave zone; path costs are approximate");
                report.concave.push(zone.id());
            }
            unique.push(zone);
        }

        let mut nodes: Vec<ZoneNode> = unique
            .iter()
            .map(|z| ZoneNode {
                id: z.id(),
                center: z.center(),
                extent: z.extent(),
                polygon: z.vertices().to_vec(),
                neighbors: Vec::new(),
            })
            .collect();

        for i in 0..unique.len() {
            for j in (i + 1)..unique.len() {
                let (a, b) = (unique[i], unique[j]);
                if !a
                    .extent()
                    .overlaps(&b.extent(), self.config.collinear_epsilon)
                {
                    continue;
                }
                for (start, end) in self.shared_borders(a, b) {
                    let dist_to = a.center().distance(b.center());
                    let border_center = start.midpoint(end);
                    nodes[i].neighbors.push(NeighboringZone {
                        zone_id: b.id(),
                        border_start: start,
                        border_end: end,
                        border_center,
                        center: a.center(),
                        dist_to,
                    });
                    nodes[j].neighbors.push(NeighboringZone {
                        zone_id: a.id(),
                        border_start: end,
                        border_end: start,
                        border_center,
                        center: b.center(),
                        dist_to,
                    });
                }
            }
        }

        let mut graph = ZoneGraph { nodes };
        report.repaired = self.repair_symmetry(&mut graph);

        tracing::info!(
            zones = graph.len(),
            adjacencies = graph.edge_count(),
            rejected = report.rejected.len(),
            repaired = report.repaired.len(),
            "zone graph built"
        );
        (graph, report)
    }

    /// Every overlapping collinear edge interval between `a` and `b`, as segments on `a`'s edges.
    pub fn shared_borders(&self, a: &Zone, b: &Zone) -> Vec<(Vec2, Vec2)> {
        let mut out = Vec::new();
        for (a0, a1) in a.edges() {
            for (b0, b1) in b.edges() {
                if let Some(border) = self.edge_overlap(a0, a1, b0, b1) {
                    out.push(border);
                }
            }
        }
        out
    }

    fn edge_overlap(&self, a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<(Vec2, Vec2)> {
        let axis = a1 - a0;
        let len = axis.length();
        if len <= self.config.border_epsilon {
            return None;
        }
        let dir = axis / len;

        // Perpendicular distance of both endpoints of b from a's line.
        let eps = self.config.collinear_epsilon;
        if dir.cross(b0 - a0).abs() > eps || dir.cross(b1 - a0).abs() > eps {
            return None;
        }

        let t0 = dir.dot(b0 - a0);
        let t1 = dir.dot(b1 - a0);
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(len);
        if hi - lo <= self.config.border_epsilon {
            return None;
        }
        Some((a0 + dir * lo, a0 + dir * hi))
    }

    /// Insert reciprocal entries that are missing. Returns what was repaired.
    fn repair_symmetry(&self, graph: &mut ZoneGraph) -> Vec<GraphInconsistency> {
        let eps = self.config.collinear_epsilon.max(self.config.border_epsilon);
        let mut missing: Vec<(usize, NeighboringZone, ZoneId)> = Vec::new();

        for node in graph.nodes.iter() {
            for entry in node.neighbors.iter() {
                let Some(target) = graph.index_of(entry.zone_id) else {
                    continue;
                };
                let has_reciprocal = graph.nodes[target]
                    .neighbors
                    .iter()
                    .any(|back| back.zone_id == node.id && back.border_matches(entry, eps));
                if !has_reciprocal {
                    missing.push((target, *entry, node.id));
                }
            }
        }

        let mut repaired = Vec::new();
        let mut seen = BTreeSet::new();
        for (target, entry, from) in missing {
            let target_node = &mut graph.nodes[target];
            let key = (
                from,
                target_node.id,
                entry.border_start.x.to_bits(),
                entry.border_start.y.to_bits(),
            );
            if !seen.insert(key) {
                continue;
            }
            let issue = GraphInconsistency {
                from,
                to: target_node.id,
            };
            tracing::warn!(from = from.0, to = target_node.id.0, "{issue}; inserting reciprocal");
            target_node.neighbors.push(NeighboringZone {
                zone_id: from,
                border_start: entry.border_end,
                border_end: entry.border_start,
                border_center: entry.border_center,
                center: target_node.center,
                dist_to: entry.dist_to,
            });
            repaired.push(issue);
        }
        repaired
    }
}

/// Entries that lack a reciprocal within `eps`. Empty for every graph the builder returns.
pub fn asymmetric_entries(graph: &ZoneGraph, eps: f32) -> Vec<GraphInconsistency> {
    let mut out = Vec::new();
    for node in graph.nodes() {
        for entry in node.neighbors.iter() {
            let ok = graph
                .neighbors(entry.zone_id)
                .iter()
                .any(|back| back.zone_id == node.id && back.border_matches(entry, eps));
            if !ok {
                out.push(GraphInconsistency {
                    from: node.id,
                    to: entry.zone_id,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_inserts_missing_reciprocal() {
        let builder = ZoneGraphBuilder::default();
        let mut graph = ZoneGraph {
            nodes: vec![
                ZoneNode {
                    id: ZoneId(1),
                    center: Vec2::new(0.5, 0.5),
                    extent: Extent::from_points(&[Vec2::ZERO, Vec2::new(1.0, 1.0)]),
                    polygon: Vec::new(),
                    neighbors: vec![NeighboringZone {
                        zone_id: ZoneId(2),
                        border_start: Vec2::new(1.0, 0.0),
                        border_end: Vec2::new(1.0, 1.0),
                        border_center: Vec2::new(1.0, 0.5),
                        center: Vec2::new(0.5, 0.5),
                        dist_to: 1.0,
                    }],
                },
                ZoneNode {
                    id: ZoneId(2),
                    center: Vec2::new(1.5, 0.5),
                    extent: Extent::from_points(&[Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)]),
                    polygon: Vec::new(),
                    neighbors: Vec::new(),
                },
            ],
        };

        let repaired = builder.repair_symmetry(&mut graph);
        assert_eq!(
            repaired,
            vec![GraphInconsistency {
                from: ZoneId(1),
                to: ZoneId(2)
            }]
        );
        assert_eq!(graph.neighbor_index(ZoneId(2), ZoneId(1)), Some(0));
        assert_eq!(graph.neighbors(ZoneId(2))[0].center, Vec2::new(1.5, 0.5));
        assert!(asymmetric_entries(&graph, 1e-3).is_empty());
    }

    #[test]
    fn short_contact_is_not_an_adjacency() {
        let builder = ZoneGraphBuilder::default();
        // Touching corners only share a point.
        let overlap = builder.edge_overlap(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
        );
        assert!(overlap.is_none());

        let overlap = builder.edge_overlap(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.95, 0.0),
            Vec2::new(2.0, 0.0),
        );
        assert!(overlap.is_none(), "0.05 overlap is under the border epsilon");
    }
}
