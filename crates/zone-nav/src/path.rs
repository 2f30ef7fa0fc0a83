//! A* over zone adjacency plus gateway refinement.
//!
//! The heuristic is the straight-line distance between zone centers. With center-to-center hop
//! costs it never overestimates, but on concave layouts a center is a poor stand-in for where an
//! agent actually crosses a zone, so routes there can be slightly longer than the geometric
//! optimum.

use core::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::math::{closest_point_on_polygon, closest_point_on_segment_to_line};
use crate::{NavPath, Navigator, NeighboringZone, Vec2, ZoneGraph, ZoneId};

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f32,
    g: f32,
    zone: ZoneId,
    index: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap. Equal f resolves to the
        // lower zone id so host and peers expand zones in the same order.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.zone.cmp(&self.zone))
            .then_with(|| other.g.total_cmp(&self.g))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// Reusable scratch buffers for path queries.
///
/// Keeps repeated queries allocation-free once the buffers have grown to the graph size.
#[derive(Debug, Default)]
pub struct PathQuery {
    open: BinaryHeap<OpenNode>,
    g_score: Vec<f32>,
    came_from: Vec<Option<(usize, usize)>>,
    route: Vec<usize>,
    hops: Vec<NeighboringZone>,
}

/// Zone-level route between two zones.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRoute {
    pub zones: Vec<ZoneId>,
    /// Adjacency entry used for each hop; `hops[i]` leads from `zones[i]` to `zones[i + 1]`.
    pub hops: Vec<NeighboringZone>,
    pub cost: f32,
}

/// Stateless path search over a [`ZoneGraph`] snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFinder;

impl PathFinder {
    /// Path from the center of `start` to `target_point` inside `target`.
    ///
    /// Returns an empty path when either zone is unknown or no route exists.
    pub fn find_path(
        graph: &ZoneGraph,
        start: ZoneId,
        target: ZoneId,
        target_point: Vec2,
    ) -> NavPath {
        let start_point = graph.center(start).unwrap_or(target_point);
        Self::find_path_from(graph, start_point, start, target, target_point)
    }

    /// Like [`PathFinder::find_path`] with an explicit first waypoint.
    pub fn find_path_from(
        graph: &ZoneGraph,
        start_point: Vec2,
        start: ZoneId,
        target: ZoneId,
        target_point: Vec2,
    ) -> NavPath {
        let mut query = PathQuery::default();
        let mut out = NavPath::empty();
        Self::find_path_into(
            graph,
            start_point,
            start,
            target,
            target_point,
            &mut query,
            &mut out,
        );
        out
    }

    pub fn find_route(graph: &ZoneGraph, start: ZoneId, target: ZoneId) -> Option<ZoneRoute> {
        let mut query = PathQuery::default();
        let cost = Self::search(graph, start, target, &mut query)?;
        Some(ZoneRoute {
            zones: query
                .route
                .iter()
                .map(|&i| graph.node_at(i).id)
                .collect(),
            hops: query.hops.clone(),
            cost,
        })
    }

    pub fn find_path_into(
        graph: &ZoneGraph,
        start_point: Vec2,
        start: ZoneId,
        target: ZoneId,
        target_point: Vec2,
        query: &mut PathQuery,
        out: &mut NavPath,
    ) {
        out.clear();

        if start == target {
            out.points.push(target_point);
            out.zones.push(start);
            return;
        }

        let Some(cost) = Self::search(graph, start, target, query) else {
            tracing::trace!(start = start.0, target = target.0, "no route");
            return;
        };

        out.cost = cost;
        out.zones
            .extend(query.route.iter().map(|&i| graph.node_at(i).id));

        // One waypoint per zone: the start point, the entry gateway of every intermediate zone,
        // then the target point. Gateways are refined from the target backwards.
        out.points.push(start_point);
        let first_gateway = out.points.len();
        let mut anchor = target_point;
        for hop in query.hops.iter().take(query.hops.len() - 1).rev() {
            let gateway = closest_point_on_segment_to_line(
                hop.border_start,
                hop.border_end,
                anchor,
                target_point,
            );
            out.points.push(gateway);
            anchor = gateway;
        }
        out.points[first_gateway..].reverse();
        out.points.push(target_point);
    }

    /// A* from `start` to `target`; fills `query.route`/`query.hops` and returns the cost.
    fn search(
        graph: &ZoneGraph,
        start: ZoneId,
        target: ZoneId,
        query: &mut PathQuery,
    ) -> Option<f32> {
        query.route.clear();
        query.hops.clear();

        let start_idx = graph.index_of(start)?;
        let goal_idx = graph.index_of(target)?;
        let goal_center = graph.node_at(goal_idx).center;
        let heuristic = |idx: usize| graph.node_at(idx).center.distance(goal_center);

        let n = graph.len();
        let open = &mut query.open;
        let g_score = &mut query.g_score;
        let came_from = &mut query.came_from;
        open.clear();
        g_score.resize(n, f32::INFINITY);
        g_score.fill(f32::INFINITY);
        came_from.resize(n, None);
        came_from.fill(None);

        g_score[start_idx] = 0.0;
        open.push(OpenNode {
            f: heuristic(start_idx),
            g: 0.0,
            zone: start,
            index: start_idx,
        });

        while let Some(node) = open.pop() {
            if node.index == goal_idx {
                let mut current = goal_idx;
                query.route.push(current);
                while let Some((prev, entry)) = came_from[current] {
                    query.hops.push(graph.node_at(prev).neighbors[entry]);
                    query.route.push(prev);
                    current = prev;
                }
                query.route.reverse();
                query.hops.reverse();
                return Some(node.g);
            }

            if node.g > g_score[node.index] {
                // Stale heap entry.
                continue;
            }

            for (entry_idx, entry) in graph.node_at(node.index).neighbors.iter().enumerate() {
                let Some(next) = graph.index_of(entry.zone_id) else {
                    continue;
                };
                let tentative_g = node.g + entry.dist_to;
                if tentative_g >= g_score[next] {
                    continue;
                }

                came_from[next] = Some((node.index, entry_idx));
                g_score[next] = tentative_g;
                open.push(OpenNode {
                    f: tentative_g + heuristic(next),
                    g: tentative_g,
                    zone: entry.zone_id,
                    index: next,
                });
            }
        }

        None
    }
}

impl Navigator for ZoneGraph {
    fn find_path(&self, start: Vec2, goal: Vec2) -> Option<NavPath> {
        let start_zone = self.zone_at(start)?;
        let goal_zone = self.zone_at(goal)?;
        let path = PathFinder::find_path_from(self, start, start_zone, goal_zone, goal);
        (!path.is_empty()).then_some(path)
    }

    fn nearest_point(&self, point: Vec2) -> Option<Vec2> {
        let mut best: Option<(f32, Vec2)> = None;
        for node in self.nodes() {
            let q = closest_point_on_polygon(&node.polygon, point);
            let d2 = q.distance_squared(point);
            match best {
                None => best = Some((d2, q)),
                Some((best_d2, _)) if d2 < best_d2 => best = Some((d2, q)),
                _ => {}
            }
        }
        best.map(|(_, q)| q)
    }
}
