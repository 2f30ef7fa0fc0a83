use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use zone_nav::{
    NavPath, Navigator, PathFinder, PathQuery, Vec2, Zone, ZoneGraph, ZoneGraphBuilder, ZoneId,
};

fn rect(id: u16, x0: f32, y0: f32, x1: f32, y1: f32) -> Zone {
    Zone::new(
        id,
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ],
    )
}

fn build(zones: &[Zone]) -> ZoneGraph {
    ZoneGraphBuilder::default().build(zones).0
}

fn row_of_three() -> ZoneGraph {
    build(&[
        rect(1, 0.0, 0.0, 10.0, 10.0),
        rect(2, 10.0, 0.0, 20.0, 10.0),
        rect(3, 20.0, 0.0, 30.0, 10.0),
    ])
}

/// Cells of a `width`-wide grid of 10x10 squares; id = index + 1.
fn grid(cells: &[bool], width: usize) -> ZoneGraph {
    let zones: Vec<Zone> = cells
        .iter()
        .enumerate()
        .filter(|(_, present)| **present)
        .map(|(i, _)| {
            let x = (i % width) as f32 * 10.0;
            let y = (i / width) as f32 * 10.0;
            rect(i as u16 + 1, x, y, x + 10.0, y + 10.0)
        })
        .collect();
    build(&zones)
}

#[test]
fn row_of_three_routes_through_the_middle_zone() {
    let graph = row_of_three();
    let target = graph.center(ZoneId(3)).expect("zone 3");

    let path = PathFinder::find_path(&graph, ZoneId(1), ZoneId(3), target);
    assert_eq!(path.zones, vec![ZoneId(1), ZoneId(2), ZoneId(3)]);
    assert_eq!(path.points.len(), 3);
    assert_eq!(path.points[0], Vec2::new(5.0, 5.0));
    assert_eq!(path.points[1], Vec2::new(10.0, 5.0));
    assert_eq!(path.points[2], target);
    assert!((path.cost - 20.0).abs() < 1e-4);
}

#[test]
fn same_zone_returns_only_the_target_point() {
    let graph = row_of_three();
    let p = Vec2::new(12.0, 3.0);
    let path = PathFinder::find_path(&graph, ZoneId(2), ZoneId(2), p);
    assert_eq!(path.points, vec![p]);
    assert_eq!(path.zones, vec![ZoneId(2)]);
    assert_eq!(path.cost, 0.0);
}

#[test]
fn unknown_zones_yield_empty_paths() {
    let graph = row_of_three();
    let p = Vec2::new(1.0, 1.0);
    assert!(PathFinder::find_path(&graph, ZoneId(1), ZoneId(42), p).is_empty());
    assert!(PathFinder::find_path(&graph, ZoneId(42), ZoneId(1), p).is_empty());
}

#[test]
fn disconnected_components_never_produce_a_path() {
    let graph = build(&[
        rect(1, 0.0, 0.0, 10.0, 10.0),
        rect(2, 10.0, 0.0, 20.0, 10.0),
        rect(3, 50.0, 0.0, 60.0, 10.0),
        rect(4, 60.0, 0.0, 70.0, 10.0),
    ]);
    let target = Vec2::new(65.0, 5.0);

    let mut query = PathQuery::default();
    let mut out = NavPath::empty();
    for _ in 0..5 {
        assert!(PathFinder::find_path(&graph, ZoneId(1), ZoneId(4), target).is_empty());
        assert!(PathFinder::find_route(&graph, ZoneId(4), ZoneId(1)).is_none());
        PathFinder::find_path_into(
            &graph,
            Vec2::new(1.0, 1.0),
            ZoneId(2),
            ZoneId(3),
            target,
            &mut query,
            &mut out,
        );
        assert!(out.is_empty());
    }

    // The same scratch still serves a reachable query afterwards.
    PathFinder::find_path_into(
        &graph,
        Vec2::new(1.0, 1.0),
        ZoneId(1),
        ZoneId(2),
        Vec2::new(15.0, 5.0),
        &mut query,
        &mut out,
    );
    assert_eq!(out.zones, vec![ZoneId(1), ZoneId(2)]);
    assert_eq!(out.points, vec![Vec2::new(1.0, 1.0), Vec2::new(15.0, 5.0)]);
}

#[test]
fn equal_cost_routes_break_ties_by_lower_zone_id() {
    // 2x2 block: 1 2 on the bottom row, 3 4 above.
    let graph = grid(&[true; 4], 2);
    for _ in 0..3 {
        let route = PathFinder::find_route(&graph, ZoneId(1), ZoneId(4)).expect("route");
        assert_eq!(route.zones, vec![ZoneId(1), ZoneId(2), ZoneId(4)]);
    }
}

#[test]
fn gateways_are_pulled_toward_the_target_line() {
    // Corridor 1 -> 2 -> 3 -> 4 where the target sits high in zone 4.
    let graph = grid(&[true; 4], 4);
    let target = Vec2::new(38.0, 9.0);
    let path =
        PathFinder::find_path_from(&graph, Vec2::new(1.0, 1.0), ZoneId(1), ZoneId(4), target);

    assert_eq!(path.points.len(), 4);
    assert_eq!(path.points[0], Vec2::new(1.0, 1.0));
    // Closest points on the borders x=20 and x=10 to the horizontal line through the target.
    assert_eq!(path.points[2], Vec2::new(20.0, 9.0));
    assert!(path.points[1].distance(Vec2::new(10.0, 9.0)) < 1e-4);
    assert_eq!(path.points[3], target);
}

#[test]
fn navigator_locates_zones_from_positions() {
    let graph = row_of_three();
    let start = Vec2::new(2.0, 2.0);
    let goal = Vec2::new(28.0, 8.0);
    let path = graph.find_path(start, goal).expect("path");
    assert_eq!(path.points.first().copied(), Some(start));
    assert_eq!(path.points.last().copied(), Some(goal));
    assert_eq!(path.zones, vec![ZoneId(1), ZoneId(2), ZoneId(3)]);

    assert!(graph.find_path(Vec2::new(-5.0, 0.0), goal).is_none());
    let q = graph.nearest_point(Vec2::new(15.0, 14.0)).expect("projection");
    assert_eq!(q, Vec2::new(15.0, 10.0));
}

#[test]
fn concurrent_queries_share_one_snapshot() {
    let graph = Arc::new(grid(&[true; 16], 4));
    let expected = PathFinder::find_path(&graph, ZoneId(1), ZoneId(16), Vec2::new(35.0, 35.0));
    assert!(!expected.is_empty());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                (0..50)
                    .map(|_| {
                        PathFinder::find_path(&graph, ZoneId(1), ZoneId(16), Vec2::new(35.0, 35.0))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for path in handle.join().expect("worker") {
            assert_eq!(path, expected);
        }
    }
}

/// Cheapest route cost by enumerating every simple path.
fn exhaustive_cost(graph: &ZoneGraph, start: ZoneId, target: ZoneId) -> Option<f32> {
    fn walk(
        graph: &ZoneGraph,
        at: ZoneId,
        target: ZoneId,
        cost: f32,
        visited: &mut Vec<ZoneId>,
        best: &mut Option<f32>,
    ) {
        if at == target {
            if best.map_or(true, |b| cost < b) {
                *best = Some(cost);
            }
            return;
        }
        for entry in graph.neighbors(at) {
            if visited.contains(&entry.zone_id) {
                continue;
            }
            visited.push(entry.zone_id);
            walk(graph, entry.zone_id, target, cost + entry.dist_to, visited, best);
            visited.pop();
        }
    }

    let mut best = None;
    let mut visited = vec![start];
    walk(graph, start, target, 0.0, &mut visited, &mut best);
    best
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn search_cost_never_exceeds_exhaustive_cost(
        cells in proptest::collection::vec(any::<bool>(), 9),
        from in 0usize..9,
        to in 0usize..9,
    ) {
        let mut cells = cells;
        cells[from] = true;
        cells[to] = true;
        let graph = grid(&cells, 3);
        let (start, target) = (ZoneId(from as u16 + 1), ZoneId(to as u16 + 1));

        let found = PathFinder::find_route(&graph, start, target);
        let best = exhaustive_cost(&graph, start, target);
        match (found, best) {
            (Some(route), Some(best)) => {
                prop_assert!(route.cost <= best + 1e-3, "{} > {}", route.cost, best);
                prop_assert_eq!(route.zones.first().copied(), Some(start));
                prop_assert_eq!(route.zones.last().copied(), Some(target));
            }
            (None, None) => {}
            (found, best) => prop_assert!(false, "search {:?} vs exhaustive {:?}", found, best),
        }
    }
}
