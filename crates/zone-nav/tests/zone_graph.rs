use proptest::prelude::*;
use zone_nav::graph::asymmetric_entries;
use zone_nav::{GeometryConfig, GeometryError, Vec2, Zone, ZoneGraphBuilder, ZoneId};

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

fn row_of_three() -> Vec<Zone> {
    vec![
        rect(1, 0.0, 0.0, 10.0, 10.0),
        rect(2, 10.0, 0.0, 20.0, 10.0),
        rect(3, 20.0, 0.0, 30.0, 10.0),
    ]
}

#[test]
fn row_of_three_only_links_consecutive_zones() {
    let zones = row_of_three();
    let (graph, report) = ZoneGraphBuilder::default().build(&zones);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(graph.len(), 3);

    assert_eq!(graph.neighbor_index(ZoneId(1), ZoneId(2)), Some(0));
    assert_eq!(graph.neighbor_index(ZoneId(1), ZoneId(3)), None);
    assert_eq!(graph.neighbor_index(ZoneId(3), ZoneId(1)), None);
    assert_eq!(graph.neighbors(ZoneId(2)).len(), 2);

    let border = graph.neighbors(ZoneId(1))[0];
    assert!(border.border_matches(
        &zone_nav::NeighboringZone {
            border_start: Vec2::new(10.0, 0.0),
            border_end: Vec2::new(10.0, 10.0),
            ..border
        },
        1e-5
    ));
    assert_eq!(border.border_center, Vec2::new(10.0, 5.0));
    assert_eq!(border.center, Vec2::new(5.0, 5.0));
    assert!((border.dist_to - 10.0).abs() < 1e-5);
}

#[test]
fn adjacency_is_symmetric_with_matching_borders() {
    let zones = vec![
        rect(1, 0.0, 0.0, 10.0, 10.0),
        rect(2, 10.0, 2.0, 25.0, 8.0),
        // Shares only part of zone 1's top edge.
        rect(3, 4.0, 10.0, 30.0, 20.0),
        Zone::new(
            4,
            vec![
                Vec2::new(25.0, 2.0),
                Vec2::new(35.0, 0.0),
                Vec2::new(35.0, 10.0),
                Vec2::new(25.0, 8.0),
            ],
        ),
    ];
    let (graph, _) = ZoneGraphBuilder::default().build(&zones);
    assert!(asymmetric_entries(&graph, 1e-4).is_empty());

    for node in graph.nodes() {
        for entry in node.neighbors.iter() {
            let back = graph
                .neighbors(entry.zone_id)
                .iter()
                .find(|b| b.zone_id == node.id)
                .expect("reciprocal entry");
            assert!(back.border_matches(entry, 1e-4));
            assert!((back.dist_to - entry.dist_to).abs() < 1e-6);
        }
    }

    let top = graph.neighbors(ZoneId(1))[graph
        .neighbor_index(ZoneId(1), ZoneId(3))
        .expect("1 touches 3")];
    assert!((top.border_length() - 6.0).abs() < 1e-5);
}

#[test]
fn degenerate_zones_are_excluded_and_reported() {
    let mut zones = row_of_three();
    zones.push(Zone::new(
        9,
        vec![Vec2::new(30.0, 0.0), Vec2::new(30.0, 10.0)],
    ));
    zones.push(Zone::new(
        10,
        vec![
            Vec2::new(30.0, 0.0),
            Vec2::new(35.0, 0.0),
            Vec2::new(40.0, 0.0),
        ],
    ));

    let (graph, report) = ZoneGraphBuilder::default().build(&zones);
    assert!(!graph.contains(ZoneId(9)));
    assert!(!graph.contains(ZoneId(10)));
    assert_eq!(graph.neighbors(ZoneId(3)).len(), 1);
    assert_eq!(
        report.rejected,
        vec![
            GeometryError::TooFewVertices {
                zone: ZoneId(9),
                count: 2
            },
            GeometryError::ZeroArea { zone: ZoneId(10) },
        ]
    );
}

#[test]
fn duplicate_ids_keep_the_first_zone() {
    let zones = vec![
        rect(1, 0.0, 0.0, 10.0, 10.0),
        rect(1, 100.0, 0.0, 110.0, 10.0),
    ];
    let (graph, report) = ZoneGraphBuilder::default().build(&zones);
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.center(ZoneId(1)), Some(Vec2::new(5.0, 5.0)));
    assert_eq!(
        report.rejected,
        vec![GeometryError::DuplicateId { zone: ZoneId(1) }]
    );
}

#[test]
fn two_disjoint_contacts_produce_two_entries() {
    // A U-shaped zone whose two prongs both touch the bar above it.
    let u_shape = Zone::new(
        1,
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(30.0, 20.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ],
    );
    let bar = rect(2, 0.0, 20.0, 30.0, 30.0);
    let zones = [u_shape, bar];

    let (graph, report) = ZoneGraphBuilder::default().build(&zones);
    assert_eq!(report.concave, vec![ZoneId(1)]);

    let from_u = graph.neighbors(ZoneId(1));
    let from_bar = graph.neighbors(ZoneId(2));
    assert_eq!(from_u.len(), 2);
    assert_eq!(from_bar.len(), 2);
    for entry in from_u {
        assert_eq!(entry.zone_id, ZoneId(2));
        assert!((entry.border_length() - 10.0).abs() < 1e-5);
    }
    assert!(
        (from_u[0].border_center.x - from_u[1].border_center.x).abs() > 15.0,
        "contacts must stay separate"
    );
    assert!(asymmetric_entries(&graph, 1e-4).is_empty());
}

#[test]
fn zone_at_locates_points_and_prefers_lower_ids_on_borders() {
    let zones = row_of_three();
    let (graph, _) = ZoneGraphBuilder::default().build(&zones);
    assert_eq!(graph.zone_at(Vec2::new(15.0, 5.0)), Some(ZoneId(2)));
    assert_eq!(graph.zone_at(Vec2::new(10.0, 5.0)), Some(ZoneId(1)));
    assert_eq!(graph.zone_at(Vec2::new(50.0, 5.0)), None);
}

#[test]
fn larger_epsilon_rejects_short_borders() {
    let zones = vec![rect(1, 0.0, 0.0, 10.0, 10.0), rect(2, 10.0, 9.5, 20.0, 20.0)];
    let (graph, _) = ZoneGraphBuilder::default().build(&zones);
    assert_eq!(graph.edge_count(), 2);

    let strict = ZoneGraphBuilder::new(GeometryConfig {
        border_epsilon: 1.0,
        ..GeometryConfig::default()
    });
    let (graph, _) = strict.build(&zones);
    assert_eq!(graph.edge_count(), 0);
}

fn grid_zones(cells: &[bool], width: usize, size: f32) -> Vec<Zone> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, present)| **present)
        .map(|(i, _)| {
            let x = (i % width) as f32 * size;
            let y = (i / width) as f32 * size;
            rect(i as u16 + 1, x, y, x + size, y + size)
        })
        .collect()
}

proptest! {
    #[test]
    fn grid_layouts_link_exactly_orthogonal_cells(
        cells in proptest::collection::vec(any::<bool>(), 16),
        size in 1u8..40,
    ) {
        let width = 4;
        let size = f32::from(size);
        let zones = grid_zones(&cells, width, size);
        let (graph, report) = ZoneGraphBuilder::default().build(&zones);
        prop_assert!(report.is_clean());
        prop_assert!(asymmetric_entries(&graph, 1e-3).is_empty());

        for (i, present) in cells.iter().enumerate() {
            if !*present {
                prop_assert!(!graph.contains(ZoneId(i as u16 + 1)));
                continue;
            }
            let (x, y) = (i % width, i / width);
            for (j, other) in cells.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (ox, oy) = (j % width, j / width);
                let orthogonal = x.abs_diff(ox) + y.abs_diff(oy) == 1;
                let linked = graph
                    .neighbor_index(ZoneId(i as u16 + 1), ZoneId(j as u16 + 1))
                    .is_some();
                prop_assert_eq!(linked, *other && orthogonal);
            }
        }
    }
}
