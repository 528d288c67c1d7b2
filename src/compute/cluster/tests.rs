use super::*;
use crate::display::DisplayId;
use clustermap_types::GeoBounds;
use std::collections::HashMap;

fn build(points: Vec<PointRecord>) -> SpatialIndex {
    SpatialIndex::build(points.into(), &ClusterConfig::default()).unwrap()
}

/// Deterministic pseudo-random points inside a box.
fn scattered(count: usize, bounds: GeoBounds, seed: u64) -> Vec<PointRecord> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|i| {
            let lon = bounds.west + next() * (bounds.east - bounds.west);
            let lat = bounds.south + next() * (bounds.north - bounds.south);
            PointRecord::new(i as i64, lon, lat)
        })
        .collect()
}

fn seattle() -> GeoBounds {
    GeoBounds::new(-122.45, 47.48, -122.22, 47.74)
}

/// Ids of the points each item stands for.
fn members(index: &SpatialIndex, item: &DisplayItem) -> Vec<PointId> {
    match item {
        DisplayItem::Point(point) => vec![point.point_id.clone()],
        DisplayItem::Cluster(cluster) => index
            .leaves(cluster.id, usize::MAX, 0)
            .unwrap()
            .into_iter()
            .map(|r| r.id.clone())
            .collect(),
    }
}

#[test]
fn test_five_close_points_cluster_then_split() {
    let points: Vec<_> = (0..5)
        .map(|i| PointRecord::new(i as i64, -122.3400 + i as f64 * 0.0004, 47.6100))
        .collect();
    let index = build(points);

    let at_ten = index.query(&seattle(), 10);
    assert_eq!(at_ten.len(), 1);
    let cluster = at_ten[0].as_cluster().expect("expected a cluster");
    assert_eq!(cluster.member_count, 5);
    assert_eq!(cluster.abbreviated_count, "5");
    assert!(cluster.expansion_zoom > 10);

    let at_seventeen = index.query(&seattle(), 17);
    assert_eq!(at_seventeen.len(), 5);
    assert!(at_seventeen.iter().all(|item| !item.is_cluster()));
}

#[test]
fn test_partition_of_points_in_view() {
    let points = scattered(400, seattle(), 7);
    let index = build(points.clone());

    let views = [
        seattle(),
        GeoBounds::new(-122.40, 47.55, -122.30, 47.65),
        GeoBounds::new(-122.33, 47.60, -122.32, 47.61),
    ];

    for bounds in views {
        let in_view: Vec<PointId> = points
            .iter()
            .filter(|p| bounds.contains_point(&p.location()))
            .map(|p| p.id.clone())
            .collect();

        for zoom in [0u8, 5, 9, 11, 13, 15, 17] {
            let items = index.query(&bounds, zoom);
            let mut seen: HashMap<PointId, usize> = HashMap::new();

            for item in &items {
                let covered = members(&index, item);
                assert!(
                    covered
                        .iter()
                        .any(|id| bounds.contains_point(&index.point(id).unwrap().location())),
                    "item {} at zoom {} has no member in view",
                    item.id(),
                    zoom
                );
                for id in covered {
                    *seen.entry(id).or_default() += 1;
                }
            }

            for id in &in_view {
                assert_eq!(seen.get(id), Some(&1), "point {} at zoom {}", id, zoom);
            }
        }
    }
}

#[test]
fn test_world_query_accounts_for_every_point() {
    let points = scattered(250, GeoBounds::new(-10.0, -10.0, 10.0, 10.0), 3);
    let index = build(points);

    for zoom in 0..=17u8 {
        let items = index.query(&GeoBounds::WORLD, zoom);
        let total: u32 = items.iter().map(|i| i.member_count()).sum();
        assert_eq!(total, 250, "zoom {}", zoom);
        assert_eq!(items.len(), index.node_count(zoom));
    }
}

#[test]
fn test_query_is_deterministic() {
    let points = scattered(300, seattle(), 11);
    let first = build(points.clone());
    let second = build(points);

    for zoom in [8u8, 12, 14] {
        let a = first.query(&seattle(), zoom);
        let b = first.query(&seattle(), zoom);
        let c = second.query(&seattle(), zoom);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }
}

#[test]
fn test_clusters_only_split_as_zoom_increases() {
    let points = scattered(500, seattle(), 21);
    let index = build(points);

    let mut previous = 0;
    for zoom in 0..=17u8 {
        let count = index.query(&GeoBounds::WORLD, zoom).len();
        assert!(count >= previous, "zoom {} has {} < {}", zoom, count, previous);
        previous = count;
    }
}

#[test]
fn test_max_clustering_zoom_shows_every_point() {
    let mut points = scattered(100, seattle(), 5);
    // Exact duplicates of a location still render separately.
    points.push(PointRecord::new(1000, -122.33, 47.61));
    points.push(PointRecord::new(1001, -122.33, 47.61));
    let index = build(points);

    for zoom in [17u8, 18, 22, 255] {
        let items = index.query(&seattle(), zoom);
        assert_eq!(items.len(), 102);
        assert!(items.iter().all(|item| !item.is_cluster()));
    }
}

#[test]
fn test_min_points_prevents_small_clusters() {
    let config = ClusterConfig::default().with_min_points(3);
    let pair = vec![
        PointRecord::new(1, 2.0, 48.0),
        PointRecord::new(2, 2.0001, 48.0),
    ];
    let index = SpatialIndex::build(pair.into(), &config).unwrap();
    let items = index.query(&GeoBounds::WORLD, 5);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| !item.is_cluster()));

    let triple = vec![
        PointRecord::new(1, 2.0, 48.0),
        PointRecord::new(2, 2.0001, 48.0),
        PointRecord::new(3, 2.0002, 48.0),
    ];
    let index = SpatialIndex::build(triple.into(), &config).unwrap();
    let items = index.query(&GeoBounds::WORLD, 5);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].member_count(), 3);
}

#[test]
fn test_isolated_point_never_clusters() {
    let index = build(vec![PointRecord::new(1, 139.69, 35.68)]);
    for zoom in 0..=17u8 {
        let items = index.query(&GeoBounds::WORLD, zoom);
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_cluster());
    }
}

#[test]
fn test_expansion_zoom_splits_cluster() {
    let points = scattered(300, seattle(), 9);
    let index = build(points);

    for zoom in [6u8, 10, 13] {
        for item in index.query(&seattle(), zoom) {
            let DisplayItem::Cluster(cluster) = item else {
                continue;
            };
            let expansion = index.expansion_zoom(cluster.id).unwrap();
            assert_eq!(expansion, cluster.expansion_zoom);
            assert!(expansion > zoom);

            let children = index.children(cluster.id).unwrap();
            assert!(children.len() >= 2);
            let child_total: u32 = children.iter().map(|c| c.member_count()).sum();
            assert_eq!(child_total, cluster.member_count);

            // At its expansion zoom the cluster's members span several items.
            let leaves = index.leaves(cluster.id, usize::MAX, 0).unwrap();
            let split = index.query(&GeoBounds::WORLD, expansion);
            let holders = split
                .iter()
                .filter(|item| {
                    let covered = members(&index, item);
                    leaves.iter().any(|leaf| covered.contains(&leaf.id))
                })
                .count();
            assert!(holders > 1);
        }
    }
}

#[test]
fn test_cluster_id_survives_zooming_out() {
    let points = vec![
        PointRecord::new(1, 10.0, 10.0),
        PointRecord::new(2, 10.0001, 10.0),
        PointRecord::new(3, -60.0, -30.0),
    ];
    let index = build(points);

    let ids: Vec<DisplayId> = [12u8, 11, 9, 6]
        .iter()
        .map(|&zoom| {
            let items = index.query(&GeoBounds::new(9.0, 9.0, 11.0, 11.0), zoom);
            assert_eq!(items.len(), 1);
            items[0].id()
        })
        .collect();

    assert!(matches!(ids[0], DisplayId::Cluster(_)));
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_unknown_cluster_is_reported() {
    let index = build(scattered(20, seattle(), 1));
    let bogus = ClusterId::new(3, 999_999);
    assert!(matches!(
        index.expansion_zoom(bogus),
        Err(ClusterError::UnknownCluster(id)) if id == bogus
    ));
    assert!(index.children(bogus).is_err());
    assert!(index.leaves(bogus, 10, 0).is_err());

    // The raw level has no clusters.
    assert!(index.cluster(ClusterId::new(17, 0)).is_err());
}

#[test]
fn test_leaves_paging() {
    let points: Vec<_> = (0..12)
        .map(|i| PointRecord::new(i as i64, 5.0 + i as f64 * 0.00005, 45.0))
        .collect();
    let index = build(points);

    let items = index.query(&GeoBounds::WORLD, 8);
    assert_eq!(items.len(), 1);
    let cluster = items[0].as_cluster().unwrap().id;

    let all = index.leaves(cluster, usize::MAX, 0).unwrap();
    assert_eq!(all.len(), 12);

    let first_page = index.leaves(cluster, 5, 0).unwrap();
    let second_page = index.leaves(cluster, 5, 5).unwrap();
    let last_page = index.leaves(cluster, 5, 10).unwrap();
    assert_eq!(first_page.len(), 5);
    assert_eq!(second_page.len(), 5);
    assert_eq!(last_page.len(), 2);
    assert_eq!(first_page[..], all[..5]);
    assert_eq!(second_page[..], all[5..10]);
}

#[test]
fn test_antimeridian_query() {
    let points = vec![
        PointRecord::new(1, 179.5, 0.0),
        PointRecord::new(2, -179.5, 0.0),
        PointRecord::new(3, 0.0, 0.0),
    ];
    let index = build(points);

    let bounds = GeoBounds::new(179.0, -1.0, 181.0, 1.0);
    let items = index.query(&bounds, 17);
    let ids: Vec<DisplayId> = items.iter().map(|i| i.id()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&DisplayId::Point(PointId::from(1))));
    assert!(ids.contains(&DisplayId::Point(PointId::from(2))));
}

#[test]
fn test_invalid_points_are_excluded_and_reported() {
    let points = vec![
        PointRecord::new(1, -122.33, 47.61),
        PointRecord::new(2, f64::NAN, 47.61),
        PointRecord::new(3, -122.33, 95.0),
        PointRecord::new(1, -122.30, 47.60),
    ];
    let index = build(points);

    assert_eq!(index.len(), 1);
    assert_eq!(index.source().len(), 4);
    assert_eq!(index.report().rejected_count(), 3);
    assert!(index.point(&PointId::from(2)).is_none());
    assert_eq!(index.point(&PointId::from(1)).unwrap().longitude, -122.33);
    assert_eq!(index.query(&GeoBounds::WORLD, 3).len(), 1);
}

#[test]
fn test_empty_index() {
    let index = build(Vec::new());
    assert!(index.is_empty());
    assert!(index.query(&GeoBounds::WORLD, 0).is_empty());
    assert!(index.query(&GeoBounds::WORLD, 20).is_empty());
}

#[test]
fn test_non_finite_bounds_return_nothing() {
    let index = build(scattered(10, seattle(), 2));
    let bounds = GeoBounds::new(f64::NAN, 47.0, -122.0, 48.0);
    assert!(index.query(&bounds, 10).is_empty());
}

#[test]
fn test_invalid_config_fails_build() {
    let config = ClusterConfig::default().with_cluster_radius(-1.0);
    let result = SpatialIndex::build(Vec::<PointRecord>::new().into(), &config);
    assert!(matches!(result, Err(ClusterError::InvalidConfig(_))));
}
