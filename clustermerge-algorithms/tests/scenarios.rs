use approx::assert_relative_eq;
use clustermerge_algorithms::{
    consolidate_event, DiscardReason, EventMerger, MergeConfig, MergeOutcome, MergePolicy,
    NearestNormalMerger,
};
use clustermerge_core::{Cell, Cluster, Event};

fn build(cells: Vec<Cell>, n_clusters: i32) -> Event {
    let clusters = (0..n_clusters)
        .map(|i| Cluster::from_cells(i, cells.iter().filter(|c| c.cluster_id == i)))
        .collect();
    Event::new(100, 0.25, clusters, cells)
}

fn run(event: Event) -> MergeOutcome {
    consolidate_event(event, MergePolicy::EachLow, &MergeConfig::default()).unwrap()
}

#[test]
fn test_single_cluster_two_cells_20_kev_discarded() {
    let cells = vec![
        Cell::new(30.0, 30.0, 12.0, 7.0, 0),
        Cell::new(31.0, 30.0, 8.0, 7.0, 0),
    ];
    let event = build(cells, 1);
    assert_eq!(event.clusters[0].n_cells, 2);
    assert_relative_eq!(event.clusters[0].energy, 20.0);

    assert_eq!(
        run(event),
        MergeOutcome::Discarded(DiscardReason::SingleLowCluster)
    );
}

#[test]
fn test_single_cluster_three_cells_20_kev_kept_unchanged() {
    let cells = vec![
        Cell::new(30.0, 30.0, 10.0, 7.0, 0),
        Cell::new(31.0, 30.0, 5.0, 7.0, 0),
        Cell::new(31.0, 31.0, 5.0, 8.0, 0),
    ];
    let event = build(cells, 1);
    let outcome = run(event.clone());
    assert_eq!(outcome.into_event(), Some(event));
}

#[test]
fn test_noise_cluster_merges_into_neighbour() {
    // A: 1 cell, 10 keV at (50, 50), t = 100
    // B: 5 cells, 60 keV centred on (52, 49), mean t = 101
    let mut cells = vec![Cell::new(50.0, 50.0, 10.0, 100.0, 0)];
    for (dx, dt) in [(-1.0, -1.0), (1.0, 1.0), (0.0, 0.0), (-0.5, 0.5), (0.5, -0.5)] {
        cells.push(Cell::new(52.0 + dx, 49.0, 12.0, 101.0 + dt, 1));
    }
    let event = build(cells, 2);
    let b = event.clusters[1];
    assert_eq!(b.n_cells, 5);
    assert_relative_eq!(b.energy, 60.0);
    assert_relative_eq!(b.weighted_x, 52.0);
    assert_relative_eq!(b.avg_t, 101.0);

    let MergeOutcome::Consolidated { event, stats } = run(event) else {
        panic!("event should survive");
    };
    assert_eq!(stats.merges, 1);
    assert_eq!(event.cluster_count(), 1);

    let merged = event.clusters[0];
    assert_eq!(merged.index, 0);
    assert_eq!(merged.n_cells, 6);
    assert_relative_eq!(merged.energy, 70.0);
    // (50*10 + 52*60) / 70
    assert_relative_eq!(merged.weighted_x, 3620.0 / 70.0, epsilon = 1e-9);
    assert_relative_eq!(merged.avg_t, 605.0 / 6.0, epsilon = 1e-9);
    assert!(event.cells.iter().all(|cell| cell.cluster_id == 0));
}

#[test]
fn test_noise_cluster_outside_window_is_kept() {
    let cells = vec![
        Cell::new(50.0, 50.0, 40.0, 100.0, 0),
        Cell::new(50.0, 60.5, 10.0, 100.0, 1),
    ];
    let event = build(cells, 2);
    let outcome = run(event.clone());
    assert_eq!(outcome.merges(), 0);
    assert_eq!(outcome.into_event(), Some(event));
}

#[test]
fn test_cascading_merge_uses_updated_centroid() {
    // N at x = 50; L1 at x = 58 (in window); L2 at x = 61.5 is 11.5 away
    // from N before any merge but 8.8 away once L1 has pulled N to 52.7.
    let cells = vec![
        Cell::new(50.0, 50.0, 40.0, 100.0, 0),
        Cell::new(58.0, 50.0, 20.0, 100.0, 1),
        Cell::new(61.5, 50.0, 10.0, 100.0, 2),
    ];
    let event = build(cells, 3);

    // L2 alone cannot reach N
    let mut without_l1 = event.clone();
    without_l1.clusters.remove(1);
    without_l1.cells.remove(1);
    without_l1.clusters[1].index = 1;
    without_l1.cells[1].cluster_id = 1;
    assert_eq!(run(without_l1).merges(), 0);

    let MergeOutcome::Consolidated { event, stats } = run(event) else {
        panic!("event should survive");
    };
    assert_eq!(stats.merges, 2);
    assert_eq!(event.cluster_count(), 1);
    let merged = event.clusters[0];
    assert_eq!(merged.n_cells, 3);
    assert_relative_eq!(merged.energy, 70.0);
    assert_relative_eq!(merged.weighted_x, 3775.0 / 70.0, epsilon = 1e-9);
    assert!(event.cells.iter().all(|cell| cell.cluster_id == 0));
}

#[test]
fn test_cascading_merge_can_change_target() {
    // N0 (t = 100) and N1 (t = 112) are both in the window of L3 (t = 116).
    // On its own L3 joins N1. When L2 (t = 130) is merged into N0 first,
    // N0's mean time moves to 115 and L3 joins N0 instead.
    let n0 = Cell::new(50.0, 50.0, 40.0, 100.0, 0);
    let n1 = Cell::new(55.0, 50.0, 40.0, 112.0, 1);
    let l2 = Cell::new(42.0, 50.0, 5.0, 130.0, 2);
    let l3 = Cell::new(52.0, 50.0, 5.0, 116.0, 3);

    let mut lone_l3 = l3;
    lone_l3.cluster_id = 2;
    let MergeOutcome::Consolidated { event, .. } = run(build(vec![n0, n1, lone_l3], 3)) else {
        panic!("event should survive");
    };
    assert_eq!(
        event.cells.iter().map(|c| c.cluster_id).collect::<Vec<_>>(),
        vec![0, 1, 1]
    );

    let MergeOutcome::Consolidated { event, stats } = run(build(vec![n0, n1, l2, l3], 4)) else {
        panic!("event should survive");
    };
    assert_eq!(stats.merges, 2);
    assert_eq!(
        event.cells.iter().map(|c| c.cluster_id).collect::<Vec<_>>(),
        vec![0, 1, 0, 0]
    );
    assert_relative_eq!(event.clusters[0].energy, 50.0);
    assert_relative_eq!(event.clusters[1].energy, 40.0);
}

#[test]
fn test_all_noise_event_keeps_every_cluster() {
    let cells = vec![
        Cell::new(10.0, 10.0, 5.0, 1.0, 0),
        Cell::new(12.0, 10.0, 6.0, 1.0, 1),
        Cell::new(14.0, 10.0, 7.0, 1.0, 2),
        Cell::new(14.0, 11.0, 7.0, 1.0, 2),
    ];
    let event = build(cells, 3);
    let outcome = NearestNormalMerger::default().merge(event.clone()).unwrap();
    assert_eq!(outcome.merges(), 0);
    assert_eq!(outcome.into_event(), Some(event));
}

#[test]
fn test_sparse_input_indices_are_compacted() {
    let cells = vec![
        Cell::new(10.0, 10.0, 50.0, 1.0, 3),
        Cell::new(11.0, 10.0, 5.0, 1.0, 9),
        Cell::new(80.0, 80.0, 50.0, 1.0, 12),
    ];
    let clusters = [12, 3, 9]
        .iter()
        .map(|&i| Cluster::from_cells(i, cells.iter().filter(|c| c.cluster_id == i)))
        .collect();
    let event = Event::new(1, 0.0, clusters, cells);

    let MergeOutcome::Consolidated { event, .. } = run(event) else {
        panic!("event should survive");
    };
    assert_eq!(
        event.clusters.iter().map(|c| c.index).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_relative_eq!(event.clusters[0].energy, 55.0);
    assert_relative_eq!(event.clusters[1].energy, 50.0);
    assert_eq!(
        event.cells.iter().map(|c| c.cluster_id).collect::<Vec<_>>(),
        vec![0, 0, 1]
    );
}

#[test]
fn test_dangling_reference_is_reported() {
    let mut event = build(vec![Cell::new(1.0, 1.0, 50.0, 1.0, 0)], 1);
    event.cells.push(Cell::new(2.0, 2.0, 5.0, 1.0, 1));

    let err = consolidate_event(event, MergePolicy::EachLow, &MergeConfig::default())
        .unwrap_err();
    assert!(err.is_integrity());
}
