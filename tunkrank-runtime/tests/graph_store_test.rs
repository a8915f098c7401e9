use tunkrank_api::graph::PGraph;
use tunkrank_common::error::TunkRankError;
use tunkrank_common::types::Edge;
use tunkrank_runtime::graph::builder::GraphBuilder;
use tunkrank_runtime::scheduler::ActiveSet;
use tunkrank_runtime::shuffle::partitioner::partition_of;
use tunkrank_runtime::shuffle::{LocalShuffle, SignalShuffle};

#[test]
fn test_out_degree_counts_duplicates_and_self_loops() {
    let mut b = GraphBuilder::new(0.0f64);
    b.add_edges(vec![
        Edge::new(1, 2),
        Edge::new(1, 2),
        Edge::new(1, 3),
        Edge::new(3, 3),
    ]);
    assert_eq!(b.out_degree(1), Some(3));
    assert_eq!(b.out_degree(2), Some(0));
    assert_eq!(b.out_degree(3), Some(1));
    assert_eq!(b.out_degree(9), None);
    assert_eq!(b.num_vertices(), 3);
    assert_eq!(b.num_edges(), 4);
}

#[test]
fn test_add_vertex_overwrites_implicit_value() {
    let mut b = GraphBuilder::new(0.0f64);
    b.add_edge(1, 2);
    b.add_vertex(2, 5.0);
    b.add_vertex(4, 7.0);
    let g = b.finalize(2);
    assert_eq!(g.value_of(1), Some(0.0));
    assert_eq!(g.value_of(2), Some(5.0));
    assert_eq!(g.value_of(4), Some(7.0));
    assert_eq!(g.num_vertices(), 3);
}

#[test]
fn test_adjacency_survives_partitioning() {
    let mut b = GraphBuilder::new(1.0f64);
    b.add_edges(vec![Edge::new(1, 2), Edge::new(3, 2), Edge::new(2, 4)]);
    b.declare_vertex(5);
    let g = b.finalize(3);

    assert_eq!(g.num_partitions(), 3);
    assert_eq!(g.num_vertices(), 5);
    assert_eq!(g.num_edges(), 3);

    let mut followers = g.in_neighbors(2).unwrap();
    followers.sort_unstable();
    assert_eq!(followers, vec![1, 3]);
    assert_eq!(g.out_neighbors(2).unwrap(), vec![4]);
    assert_eq!(g.in_degree(2), Some(2));
    assert_eq!(g.out_degree(2), Some(1));
    assert_eq!(g.in_degree(5), Some(0));
    assert_eq!(g.out_degree(5), Some(0));
    assert!(g.contains(5));
    assert!(!g.contains(6));
    assert_eq!(g.in_neighbors(6), None);

    for id in [1, 2, 3, 4, 5] {
        let addr = g.addr_of(id).unwrap();
        assert_eq!(g.id_at(addr), id);
        assert_eq!(addr.partition as usize, partition_of(id, 3));
    }
}

#[test]
fn test_transform_vertices_touches_every_vertex() {
    let mut b = GraphBuilder::new(0.0f64);
    b.add_edges((0..20u64).map(|i| Edge::new(i, (i + 1) % 20)));
    let mut g = b.finalize(4);
    g.transform_vertices(|id, value| *value = id as f64 * 2.0);

    let vertices = g.vertices();
    assert_eq!(vertices.len(), 20);
    for v in vertices {
        assert_eq!(v.value, v.id as f64 * 2.0);
    }
}

#[test]
fn test_partition_of_is_stable_and_in_range() {
    for id in 0..1000u64 {
        let p = partition_of(id, 7);
        assert!(p < 7);
        assert_eq!(p, partition_of(id, 7));
        assert_eq!(partition_of(id, 1), 0);
    }
    assert_eq!(partition_of(42, 0), 0);
}

#[test]
fn test_active_set_collapses_duplicates() {
    let mut set = ActiveSet::empty(4);
    assert!(set.is_empty());
    assert!(set.activate(2));
    assert!(!set.activate(2));
    assert!(set.activate(0));
    assert_eq!(set.count(), 2);
    assert_eq!(set.iter_active().collect::<Vec<_>>(), vec![0, 2]);

    set.activate_all();
    assert_eq!(set.count(), 4);
    assert_eq!(ActiveSet::full(3).count(), 3);
}

#[test]
fn test_shuffle_routes_signals_to_owning_shard() {
    let mut b = GraphBuilder::new(0.0f64);
    b.add_edges(vec![Edge::new(1, 2), Edge::new(2, 3)]);
    let g = b.finalize(2);
    let mut next: Vec<ActiveSet> = g
        .partitions()
        .iter()
        .map(|p| ActiveSet::empty(p.len()))
        .collect();

    let activated = LocalShuffle
        .route_outbox(&g, vec![3, 3, 1], &mut next)
        .unwrap();
    assert_eq!(activated, 2);
    for id in [1, 3] {
        let addr = g.addr_of(id).unwrap();
        assert!(next[addr.partition as usize].is_active(addr.local as usize));
    }

    let err = LocalShuffle.route_outbox(&g, vec![99], &mut next).unwrap_err();
    assert!(matches!(err, TunkRankError::InvalidArgument(_)));
}
