use std::collections::BTreeSet;
use std::fs;

use tunkrank_api::graph::PGraph;
use tunkrank_common::error::TunkRankError;
use tunkrank_runtime::graph::builder::GraphBuilder;
use tunkrank_runtime::io::generator::{generate_powerlaw, PowerLawSpec};
use tunkrank_runtime::io::loader::{load_graph, GraphFormat};
use tunkrank_runtime::io::writer::{save_partitioned, shard_path};

fn load(path: &std::path::Path, format: GraphFormat) -> GraphBuilder<f64> {
    let mut b = GraphBuilder::new(1.0f64);
    load_graph(&mut b, path, format).unwrap();
    b
}

#[test]
fn test_load_tsv_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let tsv = dir.path().join("g.tsv");
    fs::write(&tsv, "1\t2\n2\t3\n\n1\t3\n").unwrap();
    let b = load(&tsv, GraphFormat::Tsv);
    assert_eq!(b.num_vertices(), 3);
    assert_eq!(b.num_edges(), 3);
    assert_eq!(b.out_degree(1), Some(2));

    let csv = dir.path().join("g.csv");
    fs::write(&csv, "# follows\n10,20\n20,10\n").unwrap();
    let b = load(&csv, GraphFormat::Csv);
    assert_eq!(b.num_vertices(), 2);
    assert_eq!(b.num_edges(), 2);
}

#[test]
fn test_load_snap_skips_comments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("g.txt");
    fs::write(
        &path,
        "# Directed graph\n# FromNodeId\tToNodeId\n0\t1\n0   2\n\n2 0\n",
    )
    .unwrap();
    let b = load(&path, GraphFormat::Snap);
    assert_eq!(b.num_vertices(), 3);
    assert_eq!(b.num_edges(), 3);
    assert_eq!(b.out_degree(0), Some(2));
}

#[test]
fn test_load_adj_declares_vertices_without_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("g.adj");
    fs::write(&path, "1 2 2 3\n2 1 3\n7 0\n").unwrap();
    let b = load(&path, GraphFormat::Adj);
    assert_eq!(b.num_vertices(), 4);
    assert_eq!(b.num_edges(), 3);
    assert_eq!(b.out_degree(7), Some(0));
}

#[test]
fn test_malformed_lines_name_file_and_line() {
    let dir = tempfile::tempdir().unwrap();

    let adj = dir.path().join("bad.adj");
    fs::write(&adj, "1 1 2\n2 3 1\n").unwrap();
    let mut b = GraphBuilder::new(1.0f64);
    match load_graph(&mut b, &adj, GraphFormat::Adj) {
        Err(TunkRankError::Parse { path, line, .. }) => {
            assert_eq!(path, adj);
            assert_eq!(line, 2);
        }
        other => panic!("expected parse error, got {other:?}"),
    }

    let csv = dir.path().join("bad.csv");
    fs::write(&csv, "1,2\n3,x\n").unwrap();
    let mut b = GraphBuilder::new(1.0f64);
    match load_graph(&mut b, &csv, GraphFormat::Csv) {
        Err(TunkRankError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }

    let snap = dir.path().join("bad.txt");
    fs::write(&snap, "# header\n5\n").unwrap();
    let mut b = GraphBuilder::new(1.0f64);
    match load_graph(&mut b, &snap, GraphFormat::Snap) {
        Err(TunkRankError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_load_directory_reads_every_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("part-0"), "1\t2\n").unwrap();
    fs::write(dir.path().join("part-1"), "2\t3\n3\t1\n").unwrap();
    fs::write(dir.path().join(".hidden"), "garbage\n").unwrap();

    let mut b = GraphBuilder::new(1.0f64);
    let stats = load_graph(&mut b, dir.path(), GraphFormat::Tsv).unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.edges, 3);
    assert_eq!(b.num_vertices(), 3);
}

#[test]
fn test_unknown_format_is_config_error() {
    assert!(matches!(
        "graphml".parse::<GraphFormat>(),
        Err(TunkRankError::Config(_))
    ));
    assert_eq!("SNAP".parse::<GraphFormat>().unwrap(), GraphFormat::Snap);
}

#[test]
fn test_writer_round_trips_vertex_ids() {
    let mut b = GraphBuilder::new(1.0f64);
    for i in 0..50u64 {
        b.add_edge(i, (i * 7 + 3) % 50);
    }
    b.declare_vertex(1000);
    let mut graph = b.finalize(3);
    graph.transform_vertices(|id, v| *v = id as f64 / 4.0);

    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("out").join("rank");
    let files = save_partitioned(&graph, prefix.to_str().unwrap()).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files[0].to_str().unwrap().ends_with("rank_1_of_3"));
    assert!(files[2].to_str().unwrap().ends_with("rank_3_of_3"));

    let mut ids = BTreeSet::new();
    for file in &files {
        for line in fs::read_to_string(file).unwrap().lines() {
            let (id, value) = line.split_once('\t').unwrap();
            let id: u64 = id.parse().unwrap();
            let value: f64 = value.parse().unwrap();
            assert_eq!(value, id as f64 / 4.0);
            assert!(ids.insert(id), "vertex {id} written twice");
        }
    }
    let expected: BTreeSet<u64> = graph.vertices().iter().map(|v| v.id).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_powerlaw_is_deterministic_per_seed() {
    let spec = PowerLawSpec {
        seed: 42,
        ..PowerLawSpec::new(200)
    };
    let build = |spec: &PowerLawSpec| {
        let mut b = GraphBuilder::new(1.0f64);
        generate_powerlaw(&mut b, spec).unwrap();
        b.finalize(1)
    };
    let a = build(&spec);
    let b = build(&spec);
    assert_eq!(a.num_edges(), b.num_edges());
    for id in 0..200u64 {
        assert_eq!(a.out_neighbors(id), b.out_neighbors(id));
    }

    let other = build(&PowerLawSpec {
        seed: 43,
        ..spec.clone()
    });
    let differs = (0..200u64).any(|id| a.out_neighbors(id) != other.out_neighbors(id));
    assert!(differs);
}

#[test]
fn test_powerlaw_respects_degree_bounds() {
    let spec = PowerLawSpec {
        seed: 1,
        truncate: 10,
        ..PowerLawSpec::new(500)
    };
    let mut b = GraphBuilder::new(1.0f64);
    let edges = generate_powerlaw(&mut b, &spec).unwrap();
    let graph = b.finalize(4);

    assert_eq!(graph.num_vertices(), 500);
    assert_eq!(graph.num_edges(), edges);
    let mut total = 0;
    for id in 0..500u64 {
        let degree = graph.out_degree(id).unwrap();
        assert!((1..=10).contains(&degree), "vertex {id} has degree {degree}");
        assert!(!graph.out_neighbors(id).unwrap().contains(&id));
        total += degree;
    }
    assert_eq!(total, edges);
}

#[test]
fn test_tsv_accepts_any_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("g.tsv");
    fs::write(&path, "1 2\n2\t3\n3  \t 1\n").unwrap();
    let b = load(&path, GraphFormat::Tsv);
    assert_eq!(b.num_vertices(), 3);
    assert_eq!(b.num_edges(), 3);
    assert_eq!(b.out_degree(3), Some(1));
}

#[test]
fn test_failed_file_leaves_builder_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("g.tsv");
    fs::write(&path, "1\t2\n2\t3\nbroken\n").unwrap();
    let mut b = GraphBuilder::new(1.0f64);
    assert!(load_graph(&mut b, &path, GraphFormat::Tsv).is_err());
    assert_eq!(b.num_vertices(), 0);
    assert_eq!(b.num_edges(), 0);
}

#[test]
fn test_shard_names_are_one_based() {
    assert_eq!(
        shard_path("out/rank", 0, 4).to_str().unwrap(),
        "out/rank_1_of_4"
    );
    assert_eq!(shard_path("rank", 3, 4).to_str().unwrap(), "rank_4_of_4");
}

#[test]
fn test_failed_save_leaves_no_shards_behind() {
    let mut b = GraphBuilder::new(1.0f64);
    for i in 0..30u64 {
        b.add_edge(i, (i + 1) % 30);
    }
    let graph = b.finalize(3);

    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("rank");
    let prefix = prefix.to_str().unwrap();
    let second = shard_path(prefix, 1, 3);
    let blocker = format!("{}.tmp", second.display());
    fs::create_dir(&blocker).unwrap();

    assert!(save_partitioned(&graph, prefix).is_err());
    for index in 0..3 {
        let path = shard_path(prefix, index, 3);
        assert!(!path.exists(), "{} was left behind", path.display());
    }
    let first_staged = format!("{}.tmp", shard_path(prefix, 0, 3).display());
    assert!(!std::path::Path::new(&first_staged).exists());

    fs::remove_dir(&blocker).unwrap();
    let files = save_partitioned(&graph, prefix).unwrap();
    assert_eq!(files.len(), 3);
    let staged = fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".tmp")
        })
        .count();
    assert_eq!(staged, 0);
}

#[test]
fn test_powerlaw_rejects_empty_graph() {
    let mut b = GraphBuilder::new(1.0f64);
    assert!(matches!(
        generate_powerlaw(&mut b, &PowerLawSpec::new(0)),
        Err(TunkRankError::InvalidArgument(_))
    ));
    let bad_alpha = PowerLawSpec {
        alpha: -1.0,
        ..PowerLawSpec::new(10)
    };
    assert!(generate_powerlaw(&mut b, &bad_alpha).is_err());
}

#[test]
fn test_powerlaw_single_vertex_has_no_edges() {
    let mut b = GraphBuilder::new(1.0f64);
    assert_eq!(generate_powerlaw(&mut b, &PowerLawSpec::new(1)).unwrap(), 0);
    assert_eq!(b.num_vertices(), 1);
    assert_eq!(b.num_edges(), 0);
}

#[test]
fn test_powerlaw_in_degree_reverses_edges() {
    let spec = PowerLawSpec {
        seed: 7,
        truncate: 5,
        in_degree: true,
        ..PowerLawSpec::new(100)
    };
    let mut b = GraphBuilder::new(1.0f64);
    generate_powerlaw(&mut b, &spec).unwrap();
    let graph = b.finalize(2);
    for id in 0..100u64 {
        assert!((1..=5).contains(&graph.in_degree(id).unwrap()));
    }
}
