use bspgraph_api::graph::PGraph;
use bspgraph_runtime::io::{load_graph, EdgeListFormat, InputFormat};
use bspgraph_runtime::job::SsspJob;
use bspgraph_runtime::plan::job_spec::{ExecutionSpec, GraphSpec, JobSpec};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/weighted_graph/edges.txt")
}

fn undirected() -> InputFormat {
    InputFormat::EdgeList(EdgeListFormat {
        delimiter: ' ',
        skip_header_lines: 1,
        symmetric: true,
    })
}

#[test]
fn test_read_weighted_edge_list() {
    let (graph, stats) = load_graph(&[fixture()], &undirected()).unwrap();

    assert_eq!(stats.records, 2184);
    assert_eq!(graph.num_vertices(), 500);
    assert_eq!(graph.num_edges(), 2184 * 2);
    assert!(graph.contains_vertex(&1));
}

#[test]
fn test_sssp_over_edge_list_reaches_every_vertex() {
    let spec = JobSpec {
        name: "edge-list".to_string(),
        start_vertex: 1,
        graph: GraphSpec {
            inputs: vec![fixture().display().to_string()],
            format: undirected(),
        },
        execution: ExecutionSpec {
            partitions: 4,
            parallelism: Some(2),
            ..ExecutionSpec::default()
        },
        output_dir: None,
    };
    let result = SsspJob::new(spec)
        .unwrap()
        .run(CancellationToken::new())
        .unwrap();

    // The fixture is connected.
    assert_eq!(result.vertices.len(), 500);
    assert!(result.vertices.values().all(|v| v.is_reached()));
    assert!(result.summary.converged);
}
