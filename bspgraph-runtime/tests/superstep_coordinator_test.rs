use bspgraph_api::function::{
    VertexCentricComputeAlgorithm, VertexCentricComputeFuncContext, VertexCentricComputeFunction,
};
use bspgraph_common::error::{BspError, BspResult};
use bspgraph_common::types::{Edge, Vertex};
use bspgraph_runtime::algorithms::sssp::{PathValue, SsspAlgorithm};
use bspgraph_runtime::graph::partitioned_graph::PartitionedGraph;
use bspgraph_runtime::scheduler::superstep_coordinator::{
    CoordinatorOptions, NonConvergencePolicy, SuperstepCoordinator,
};
use tokio_util::sync::CancellationToken;

/// Forwards a counter along every out edge and never halts.
struct PingPong;

impl VertexCentricComputeFunction<u64, u64, u32, u64> for PingPong {
    fn compute(
        &mut self,
        _vertex_id: &u64,
        message_iterator: &mut dyn Iterator<Item = u64>,
        context: &mut dyn VertexCentricComputeFuncContext<u64, u64, u32, u64>,
    ) -> BspResult<()> {
        let received = message_iterator.count() as u64;
        let value = context.vertex_value().copied().unwrap_or(0) + received;
        context.set_new_vertex_value(value);
        let targets: Vec<u64> = context.edges().map(|e| e.target_id).collect();
        for t in targets {
            context.send_message(t, value);
        }
        Ok(())
    }
}

/// Relays once, then fails on `fail_on` at `fail_at`.
struct Faulty {
    fail_on: u64,
    fail_at: u64,
}

impl VertexCentricComputeFunction<u64, u64, u32, u64> for Faulty {
    fn compute(
        &mut self,
        vertex_id: &u64,
        _message_iterator: &mut dyn Iterator<Item = u64>,
        context: &mut dyn VertexCentricComputeFuncContext<u64, u64, u32, u64>,
    ) -> BspResult<()> {
        if *vertex_id == self.fail_on && context.superstep() == self.fail_at {
            return Err(BspError::Internal("boom".to_string()));
        }
        if context.superstep() == 0 {
            let targets: Vec<u64> = context.edges().map(|e| e.target_id).collect();
            for t in targets {
                context.send_message(t, 1);
            }
        }
        context.vote_to_halt();
        Ok(())
    }
}

enum Program {
    PingPong,
    Faulty { fail_on: u64, fail_at: u64 },
}

impl VertexCentricComputeAlgorithm<u64, u64, u32, u64> for Program {
    fn name(&self) -> &str {
        match self {
            Program::PingPong => "ping-pong",
            Program::Faulty { .. } => "faulty",
        }
    }

    fn create_function(&self) -> Box<dyn VertexCentricComputeFunction<u64, u64, u32, u64>> {
        match self {
            Program::PingPong => Box::new(PingPong),
            Program::Faulty { fail_on, fail_at } => Box::new(Faulty {
                fail_on: *fail_on,
                fail_at: *fail_at,
            }),
        }
    }
}

fn cycle(n: u64) -> PartitionedGraph<u64, u64, u32> {
    let vertices = (0..n).map(|i| Vertex::new(i, 0)).collect();
    let edges = (0..n).map(|i| Edge::new(i, (i + 1) % n, 1)).collect();
    PartitionedGraph::new(vertices, edges, 2)
}

fn bounded(max_supersteps: u64, non_convergence: NonConvergencePolicy) -> CoordinatorOptions {
    CoordinatorOptions {
        max_supersteps,
        non_convergence,
        parallelism: Some(2),
    }
}

#[test]
fn test_non_convergence_fails_by_default() {
    let mut coordinator = SuperstepCoordinator::new(
        cycle(4),
        &Program::PingPong,
        bounded(5, NonConvergencePolicy::Fail),
    )
    .unwrap();
    let err = coordinator.run().unwrap_err();
    assert!(matches!(err, BspError::NonConvergence { max_supersteps: 5 }), "got {err}");
    assert_eq!(coordinator.superstep(), 5);
}

#[test]
fn test_non_convergence_returns_partial_state() {
    let mut coordinator = SuperstepCoordinator::new(
        cycle(4),
        &Program::PingPong,
        bounded(5, NonConvergencePolicy::ReturnPartial),
    )
    .unwrap();
    let summary = coordinator.run().unwrap();
    assert!(!summary.converged);
    assert_eq!(summary.supersteps, 5);
    assert_eq!(summary.stats.len(), 5);
    assert!(summary.stats.iter().all(|s| s.messages_sent == 4));

    // Each vertex received one message per superstep after the first.
    let values = coordinator.into_graph().vertex_map();
    assert!(values.values().all(|v| *v > 0));
}

#[test]
fn test_vertex_failure_names_vertex_and_superstep() {
    let program = Program::Faulty {
        fail_on: 2,
        fail_at: 1,
    };
    let mut coordinator =
        SuperstepCoordinator::new(cycle(4), &program, CoordinatorOptions::default()).unwrap();
    match coordinator.run().unwrap_err() {
        BspError::VertexCompute {
            vertex_id,
            superstep,
            message,
        } => {
            assert_eq!(vertex_id, "2");
            assert_eq!(superstep, 1);
            assert!(message.contains("boom"), "{message}");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_cancelled_before_first_superstep() {
    let token = CancellationToken::new();
    token.cancel();
    let mut coordinator =
        SuperstepCoordinator::new(cycle(3), &Program::PingPong, CoordinatorOptions::default())
            .unwrap()
            .with_cancellation(token);
    let err = coordinator.run().unwrap_err();
    assert!(matches!(err, BspError::Cancelled { superstep: 0 }), "got {err}");
    assert_eq!(coordinator.superstep(), 0);
}

#[test]
fn test_cancel_between_supersteps() {
    let mut coordinator =
        SuperstepCoordinator::new(cycle(3), &Program::PingPong, CoordinatorOptions::default())
            .unwrap();
    coordinator.run_superstep().unwrap();
    coordinator.run_superstep().unwrap();
    coordinator.cancellation_token().cancel();
    let err = coordinator.run().unwrap_err();
    assert!(matches!(err, BspError::Cancelled { superstep: 2 }), "got {err}");
}

#[test]
fn test_message_to_missing_vertex_is_reported() {
    // Vertex 99 only appears as an edge target.
    let graph: PartitionedGraph<u64, u64, u32> =
        PartitionedGraph::new(vec![Vertex::new(1, 0)], vec![Edge::new(1, 99, 1)], 2);
    let program = Program::Faulty {
        fail_on: u64::MAX,
        fail_at: 0,
    };
    let mut coordinator =
        SuperstepCoordinator::new(graph, &program, CoordinatorOptions::default()).unwrap();
    let err = coordinator.run().unwrap_err();
    match err {
        BspError::UndeliverableMessage { target, superstep } => {
            assert_eq!(target, "99");
            assert_eq!(superstep, 1);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_superstep_stats() {
    let vertices = (0..4u64).map(|i| Vertex::new(i, PathValue::unreached())).collect();
    let edges: Vec<Edge<u64, u32>> = vec![
        Edge::new(0, 1, 1),
        Edge::new(0, 2, 1),
        Edge::new(1, 3, 1),
        Edge::new(2, 3, 1),
    ];
    let graph = PartitionedGraph::new(vertices, edges, 3);
    let mut coordinator =
        SuperstepCoordinator::new(graph, &SsspAlgorithm::new(0), CoordinatorOptions::default())
            .unwrap();
    let summary = coordinator.run().unwrap();

    assert!(summary.converged);
    assert_eq!(summary.supersteps, 3);
    let first = &summary.stats[0];
    assert_eq!(first.computed_vertices, 4);
    assert_eq!(first.messages_sent, 2);
    // 1 and 2 both offer a cost to 3; the combiner folds them.
    let second = &summary.stats[1];
    assert_eq!(second.computed_vertices, 2);
    assert_eq!(second.messages_sent, 2);
    assert_eq!(second.messages_delivered, 1);
    let last = summary.stats.last().unwrap();
    assert_eq!(last.halted_vertices, 4);
    assert!(last.converged());
    assert_eq!(summary.total_messages(), 4);

    let values = coordinator.into_graph().vertex_map();
    assert_eq!(values[&3].cost, 2);
    assert_eq!(values[&3].predecessor, Some(1));
}

#[test]
fn test_rerun_after_convergence_is_quiet() {
    let vertices = (0..3u64).map(|i| Vertex::new(i, PathValue::unreached())).collect();
    let edges: Vec<Edge<u64, u32>> = vec![Edge::new(0, 1, 2), Edge::new(1, 2, 2)];
    let mut coordinator = SuperstepCoordinator::new(
        PartitionedGraph::new(vertices, edges, 2),
        &SsspAlgorithm::new(0),
        CoordinatorOptions::default(),
    )
    .unwrap();
    coordinator.run().unwrap();

    let extra = coordinator.run_superstep().unwrap();
    assert_eq!(extra.computed_vertices, 0);
    assert_eq!(extra.updated_vertices, 0);
    assert_eq!(extra.messages_sent, 0);
}
