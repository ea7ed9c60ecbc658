use crate::algorithms::sssp::{PathValue, SsspAlgorithm, VertexId};
use crate::io::output::write_output;
use crate::io::{load_graph, LoadStats, SsspGraph};
use crate::plan::job_spec::JobSpec;
use crate::scheduler::superstep_coordinator::{RunSummary, SuperstepCoordinator};
use crate::shuffle::partitioner::HashPartitioner;
use bspgraph_common::error::{BspError, BspResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct JobResult {
    pub load: LoadStats,
    pub summary: RunSummary,
    pub vertices: BTreeMap<VertexId, PathValue>,
    pub output_files: Vec<PathBuf>,
}

/// Load, partition, iterate, write.
pub struct SsspJob {
    spec: JobSpec,
}

impl SsspJob {
    pub fn new(spec: JobSpec) -> BspResult<Self> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    #[tracing::instrument(skip(self, cancel), fields(job = %self.spec.name))]
    pub fn run(&self, cancel: CancellationToken) -> BspResult<JobResult> {
        let (graph, load) = load_graph(&self.spec.graph.inputs, &self.spec.graph.format)?;
        self.run_loaded(graph, load, cancel)
    }

    /// Runs on a graph that is already in memory. Output is written only
    /// after the coordinator returned successfully.
    pub fn run_loaded(
        &self,
        graph: SsspGraph,
        load: LoadStats,
        cancel: CancellationToken,
    ) -> BspResult<JobResult> {
        let start_vertex = self.spec.start_vertex;
        if !graph.contains_vertex(&start_vertex) {
            return Err(BspError::InvalidArgument(format!(
                "start vertex {start_vertex} is not in the graph"
            )));
        }

        let exec = &self.spec.execution;
        let mut algorithm = SsspAlgorithm::new(start_vertex);
        if !exec.combine_messages {
            algorithm = algorithm.without_combiner();
        }
        let partitioned = graph.partition(exec.partitions, Arc::new(HashPartitioner));
        tracing::info!(
            start_vertex,
            partitions = partitioned.partitions(),
            vertices = load.vertices,
            edges = load.edges,
            "graph partitioned"
        );

        let mut coordinator =
            SuperstepCoordinator::new(partitioned, &algorithm, exec.coordinator_options())?
                .with_cancellation(cancel);
        let summary = coordinator.run()?;
        let result_graph = coordinator.into_graph();

        let output_files = match &self.spec.output_dir {
            Some(dir) => write_output(dir, &result_graph)?,
            None => Vec::new(),
        };
        let vertices = result_graph.vertex_map();
        let reached = vertices.values().filter(|v| v.is_reached()).count();
        tracing::info!(
            supersteps = summary.supersteps,
            converged = summary.converged,
            reached,
            "job finished"
        );

        Ok(JobResult {
            load,
            summary,
            vertices,
            output_files,
        })
    }
}
