use crate::graph::partitioned_graph::PartitionedGraph;
use crate::graph::{GraphValue, VertexKey};
use crate::scheduler::worker::{LocalWorker, WorkerReport};
use crate::shuffle::partitioner::Partitioner;
use crate::shuffle::MessageRouter;
use bspgraph_api::function::VertexCentricComputeAlgorithm;
use bspgraph_common::error::{BspError, BspResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// What to do when `max_supersteps` runs out before convergence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonConvergencePolicy {
    #[default]
    Fail,
    ReturnPartial,
}

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub max_supersteps: u64,
    pub non_convergence: NonConvergencePolicy,
    /// Size of a dedicated rayon pool. `None` uses the global pool.
    pub parallelism: Option<usize>,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            max_supersteps: u64::MAX,
            non_convergence: NonConvergencePolicy::Fail,
            parallelism: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperstepStats {
    pub superstep: u64,
    pub computed_vertices: usize,
    pub updated_vertices: usize,
    /// Vertices that will compute in the next superstep.
    pub active_vertices: usize,
    pub halted_vertices: usize,
    pub messages_sent: usize,
    pub messages_delivered: usize,
}

impl SuperstepStats {
    /// Every vertex halted and nothing in flight.
    pub fn converged(&self) -> bool {
        self.messages_delivered == 0 && self.active_vertices == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub supersteps: u64,
    pub converged: bool,
    pub stats: Vec<SuperstepStats>,
}

impl RunSummary {
    pub fn total_messages(&self) -> usize {
        self.stats.iter().map(|s| s.messages_sent).sum()
    }
}

#[derive(Debug, Clone)]
enum State {
    Init,
    Running { superstep: u64 },
    Finished { executed: u64, converged: bool },
}

/// Drives the barrier synchronized superstep loop over all workers.
pub struct SuperstepCoordinator<K, VV, EV, M> {
    workers: Vec<LocalWorker<K, VV, EV, M>>,
    router: MessageRouter<K, M>,
    partitioner: Arc<dyn Partitioner<K>>,
    options: CoordinatorOptions,
    cancel: CancellationToken,
    pool: Option<rayon::ThreadPool>,
    superstep: u64,
    algorithm: String,
}

impl<K, VV, EV, M> SuperstepCoordinator<K, VV, EV, M>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
    M: Send + Sync + 'static,
{
    pub fn new<A>(
        graph: PartitionedGraph<K, VV, EV>,
        algorithm: &A,
        options: CoordinatorOptions,
    ) -> BspResult<Self>
    where
        A: VertexCentricComputeAlgorithm<K, VV, EV, M>,
    {
        let (partitions, partitioner) = graph.into_parts();
        let router = MessageRouter::new(partitioner.clone(), partitions.len())
            .with_combiner(algorithm.create_combiner());
        let workers = partitions
            .into_iter()
            .map(|partition| LocalWorker::new(partition, algorithm.create_function()))
            .collect();
        let pool = match options.parallelism {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads.max(1))
                    .thread_name(|i| format!("bsp-worker-{i}"))
                    .build()
                    .map_err(|e| BspError::Internal(format!("worker pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            workers,
            router,
            partitioner,
            options,
            cancel: CancellationToken::new(),
            pool,
            superstep: 0,
            algorithm: algorithm.name().to_string(),
        })
    }

    /// Checked before every superstep, never inside one.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of supersteps completed so far.
    pub fn superstep(&self) -> u64 {
        self.superstep
    }

    pub fn run(&mut self) -> BspResult<RunSummary> {
        let mut state = State::Init;
        let mut stats: Vec<SuperstepStats> = Vec::new();

        loop {
            state = match state {
                State::Init => {
                    tracing::info!(
                        algorithm = %self.algorithm,
                        workers = self.workers.len(),
                        max_supersteps = self.options.max_supersteps,
                        "starting superstep loop"
                    );
                    State::Running {
                        superstep: self.superstep,
                    }
                }
                State::Running { superstep } => {
                    if self.cancel.is_cancelled() {
                        tracing::warn!(superstep, "run cancelled");
                        return Err(BspError::Cancelled { superstep });
                    }
                    if superstep >= self.options.max_supersteps {
                        match self.options.non_convergence {
                            NonConvergencePolicy::Fail => {
                                tracing::warn!(superstep, "superstep bound reached");
                                return Err(BspError::NonConvergence {
                                    max_supersteps: self.options.max_supersteps,
                                });
                            }
                            NonConvergencePolicy::ReturnPartial => {
                                tracing::warn!(superstep, "superstep bound reached, keeping partial state");
                                State::Finished {
                                    executed: superstep,
                                    converged: false,
                                }
                            }
                        }
                    } else {
                        let round = self.run_superstep()?;
                        let converged = round.converged();
                        stats.push(round);
                        if converged {
                            State::Finished {
                                executed: superstep + 1,
                                converged: true,
                            }
                        } else {
                            State::Running {
                                superstep: superstep + 1,
                            }
                        }
                    }
                }
                State::Finished {
                    executed,
                    converged,
                } => {
                    tracing::info!(supersteps = executed, converged, "superstep loop finished");
                    return Ok(RunSummary {
                        supersteps: executed,
                        converged,
                        stats,
                    });
                }
            };
        }
    }

    /// One compute phase, the barrier, and the message exchange.
    pub fn run_superstep(&mut self) -> BspResult<SuperstepStats> {
        let superstep = self.superstep;
        let start = Instant::now();

        let reports = self.compute_all(superstep);
        // Workers are in partition order, so the reported failure is stable.
        let reports: Vec<WorkerReport> = reports.into_iter().collect::<BspResult<_>>()?;

        let outboxes = self
            .workers
            .iter_mut()
            .map(|w| std::mem::take(&mut w.outbox))
            .collect();
        let routed = self.router.route(outboxes);
        for (worker, inbox) in self.workers.iter_mut().zip(routed.inboxes) {
            worker.inbox = inbox;
        }
        self.superstep += 1;

        let total_vertices: usize = self
            .workers
            .iter()
            .map(|w| w.partition.num_vertices())
            .sum();
        let active = reports.iter().map(|r| r.active).sum::<usize>();
        let stats = SuperstepStats {
            superstep,
            computed_vertices: reports.iter().map(|r| r.computed).sum(),
            updated_vertices: reports.iter().map(|r| r.updated).sum(),
            active_vertices: active,
            halted_vertices: total_vertices - active,
            messages_sent: routed.sent,
            messages_delivered: routed.delivered,
        };

        tracing::debug!(
            superstep,
            computed = stats.computed_vertices,
            updated = stats.updated_vertices,
            active = stats.active_vertices,
            messages = stats.messages_sent,
            "superstep done"
        );
        metrics::counter!("bsp_supersteps_total").increment(1);
        metrics::counter!("bsp_superstep_messages_total").increment(stats.messages_sent as u64);
        metrics::counter!("bsp_superstep_active_vertices_total")
            .increment(stats.active_vertices as u64);
        metrics::histogram!("bsp_superstep_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        Ok(stats)
    }

    fn compute_all(&mut self, superstep: u64) -> Vec<BspResult<WorkerReport>> {
        let workers = &mut self.workers;
        match &self.pool {
            Some(pool) => pool.install(|| Self::fan_out(workers, superstep)),
            None => Self::fan_out(workers, superstep),
        }
    }

    fn fan_out(
        workers: &mut [LocalWorker<K, VV, EV, M>],
        superstep: u64,
    ) -> Vec<BspResult<WorkerReport>> {
        workers
            .par_iter_mut()
            .map(|w| w.run_superstep(superstep))
            .collect()
    }

    pub fn into_graph(self) -> PartitionedGraph<K, VV, EV> {
        let partitions = self.workers.into_iter().map(|w| w.partition).collect();
        PartitionedGraph::from_parts(partitions, self.partitioner)
    }
}
