use crate::graph::partitioned_graph::GraphPartition;
use crate::graph::{GraphValue, VertexKey};
use crate::shuffle::{Inbox, Outbox};
use bspgraph_api::function::{VertexCentricComputeFuncContext, VertexCentricComputeFunction};
use bspgraph_common::error::{BspError, BspResult};
use bspgraph_common::types::Edge;
use std::collections::{HashMap, HashSet};

/// What one worker did in one superstep. Reduced by the coordinator after
/// the barrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub partition: usize,
    pub computed: usize,
    pub updated: usize,
    pub messages: usize,
    /// Vertices that did not vote to halt.
    pub active: usize,
}

struct WorkerContext<'a, K, VV, EV, M> {
    vertex_value: &'a mut VV,
    edges: &'a [Edge<K, EV>],
    outbox: &'a mut Outbox<K, M>,
    superstep: u64,
    updated: bool,
    halted: bool,
}

impl<'a, K, VV, EV, M> VertexCentricComputeFuncContext<K, VV, EV, M>
    for WorkerContext<'a, K, VV, EV, M>
{
    fn vertex_value(&self) -> Option<&VV> {
        Some(self.vertex_value)
    }

    fn set_new_vertex_value(&mut self, value: VV) {
        *self.vertex_value = value;
        self.updated = true;
    }

    fn send_message(&mut self, target_id: K, message: M) {
        self.outbox.push((target_id, message));
    }

    fn edges(&self) -> Box<dyn Iterator<Item = &Edge<K, EV>> + '_> {
        Box::new(self.edges.iter())
    }

    fn superstep(&self) -> u64 {
        self.superstep
    }

    fn vote_to_halt(&mut self) {
        self.halted = true;
    }
}

/// Owns one partition together with its inbox, outbox and vertex program
/// instance. Nothing in here is shared with other workers during a superstep.
pub(crate) struct LocalWorker<K, VV, EV, M> {
    pub(crate) partition: GraphPartition<K, VV, EV>,
    pub(crate) inbox: Inbox<K, M>,
    pub(crate) outbox: Outbox<K, M>,
    active: HashSet<K>,
    func: Box<dyn VertexCentricComputeFunction<K, VV, EV, M>>,
}

impl<K, VV, EV, M> LocalWorker<K, VV, EV, M>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
    M: Send + Sync + 'static,
{
    pub(crate) fn new(
        partition: GraphPartition<K, VV, EV>,
        func: Box<dyn VertexCentricComputeFunction<K, VV, EV, M>>,
    ) -> Self {
        Self {
            partition,
            inbox: HashMap::new(),
            outbox: Vec::new(),
            active: HashSet::new(),
            func,
        }
    }

    /// Computes every vertex that is in superstep 0, has mail, or has not
    /// voted to halt. Vertices run in ascending id order, so the first error
    /// returned is always the same one.
    pub(crate) fn run_superstep(&mut self, superstep: u64) -> BspResult<WorkerReport> {
        let LocalWorker {
            partition,
            inbox,
            outbox,
            active,
            func,
        } = self;
        outbox.clear();

        if let Some(target) = inbox
            .keys()
            .filter(|k| !partition.vertices.contains_key(*k))
            .min()
        {
            return Err(BspError::UndeliverableMessage {
                target: format!("{target:?}"),
                superstep,
            });
        }

        let mut inbox = std::mem::take(inbox);
        let mut next_active = HashSet::new();
        let mut report = WorkerReport {
            partition: partition.index,
            ..WorkerReport::default()
        };

        for (vertex_id, value) in partition.vertices.iter_mut() {
            let messages = inbox.remove(vertex_id);
            if superstep > 0 && messages.is_none() && !active.contains(vertex_id) {
                continue;
            }

            let edges = partition
                .adjacency
                .get(vertex_id)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            let mut msg_iter = messages.unwrap_or_default().into_iter();
            let mut ctx = WorkerContext {
                vertex_value: value,
                edges,
                outbox: &mut *outbox,
                superstep,
                updated: false,
                halted: false,
            };

            func.compute(vertex_id, &mut msg_iter, &mut ctx)
                .map_err(|e| match e {
                    e @ BspError::VertexCompute { .. } => e,
                    other => BspError::VertexCompute {
                        vertex_id: format!("{vertex_id:?}"),
                        superstep,
                        message: other.to_string(),
                    },
                })?;

            report.computed += 1;
            if ctx.updated {
                report.updated += 1;
            }
            if !ctx.halted {
                next_active.insert(vertex_id.clone());
            }
        }

        *active = next_active;
        report.messages = outbox.len();
        report.active = active.len();
        Ok(report)
    }
}
