use bspgraph_api::function::{
    MessageCombiner, VertexCentricComputeAlgorithm, VertexCentricComputeFuncContext,
    VertexCentricComputeFunction,
};
use bspgraph_common::error::{BspError, BspResult};
use serde::{Deserialize, Serialize};

pub type VertexId = u64;
pub type Cost = u64;
pub type Weight = u32;

/// Cost of a vertex the start vertex cannot reach. Finite costs stay below it.
pub const INFINITE_COST: Cost = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathValue {
    pub cost: Cost,
    pub predecessor: Option<VertexId>,
}

impl PathValue {
    pub fn unreached() -> Self {
        Self {
            cost: INFINITE_COST,
            predecessor: None,
        }
    }

    pub fn start(id: VertexId) -> Self {
        Self {
            cost: 0,
            predecessor: Some(id),
        }
    }

    pub fn is_reached(&self) -> bool {
        self.cost != INFINITE_COST
    }
}

impl Default for PathValue {
    fn default() -> Self {
        Self::unreached()
    }
}

/// Candidate cost offered by `sender`. Ordered by cost, then sender id, so
/// `min` also applies the lowest-sender tie break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathMessage {
    pub cost: Cost,
    pub sender: VertexId,
}

#[derive(Debug, Clone)]
pub struct SsspAlgorithm {
    pub start_vertex: VertexId,
    pub combine_messages: bool,
}

impl SsspAlgorithm {
    pub fn new(start_vertex: VertexId) -> Self {
        Self {
            start_vertex,
            combine_messages: true,
        }
    }

    pub fn without_combiner(mut self) -> Self {
        self.combine_messages = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SsspFunction {
    start_vertex: VertexId,
}

impl SsspFunction {
    fn relax_out_edges(
        vertex_id: VertexId,
        cost: Cost,
        context: &mut dyn VertexCentricComputeFuncContext<VertexId, PathValue, Weight, PathMessage>,
    ) -> BspResult<()> {
        let out: Vec<(VertexId, Weight)> =
            context.edges().map(|e| (e.target_id, e.value)).collect();
        for (target, weight) in out {
            let candidate = cost
                .checked_add(Cost::from(weight))
                .filter(|c| *c < INFINITE_COST)
                .ok_or_else(|| {
                    BspError::Internal(format!(
                        "path cost overflow on edge {vertex_id} -> {target} ({cost} + {weight})"
                    ))
                })?;
            context.send_message(
                target,
                PathMessage {
                    cost: candidate,
                    sender: vertex_id,
                },
            );
        }
        Ok(())
    }
}

impl VertexCentricComputeFunction<VertexId, PathValue, Weight, PathMessage> for SsspFunction {
    fn compute(
        &mut self,
        vertex_id: &VertexId,
        message_iterator: &mut dyn Iterator<Item = PathMessage>,
        context: &mut dyn VertexCentricComputeFuncContext<VertexId, PathValue, Weight, PathMessage>,
    ) -> BspResult<()> {
        if context.superstep() == 0 {
            if *vertex_id == self.start_vertex {
                context.set_new_vertex_value(PathValue::start(*vertex_id));
                Self::relax_out_edges(*vertex_id, 0, context)?;
            } else {
                context.set_new_vertex_value(PathValue::unreached());
            }
            context.vote_to_halt();
            return Ok(());
        }

        let current = context.vertex_value().copied().unwrap_or_default();
        if let Some(best) = message_iterator.min() {
            if best.cost < current.cost {
                context.set_new_vertex_value(PathValue {
                    cost: best.cost,
                    predecessor: Some(best.sender),
                });
                Self::relax_out_edges(*vertex_id, best.cost, context)?;
            }
        }
        context.vote_to_halt();
        Ok(())
    }
}

impl VertexCentricComputeAlgorithm<VertexId, PathValue, Weight, PathMessage> for SsspAlgorithm {
    fn name(&self) -> &str {
        "sssp"
    }

    fn create_function(
        &self,
    ) -> Box<dyn VertexCentricComputeFunction<VertexId, PathValue, Weight, PathMessage>> {
        Box::new(SsspFunction {
            start_vertex: self.start_vertex,
        })
    }

    fn create_combiner(&self) -> Option<Box<dyn MessageCombiner<PathMessage>>> {
        if self.combine_messages {
            Some(Box::new(|a: PathMessage, b: PathMessage| a.min(b)))
        } else {
            None
        }
    }
}
