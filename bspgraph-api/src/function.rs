use bspgraph_common::error::BspResult;
use std::iter::Iterator;

pub trait Function: Send + Sync + 'static {}

impl<F> Function for F where F: Send + Sync + 'static {}

/// Context for Vertex Centric Compute
///
/// Handed to [`VertexCentricComputeFunction::compute`] for exactly one vertex
/// and one superstep. Messages sent through it are delivered at the next
/// superstep, never earlier.
pub trait VertexCentricComputeFuncContext<K, VV, EV, M> {
    fn vertex_value(&self) -> Option<&VV>;
    fn set_new_vertex_value(&mut self, value: VV);
    fn send_message(&mut self, target_id: K, message: M);
    fn edges(&self) -> Box<dyn Iterator<Item = &crate::graph::Edge<K, EV>> + '_>;
    fn superstep(&self) -> u64;

    /// The vertex stays inactive until a message arrives for it.
    fn vote_to_halt(&mut self);
}

pub trait VertexCentricComputeFunction<K, VV, EV, M>: Function {
    fn compute(
        &mut self,
        vertex_id: &K,
        message_iterator: &mut dyn Iterator<Item = M>,
        context: &mut dyn VertexCentricComputeFuncContext<K, VV, EV, M>,
    ) -> BspResult<()>;
}

/// Folds two messages for the same destination into one before delivery.
///
/// Must be commutative and associative: delivery order is unspecified.
pub trait MessageCombiner<M>: Send + Sync {
    fn combine(&self, left: M, right: M) -> M;
}

impl<M, F> MessageCombiner<M> for F
where
    F: Fn(M, M) -> M + Send + Sync,
{
    fn combine(&self, left: M, right: M) -> M {
        (self)(left, right)
    }
}

pub trait VertexCentricComputeAlgorithm<K, VV, EV, M>: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// One function instance is created per worker.
    fn create_function(&self) -> Box<dyn VertexCentricComputeFunction<K, VV, EV, M>>;

    fn create_combiner(&self) -> Option<Box<dyn MessageCombiner<M>>> {
        None
    }
}
