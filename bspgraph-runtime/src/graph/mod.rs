pub mod mem_graph;
pub mod partitioned_graph;

use std::fmt::Debug;
use std::hash::Hash;

pub trait VertexKey: Clone + Ord + Hash + Debug + Send + Sync + 'static {}
impl<T> VertexKey for T where T: Clone + Ord + Hash + Debug + Send + Sync + 'static {}

pub trait GraphValue: Clone + Send + Sync + 'static {}
impl<T> GraphValue for T where T: Clone + Send + Sync + 'static {}
