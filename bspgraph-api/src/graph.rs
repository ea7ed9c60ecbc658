pub use bspgraph_common::types::{Edge, Vertex};

/// Read access shared by the loaded graph and its partitioned form.
pub trait PGraph<K, VV, EV> {
    fn num_vertices(&self) -> usize;

    fn num_edges(&self) -> usize;

    /// Get the vertices as a collection (for simple verification)
    fn vertices(&self) -> Vec<Vertex<K, VV>>;

    /// Get the edges as a collection
    fn edges(&self) -> Vec<Edge<K, EV>>;
}
