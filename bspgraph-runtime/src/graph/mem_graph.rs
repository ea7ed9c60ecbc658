use crate::graph::partitioned_graph::PartitionedGraph;
use crate::graph::{GraphValue, VertexKey};
use crate::shuffle::partitioner::Partitioner;
use bspgraph_api::graph::PGraph;
use bspgraph_common::types::{Edge, Vertex};
use std::collections::HashMap;
use std::sync::Arc;

/// The loaded, not yet partitioned graph.
///
/// Keeps at most one edge per `(source, target)` pair.
#[derive(Debug, Clone)]
pub struct InMemoryGraph<K, VV, EV> {
    vertices: HashMap<K, VV>,
    adjacency: HashMap<K, Vec<Edge<K, EV>>>,
    num_edges: usize,
}

impl<K, VV, EV> Default for InMemoryGraph<K, VV, EV> {
    fn default() -> Self {
        Self {
            vertices: HashMap::new(),
            adjacency: HashMap::new(),
            num_edges: 0,
        }
    }
}

impl<K, VV, EV> InMemoryGraph<K, VV, EV>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
{
    /// Builds a graph from explicit lists. Edge endpoints missing from
    /// `vertices` get `default_value`.
    pub fn new(vertices: Vec<Vertex<K, VV>>, edges: Vec<Edge<K, EV>>, default_value: VV) -> Self {
        let mut graph = Self::default();
        for v in vertices {
            graph.insert_vertex(v.id, v.value);
        }
        for e in edges {
            graph.ensure_vertex(e.src_id.clone(), default_value.clone());
            graph.ensure_vertex(e.target_id.clone(), default_value.clone());
            graph.add_edge(e);
        }
        graph
    }

    pub fn contains_vertex(&self, id: &K) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn vertex(&self, id: &K) -> Option<&VV> {
        self.vertices.get(id)
    }

    /// Returns the previous value when the vertex already existed.
    pub fn insert_vertex(&mut self, id: K, value: VV) -> Option<VV> {
        self.vertices.insert(id, value)
    }

    /// Inserts the vertex only if absent. Returns true on insert.
    pub fn ensure_vertex(&mut self, id: K, value: VV) -> bool {
        if self.vertices.contains_key(&id) {
            return false;
        }
        self.vertices.insert(id, value);
        true
    }

    /// Returns false when `src_id` already links to `target_id`.
    pub fn add_edge(&mut self, edge: Edge<K, EV>) -> bool {
        let out = self.adjacency.entry(edge.src_id.clone()).or_default();
        if out.iter().any(|e| e.target_id == edge.target_id) {
            return false;
        }
        out.push(edge);
        self.num_edges += 1;
        true
    }

    /// Returns false when there was no `src_id -> target_id` edge.
    pub fn remove_edge(&mut self, src_id: &K, target_id: &K) -> bool {
        let Some(out) = self.adjacency.get_mut(src_id) else {
            return false;
        };
        let before = out.len();
        out.retain(|e| &e.target_id != target_id);
        let removed = before - out.len();
        if out.is_empty() {
            self.adjacency.remove(src_id);
        }
        self.num_edges -= removed;
        removed > 0
    }

    pub fn has_edge(&self, src_id: &K, target_id: &K) -> bool {
        self.out_edges(src_id).iter().any(|e| &e.target_id == target_id)
    }

    pub fn out_edges(&self, id: &K) -> &[Edge<K, EV>] {
        self.adjacency.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = &K> {
        self.vertices.keys()
    }

    pub fn partition(
        self,
        partitions: usize,
        partitioner: Arc<dyn Partitioner<K>>,
    ) -> PartitionedGraph<K, VV, EV> {
        PartitionedGraph::with_partitioner(self.vertices, self.adjacency, partitions, partitioner)
    }
}

impl<K, VV, EV> PGraph<K, VV, EV> for InMemoryGraph<K, VV, EV>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
{
    fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn num_edges(&self) -> usize {
        self.num_edges
    }

    fn vertices(&self) -> Vec<Vertex<K, VV>> {
        self.vertices
            .iter()
            .map(|(k, v)| Vertex::new(k.clone(), v.clone()))
            .collect()
    }

    fn edges(&self) -> Vec<Edge<K, EV>> {
        self.adjacency.values().flatten().cloned().collect()
    }
}
