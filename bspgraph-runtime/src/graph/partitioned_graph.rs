use crate::graph::{GraphValue, VertexKey};
use crate::shuffle::partitioner::{HashPartitioner, Partitioner};
use bspgraph_api::graph::PGraph;
use bspgraph_common::types::{Edge, Vertex};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub struct PartitionedGraph<K, VV, EV> {
    partitions: Vec<GraphPartition<K, VV, EV>>,
    partitioner: Arc<dyn Partitioner<K>>,
}

/// One worker's share of the graph. Vertices iterate in ascending id order.
pub struct GraphPartition<K, VV, EV> {
    pub(crate) index: usize,
    pub(crate) vertices: BTreeMap<K, VV>,
    pub(crate) adjacency: HashMap<K, Vec<Edge<K, EV>>>,
}

impl<K, VV, EV> GraphPartition<K, VV, EV>
where
    K: VertexKey,
{
    fn empty(index: usize) -> Self {
        Self {
            index,
            vertices: BTreeMap::new(),
            adjacency: HashMap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (&K, &VV)> {
        self.vertices.iter()
    }

    pub fn out_edges(&self, id: &K) -> &[Edge<K, EV>] {
        self.adjacency.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl<K, VV, EV> PartitionedGraph<K, VV, EV>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
{
    pub fn new(vertices: Vec<Vertex<K, VV>>, edges: Vec<Edge<K, EV>>, partitions: usize) -> Self {
        let vertices: HashMap<K, VV> = vertices.into_iter().map(|v| (v.id, v.value)).collect();
        let mut adjacency: HashMap<K, Vec<Edge<K, EV>>> = HashMap::new();
        for e in edges {
            adjacency.entry(e.src_id.clone()).or_default().push(e);
        }
        Self::with_partitioner(vertices, adjacency, partitions, Arc::new(HashPartitioner))
    }

    pub fn with_partitioner(
        vertices: HashMap<K, VV>,
        mut adjacency: HashMap<K, Vec<Edge<K, EV>>>,
        partitions: usize,
        partitioner: Arc<dyn Partitioner<K>>,
    ) -> Self {
        let partitions = partitions.max(1);
        let mut parts: Vec<GraphPartition<K, VV, EV>> =
            (0..partitions).map(GraphPartition::empty).collect();

        for (id, value) in vertices {
            let p = partitioner.partition_of(&id, partitions);
            if let Some(out) = adjacency.remove(&id) {
                parts[p].adjacency.insert(id.clone(), out);
            }
            parts[p].vertices.insert(id, value);
        }

        // Edges whose source was never declared still follow their source.
        for (src, out) in adjacency {
            let p = partitioner.partition_of(&src, partitions);
            parts[p].adjacency.insert(src, out);
        }

        Self {
            partitions: parts,
            partitioner,
        }
    }

    pub(crate) fn from_parts(
        partitions: Vec<GraphPartition<K, VV, EV>>,
        partitioner: Arc<dyn Partitioner<K>>,
    ) -> Self {
        Self {
            partitions,
            partitioner,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<GraphPartition<K, VV, EV>>, Arc<dyn Partitioner<K>>) {
        (self.partitions, self.partitioner)
    }

    pub fn partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, index: usize) -> Option<&GraphPartition<K, VV, EV>> {
        self.partitions.get(index)
    }

    pub fn partition_of(&self, id: &K) -> usize {
        self.partitioner.partition_of(id, self.partitions.len())
    }

    pub fn vertex(&self, id: &K) -> Option<&VV> {
        self.partitions[self.partition_of(id)].vertices.get(id)
    }

    /// All vertex values merged across partitions, keyed by id.
    pub fn vertex_map(&self) -> BTreeMap<K, VV> {
        self.partitions
            .iter()
            .flat_map(|p| p.vertices.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

impl<K, VV, EV> PGraph<K, VV, EV> for PartitionedGraph<K, VV, EV>
where
    K: VertexKey,
    VV: GraphValue,
    EV: GraphValue,
{
    fn num_vertices(&self) -> usize {
        self.partitions.iter().map(|p| p.vertices.len()).sum()
    }

    fn num_edges(&self) -> usize {
        self.partitions
            .iter()
            .flat_map(|p| p.adjacency.values())
            .map(Vec::len)
            .sum()
    }

    fn vertices(&self) -> Vec<Vertex<K, VV>> {
        self.partitions
            .iter()
            .flat_map(|p| {
                p.vertices.iter().map(|(k, v)| Vertex {
                    id: k.clone(),
                    value: v.clone(),
                })
            })
            .collect()
    }

    fn edges(&self) -> Vec<Edge<K, EV>> {
        self.partitions
            .iter()
            .flat_map(|p| p.adjacency.values().flatten().cloned())
            .collect()
    }
}
