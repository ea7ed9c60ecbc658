use crate::algorithms::sssp::{PathValue, VertexId, Weight};
use crate::io::{csv_error, csv_reader, in_shard, parse_field, record_line, LoadStats, SsspGraph};
use bspgraph_api::graph::PGraph;
use bspgraph_common::error::{BspError, BspResult};
use bspgraph_common::types::Edge;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `<src><delim><dst><delim><weight>`, one edge per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeListFormat {
    pub delimiter: char,
    /// Records skipped at the top of every shard.
    pub skip_header_lines: usize,
    /// Each record is an undirected edge stored as two directed ones.
    pub symmetric: bool,
}

impl Default for EdgeListFormat {
    fn default() -> Self {
        Self {
            delimiter: ' ',
            skip_header_lines: 0,
            symmetric: false,
        }
    }
}

pub struct EdgeListLoader {
    format: EdgeListFormat,
    graph: SsspGraph,
    records: u64,
}

impl EdgeListLoader {
    pub fn new(format: EdgeListFormat) -> BspResult<Self> {
        if !format.delimiter.is_ascii() {
            return Err(BspError::InvalidArgument(format!(
                "delimiter {:?} is not a single byte",
                format.delimiter
            )));
        }
        Ok(Self {
            format,
            graph: SsspGraph::default(),
            records: 0,
        })
    }

    pub fn read_path(&mut self, path: impl AsRef<Path>) -> BspResult<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(BspError::Io)?;
        self.read(file).map_err(|e| in_shard(path, e))?;
        tracing::debug!(path = %path.display(), "edge list shard loaded");
        Ok(())
    }

    pub fn read<R: Read>(&mut self, input: R) -> BspResult<()> {
        let mut rdr = csv_reader(self.format.delimiter, input)?;
        for rec in rdr.records().skip(self.format.skip_header_lines) {
            let rec = rec.map_err(csv_error)?;
            let line = record_line(&rec);
            // Runs of the delimiter count as one.
            let fields: Vec<&str> = rec.iter().map(str::trim).filter(|f| !f.is_empty()).collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 3 {
                return Err(BspError::MalformedRecord {
                    line,
                    reason: format!("expected <src> <dst> <weight>, got {} fields", fields.len()),
                });
            }
            let src: VertexId = parse_field(fields[0], "edge src", line)?;
            let dst: VertexId = parse_field(fields[1], "edge target", line)?;
            let weight: Weight = parse_field(fields[2], "edge weight", line)?;

            self.graph.ensure_vertex(src, PathValue::unreached());
            self.graph.ensure_vertex(dst, PathValue::unreached());
            let edge = Edge::new(src, dst, weight);
            if self.format.symmetric {
                self.graph.add_edge(edge.reversed());
            }
            self.graph.add_edge(edge);
            self.records += 1;
        }
        Ok(())
    }

    pub fn finish(self) -> (SsspGraph, LoadStats) {
        let stats = LoadStats {
            records: self.records,
            vertices: self.graph.num_vertices(),
            edges: self.graph.num_edges(),
        };
        tracing::info!(
            records = stats.records,
            vertices = stats.vertices,
            edges = stats.edges,
            "edge list graph loaded"
        );
        (self.graph, stats)
    }
}
