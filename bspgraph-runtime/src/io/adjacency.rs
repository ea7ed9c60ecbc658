use crate::algorithms::sssp::{PathValue, VertexId, Weight};
use crate::io::{csv_error, csv_reader, in_shard, parse_field, record_line, LoadStats, SsspGraph};
use bspgraph_api::graph::PGraph;
use bspgraph_common::error::{BspError, BspResult};
use bspgraph_common::types::Edge;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateVertexPolicy {
    #[default]
    Reject,
    /// The later record replaces the earlier record's out edges.
    LastWriteWins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDestinationPolicy {
    Reject,
    /// Undeclared targets become vertices without out edges.
    #[default]
    CreateStub,
}

/// `<id><delim><dest>:<weight><delim><dest>:<weight>...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencyFormat {
    pub delimiter: char,
    /// First column holding `dest:weight` pairs. Column 0 is the vertex id;
    /// columns in between are skipped.
    pub adjacency_column: usize,
    pub pair_separator: char,
    /// Also insert `dest -> id` for every pair.
    pub symmetric: bool,
    pub duplicate_vertices: DuplicateVertexPolicy,
    pub unknown_destinations: UnknownDestinationPolicy,
}

impl Default for AdjacencyFormat {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            adjacency_column: 1,
            pair_separator: ':',
            symmetric: false,
            duplicate_vertices: DuplicateVertexPolicy::default(),
            unknown_destinations: UnknownDestinationPolicy::default(),
        }
    }
}

pub struct AdjacencyLoader {
    format: AdjacencyFormat,
    graph: SsspGraph,
    declared: HashSet<VertexId>,
    /// Edges whose target was not declared yet when they were read.
    forward_refs: Vec<(VertexId, VertexId)>,
    /// Targets listed by the latest record of each vertex. Only kept under
    /// `LastWriteWins`.
    listed: HashMap<VertexId, Vec<VertexId>>,
    records: u64,
}

impl AdjacencyLoader {
    pub fn new(format: AdjacencyFormat) -> BspResult<Self> {
        if format.adjacency_column == 0 {
            return Err(BspError::InvalidArgument(
                "adjacency column must be >= 1, column 0 holds the vertex id".to_string(),
            ));
        }
        if format.delimiter == format.pair_separator {
            return Err(BspError::InvalidArgument(format!(
                "delimiter and pair separator are both {:?}",
                format.delimiter
            )));
        }
        Ok(Self {
            format,
            graph: SsspGraph::default(),
            declared: HashSet::new(),
            forward_refs: Vec::new(),
            listed: HashMap::new(),
            records: 0,
        })
    }

    pub fn read_path(&mut self, path: impl AsRef<Path>) -> BspResult<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(BspError::Io)?;
        let before = self.records;
        self.read(file).map_err(|e| in_shard(path, e))?;
        tracing::debug!(path = %path.display(), records = self.records - before, "adjacency shard loaded");
        Ok(())
    }

    pub fn read<R: Read>(&mut self, input: R) -> BspResult<()> {
        let mut rdr = csv_reader(self.format.delimiter, input)?;
        for rec in rdr.records() {
            let rec = rec.map_err(csv_error)?;
            if rec.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            self.read_record(&rec)?;
        }
        Ok(())
    }

    fn read_record(&mut self, rec: &csv::StringRecord) -> BspResult<()> {
        let line = record_line(rec);
        let id: VertexId = parse_field(rec.get(0).unwrap_or(""), "vertex id", line)?;
        if rec.len() < self.format.adjacency_column {
            return Err(BspError::MalformedRecord {
                line,
                reason: format!(
                    "{} columns, adjacency data starts at column {}",
                    rec.len(),
                    self.format.adjacency_column
                ),
            });
        }

        if !self.declared.insert(id) {
            match self.format.duplicate_vertices {
                DuplicateVertexPolicy::Reject => {
                    return Err(BspError::DuplicateVertex { id, line });
                }
                DuplicateVertexPolicy::LastWriteWins => self.retract(id),
            }
        }
        self.graph.insert_vertex(id, PathValue::unreached());

        let pairs = rec
            .iter()
            .skip(self.format.adjacency_column)
            .map(str::trim)
            .filter(|f| !f.is_empty());
        for pair in pairs {
            let (dest, weight) =
                pair.split_once(self.format.pair_separator)
                    .ok_or_else(|| BspError::MalformedRecord {
                        line,
                        reason: format!(
                            "pair {pair:?} has no {:?} separator",
                            self.format.pair_separator
                        ),
                    })?;
            let dest: VertexId = parse_field(dest, "destination id", line)?;
            let weight: Weight = parse_field(weight, "edge weight", line)?;

            let edge = Edge::new(id, dest, weight);
            if self.format.symmetric {
                self.graph.add_edge(edge.reversed());
            }
            self.graph.add_edge(edge);
            if self.format.duplicate_vertices == DuplicateVertexPolicy::LastWriteWins {
                self.listed.entry(id).or_default().push(dest);
            }
            if !self.declared.contains(&dest) {
                self.forward_refs.push((id, dest));
            }
        }
        self.records += 1;
        Ok(())
    }

    fn lists(&self, src: VertexId, dest: VertexId) -> bool {
        self.listed.get(&src).is_some_and(|targets| targets.contains(&dest))
    }

    /// Removes the edges contributed by the previous record of `id`. Under
    /// `symmetric`, a pair also listed by the other endpoint's own record
    /// keeps both directions.
    fn retract(&mut self, id: VertexId) {
        let previous = self.listed.remove(&id).unwrap_or_default();
        for dest in previous {
            if self.format.symmetric && self.lists(dest, id) {
                continue;
            }
            self.graph.remove_edge(&id, &dest);
            if self.format.symmetric {
                self.graph.remove_edge(&dest, &id);
            }
        }
    }

    /// Resolves edges to undeclared vertices according to the policy.
    pub fn finish(mut self) -> BspResult<(SsspGraph, LoadStats)> {
        let mut unknown: Vec<(VertexId, VertexId)> = self
            .forward_refs
            .drain(..)
            .filter(|(src, dest)| {
                !self.declared.contains(dest) && self.graph.has_edge(src, dest)
            })
            .collect();
        unknown.sort_unstable();

        match self.format.unknown_destinations {
            UnknownDestinationPolicy::Reject => {
                if let Some(&(src_id, target_id)) = unknown.first() {
                    return Err(BspError::UnknownDestination { src_id, target_id });
                }
            }
            UnknownDestinationPolicy::CreateStub => {
                for (_, dest) in unknown {
                    self.graph.ensure_vertex(dest, PathValue::unreached());
                }
            }
        }

        let stats = LoadStats {
            records: self.records,
            vertices: self.graph.num_vertices(),
            edges: self.graph.num_edges(),
        };
        tracing::info!(
            records = stats.records,
            vertices = stats.vertices,
            edges = stats.edges,
            "adjacency graph loaded"
        );
        Ok((self.graph, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(format: AdjacencyFormat, input: &str) -> BspResult<(SsspGraph, LoadStats)> {
        let mut loader = AdjacencyLoader::new(format)?;
        loader.read(input.as_bytes())?;
        loader.finish()
    }

    #[test]
    fn reads_pairs_and_ignores_trailing_delimiters() {
        let (graph, stats) = load(
            AdjacencyFormat::default(),
            "0\t1:85\t2:217\t\n1\t0:85\t\n\n2\t0:217\n",
        )
        .unwrap();

        assert_eq!(stats.records, 3);
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 4);
        assert_eq!(graph.out_edges(&0).len(), 2);
        assert_eq!(graph.vertex(&2), Some(&PathValue::unreached()));
    }

    #[test]
    fn symmetric_inserts_reverse_edges() {
        let format = AdjacencyFormat {
            delimiter: ' ',
            symmetric: true,
            ..AdjacencyFormat::default()
        };
        let (graph, stats) = load(format, "1 2:4 3:5\n2\n3\n").unwrap();
        assert_eq!(stats.edges, 4);
        assert_eq!(graph.out_edges(&2)[0], Edge::new(2, 1, 4));
        assert_eq!(graph.out_edges(&3)[0], Edge::new(3, 1, 5));
    }

    #[test]
    fn skips_columns_before_the_adjacency_column() {
        let format = AdjacencyFormat {
            delimiter: ',',
            adjacency_column: 2,
            ..AdjacencyFormat::default()
        };
        let (graph, _) = load(format, "1,label,2:3\n2,other\n").unwrap();
        assert_eq!(graph.out_edges(&1), &[Edge::new(1, 2, 3)]);
    }

    #[test]
    fn malformed_records_name_the_line() {
        let cases = [
            ("0\t1:2\nx\t1:2\n", 2),
            ("0\t1-2\n", 1),
            ("0\t1:heavy\n", 1),
            ("0\t1:2\n1\t:4\n", 2),
            ("0\t1:-3\n", 1),
        ];
        for (input, expected_line) in cases {
            match load(AdjacencyFormat::default(), input) {
                Err(BspError::MalformedRecord { line, .. }) => {
                    assert_eq!(line, expected_line, "input {input:?}")
                }
                other => panic!("expected malformed record for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_columns_before_adjacency_is_malformed() {
        let format = AdjacencyFormat {
            adjacency_column: 3,
            ..AdjacencyFormat::default()
        };
        assert!(matches!(
            load(format, "7\tx\n"),
            Err(BspError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn duplicate_vertex_is_rejected_by_default() {
        let err = load(AdjacencyFormat::default(), "1\t2:1\n2\n1\t2:5\n").unwrap_err();
        assert!(matches!(err, BspError::DuplicateVertex { id: 1, line: 3 }));
    }

    #[test]
    fn duplicate_vertex_last_write_wins() {
        let format = AdjacencyFormat {
            duplicate_vertices: DuplicateVertexPolicy::LastWriteWins,
            ..AdjacencyFormat::default()
        };
        let (graph, stats) = load(format, "1\t2:1\t3:1\n2\n3\n1\t2:5\n").unwrap();
        assert_eq!(graph.out_edges(&1), &[Edge::new(1, 2, 5)]);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.records, 4);
    }

    #[test]
    fn last_write_wins_keeps_reverse_edges_of_other_records() {
        let format = AdjacencyFormat {
            delimiter: ' ',
            symmetric: true,
            duplicate_vertices: DuplicateVertexPolicy::LastWriteWins,
            ..AdjacencyFormat::default()
        };
        let (graph, stats) = load(format, "1 2:4\n2 3:1\n2 3:1\n3\n").unwrap();

        assert_eq!(graph.out_edges(&1), &[Edge::new(1, 2, 4)]);
        assert!(graph.has_edge(&2, &1));
        assert!(graph.has_edge(&2, &3));
        assert!(graph.has_edge(&3, &2));
        assert_eq!(stats.edges, 4);
    }

    #[test]
    fn last_write_wins_drops_both_directions_of_a_retracted_pair() {
        let format = AdjacencyFormat {
            symmetric: true,
            duplicate_vertices: DuplicateVertexPolicy::LastWriteWins,
            ..AdjacencyFormat::default()
        };
        // 3 lists 1 itself, so that pair survives the rewrite of 1.
        let (graph, stats) = load(format, "1\t2:1\t3:2\n2\n3\t1:2\n1\n").unwrap();

        assert!(!graph.has_edge(&1, &2));
        assert!(!graph.has_edge(&2, &1));
        assert!(graph.has_edge(&1, &3));
        assert!(graph.has_edge(&3, &1));
        assert_eq!(stats.edges, 2);
    }

    #[test]
    fn retracted_forward_reference_does_not_create_a_stub() {
        let format = AdjacencyFormat {
            duplicate_vertices: DuplicateVertexPolicy::LastWriteWins,
            ..AdjacencyFormat::default()
        };
        let (graph, _) = load(format, "1\t9:3\n1\n").unwrap();
        assert!(!graph.contains_vertex(&9));
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn unknown_destination_becomes_stub_by_default() {
        let (graph, stats) = load(AdjacencyFormat::default(), "1\t9:3\n").unwrap();
        assert_eq!(stats.vertices, 2);
        assert!(graph.contains_vertex(&9));
        assert!(graph.out_edges(&9).is_empty());
    }

    #[test]
    fn unknown_destination_can_be_rejected() {
        let format = AdjacencyFormat {
            unknown_destinations: UnknownDestinationPolicy::Reject,
            ..AdjacencyFormat::default()
        };
        // 2 is declared after being referenced, which is fine.
        let err = load(format, "1\t2:1\t9:3\n2\t8:1\n").unwrap_err();
        assert!(matches!(
            err,
            BspError::UnknownDestination {
                src_id: 1,
                target_id: 9
            }
        ));
    }

    #[test]
    fn rejects_ambiguous_format() {
        let format = AdjacencyFormat {
            delimiter: ':',
            ..AdjacencyFormat::default()
        };
        assert!(matches!(
            AdjacencyLoader::new(format),
            Err(BspError::InvalidArgument(_))
        ));
    }
}
