pub mod adjacency;
pub mod edge_list;
pub mod output;

use crate::algorithms::sssp::{PathValue, VertexId, Weight};
use crate::graph::mem_graph::InMemoryGraph;
use bspgraph_common::error::{BspError, BspResult};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

pub use adjacency::{AdjacencyFormat, AdjacencyLoader, DuplicateVertexPolicy, UnknownDestinationPolicy};
pub use edge_list::{EdgeListFormat, EdgeListLoader};

pub type SsspGraph = InMemoryGraph<VertexId, PathValue, Weight>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Non-blank input records consumed, headers excluded.
    pub records: u64,
    pub vertices: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputFormat {
    Adjacency(AdjacencyFormat),
    EdgeList(EdgeListFormat),
}

impl Default for InputFormat {
    fn default() -> Self {
        InputFormat::Adjacency(AdjacencyFormat::default())
    }
}

/// Loads every shard into one graph.
pub fn load_graph<P: AsRef<Path>>(
    paths: &[P],
    format: &InputFormat,
) -> BspResult<(SsspGraph, LoadStats)> {
    if paths.is_empty() {
        return Err(BspError::InvalidArgument("no input paths".to_string()));
    }
    match format {
        InputFormat::Adjacency(f) => {
            let mut loader = AdjacencyLoader::new(f.clone())?;
            for p in paths {
                loader.read_path(p)?;
            }
            loader.finish()
        }
        InputFormat::EdgeList(f) => {
            let mut loader = EdgeListLoader::new(f.clone())?;
            for p in paths {
                loader.read_path(p)?;
            }
            Ok(loader.finish())
        }
    }
}

pub(crate) fn csv_reader<R: Read>(delimiter: char, input: R) -> BspResult<csv::Reader<R>> {
    if !delimiter.is_ascii() {
        return Err(BspError::InvalidArgument(format!(
            "delimiter {delimiter:?} is not a single byte"
        )));
    }
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(input))
}

pub(crate) fn record_line(rec: &csv::StringRecord) -> u64 {
    rec.position().map(|p| p.line()).unwrap_or(0)
}

pub(crate) fn csv_error(e: csv::Error) -> BspError {
    match e.position() {
        Some(pos) => BspError::MalformedRecord {
            line: pos.line(),
            reason: format!("csv read: {e}"),
        },
        None => BspError::Internal(format!("csv read: {e}")),
    }
}

pub(crate) fn parse_field<T>(raw: &str, what: &str, line: u64) -> BspResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BspError::MalformedRecord {
            line,
            reason: format!("{what} missing"),
        });
    }
    raw.parse().map_err(|e| BspError::MalformedRecord {
        line,
        reason: format!("{what} {raw:?}: {e}"),
    })
}

/// Prefixes loader errors with the shard they came from.
pub(crate) fn in_shard(path: &Path, e: BspError) -> BspError {
    match e {
        BspError::MalformedRecord { line, reason } => BspError::MalformedRecord {
            line,
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    }
}
