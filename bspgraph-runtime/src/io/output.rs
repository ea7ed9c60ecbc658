use crate::algorithms::sssp::{Cost, PathValue, VertexId, Weight};
use crate::graph::partitioned_graph::PartitionedGraph;
use crate::io::{csv_error, csv_reader, parse_field, record_line};
use bspgraph_common::error::{BspError, BspResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Written in place of the predecessor of an unreached vertex.
pub const NO_PREDECESSOR: &str = "-1";

const SHARD_PREFIX: &str = "part-";

pub fn shard_name(partition: usize) -> String {
    format!("{SHARD_PREFIX}{partition:05}")
}

/// `[id, predecessor, cost]`; unreached vertices carry `-1` and the cost sentinel.
pub fn format_record(id: VertexId, value: &PathValue) -> [String; 3] {
    let predecessor = value
        .predecessor
        .map(|p| p.to_string())
        .unwrap_or_else(|| NO_PREDECESSOR.to_string());
    [id.to_string(), predecessor, value.cost.to_string()]
}

/// Writes one tab separated shard per partition, replacing shards left by an
/// earlier run.
pub fn write_output(
    dir: impl AsRef<Path>,
    graph: &PartitionedGraph<VertexId, PathValue, Weight>,
) -> BspResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(BspError::Io)?;
    for stale in shard_paths(dir)? {
        fs::remove_file(&stale).map_err(BspError::Io)?;
    }

    let mut written = Vec::with_capacity(graph.partitions());
    for index in 0..graph.partitions() {
        let Some(partition) = graph.partition(index) else {
            continue;
        };
        let path = dir.join(shard_name(index));
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(&path)
            .map_err(|e| BspError::Io(e.into()))?;
        for (id, value) in partition.vertices() {
            wtr.write_record(format_record(*id, value))
                .map_err(|e| BspError::Io(e.into()))?;
        }
        wtr.flush().map_err(BspError::Io)?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), shards = written.len(), "output written");
    Ok(written)
}

/// Merges every shard in `dir`, keyed by vertex id.
pub fn read_output(dir: impl AsRef<Path>) -> BspResult<BTreeMap<VertexId, PathValue>> {
    let mut merged = BTreeMap::new();
    for path in shard_paths(dir.as_ref())? {
        let file = fs::File::open(&path).map_err(BspError::Io)?;
        let mut rdr = csv_reader('\t', file)?;
        for rec in rdr.records() {
            let rec = rec.map_err(csv_error)?;
            let line = record_line(&rec);
            if rec.len() != 3 {
                return Err(BspError::MalformedRecord {
                    line,
                    reason: format!("{}: expected 3 columns, got {}", path.display(), rec.len()),
                });
            }
            let id: VertexId = parse_field(&rec[0], "vertex id", line)?;
            let predecessor = match rec[1].trim() {
                NO_PREDECESSOR => None,
                raw => Some(parse_field::<VertexId>(raw, "predecessor", line)?),
            };
            let cost: Cost = parse_field(&rec[2], "cost", line)?;
            if merged.insert(id, PathValue { cost, predecessor }).is_some() {
                return Err(BspError::Internal(format!(
                    "vertex {id} appears in more than one output shard"
                )));
            }
        }
    }
    Ok(merged)
}

fn shard_paths(dir: &Path) -> BspResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(BspError::Io)? {
        let entry = entry.map_err(BspError::Io)?;
        let is_shard = entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with(SHARD_PREFIX))
            .unwrap_or(false);
        if is_shard && entry.path().is_file() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
