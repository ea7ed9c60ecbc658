use crate::algorithms::sssp::VertexId;
use crate::io::InputFormat;
use crate::scheduler::superstep_coordinator::{CoordinatorOptions, NonConvergencePolicy};
use bspgraph_common::config::{self, Configuration};
use bspgraph_common::error::{BspError, BspResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub start_vertex: VertexId,
    pub graph: GraphSpec,
    #[serde(default)]
    pub execution: ExecutionSpec,
    /// Output directory; `None` keeps the result in memory only.
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub inputs: Vec<String>,
    #[serde(default)]
    pub format: InputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSpec {
    pub partitions: usize,
    pub parallelism: Option<usize>,
    pub max_supersteps: u64,
    pub non_convergence: NonConvergencePolicy,
    pub combine_messages: bool,
}

impl Default for ExecutionSpec {
    fn default() -> Self {
        Self {
            partitions: 2,
            parallelism: None,
            max_supersteps: u64::MAX,
            non_convergence: NonConvergencePolicy::Fail,
            combine_messages: true,
        }
    }
}

impl ExecutionSpec {
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            max_supersteps: self.max_supersteps,
            non_convergence: self.non_convergence,
            parallelism: self.parallelism,
        }
    }
}

impl JobSpec {
    /// Reads the well-known keys from `bspgraph_common::config`. The input
    /// format is taken as given.
    pub fn from_configuration(conf: &Configuration, format: InputFormat) -> BspResult<Self> {
        let start_vertex = conf
            .get_parsed::<VertexId>(config::START_VERTEX)?
            .ok_or_else(|| {
                BspError::InvalidArgument(format!("{} is required", config::START_VERTEX))
            })?;
        let defaults = ExecutionSpec::default();
        let spec = Self {
            name: conf.get_string(config::JOB_NAME, "Single Source Shortest Path"),
            start_vertex,
            graph: GraphSpec {
                inputs: conf.get_list(config::INPUT_PATHS),
                format,
            },
            execution: ExecutionSpec {
                partitions: conf.get_usize(config::PARTITIONS, defaults.partitions)?,
                parallelism: conf.get_parsed(config::PARALLELISM)?,
                max_supersteps: conf.get_u64(config::MAX_SUPERSTEPS, defaults.max_supersteps)?,
                non_convergence: if conf.get_bool(config::ALLOW_PARTIAL, false)? {
                    NonConvergencePolicy::ReturnPartial
                } else {
                    NonConvergencePolicy::Fail
                },
                combine_messages: conf.get_bool(config::COMBINE_MESSAGES, true)?,
            },
            output_dir: conf.get(config::OUTPUT_DIR).cloned(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> BspResult<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(BspError::Io)?;
        let spec: JobSpec = serde_json::from_slice(&bytes)
            .map_err(|e| BspError::InvalidArgument(format!("job spec: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> BspResult<()> {
        if self.graph.inputs.is_empty() {
            return Err(BspError::InvalidArgument(
                "job needs at least one input path".to_string(),
            ));
        }
        if self.execution.partitions == 0 {
            return Err(BspError::InvalidArgument(
                "partitions must be at least 1".to_string(),
            ));
        }
        if self.execution.max_supersteps == 0 {
            return Err(BspError::InvalidArgument(
                "max supersteps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_configuration() {
        let mut conf = Configuration::new();
        conf.put(config::START_VERTEX, "0");
        conf.put(config::PARTITIONS, "3");
        conf.put(config::INPUT_PATHS, "/tmp/a.txt,/tmp/b.txt");
        conf.put(config::MAX_SUPERSTEPS, "50");
        conf.put(config::ALLOW_PARTIAL, "true");
        conf.put(config::COMBINE_MESSAGES, "false");
        conf.put(config::JOB_NAME, "nightly");

        let spec = JobSpec::from_configuration(&conf, InputFormat::default()).unwrap();
        assert_eq!(spec.start_vertex, 0);
        assert_eq!(spec.execution.partitions, 3);
        assert_eq!(spec.execution.max_supersteps, 50);
        assert_eq!(spec.execution.non_convergence, NonConvergencePolicy::ReturnPartial);
        assert_eq!(spec.graph.inputs.len(), 2);
        assert_eq!(spec.output_dir, None);
        assert_eq!(spec.name, "nightly");
        assert!(!spec.execution.combine_messages);
    }

    #[test]
    fn start_vertex_is_required() {
        let mut conf = Configuration::new();
        conf.put(config::INPUT_PATHS, "/tmp/a.txt");
        assert!(matches!(
            JobSpec::from_configuration(&conf, InputFormat::default()),
            Err(BspError::InvalidArgument(_))
        ));
    }

    #[test]
    fn json_defaults_fill_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{
                "name": "sssp",
                "start_vertex": 1,
                "graph": {
                    "inputs": ["edges.txt"],
                    "format": { "type": "edge_list", "skip_header_lines": 1, "symmetric": true }
                }
            }"#,
        )
        .unwrap();

        let spec = JobSpec::from_json_path(&path).unwrap();
        assert_eq!(spec.execution, ExecutionSpec::default());
        match spec.graph.format {
            InputFormat::EdgeList(f) => {
                assert_eq!(f.delimiter, ' ');
                assert_eq!(f.skip_header_lines, 1);
                assert!(f.symmetric);
            }
            other => panic!("unexpected format {other:?}"),
        }
    }
}
