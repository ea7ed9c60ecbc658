use crate::plan::job_spec::JobSpec;
use serde::{Deserialize, Serialize};

/// What a job will do, without touching its inputs. Printed by `--dry-run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub job_name: String,
    pub algorithm_name: String,
    pub start_vertex: u64,
    pub inputs: Vec<String>,
    pub partitions: usize,
    pub worker_threads: usize,
    pub max_supersteps: Option<u64>,
    pub output_shards: Vec<String>,
}

impl ExecutionPlan {
    pub fn from_job_spec(job: &JobSpec) -> Self {
        let exec = &job.execution;
        let output_shards = match &job.output_dir {
            Some(dir) => (0..exec.partitions)
                .map(|i| format!("{dir}/{}", crate::io::output::shard_name(i)))
                .collect(),
            None => Vec::new(),
        };
        Self {
            job_name: job.name.clone(),
            algorithm_name: "sssp".to_string(),
            start_vertex: job.start_vertex,
            inputs: job.graph.inputs.clone(),
            partitions: exec.partitions,
            worker_threads: exec
                .parallelism
                .unwrap_or_else(rayon::current_num_threads),
            max_supersteps: (exec.max_supersteps != u64::MAX).then_some(exec.max_supersteps),
            output_shards,
        }
    }
}
