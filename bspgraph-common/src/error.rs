use thiserror::Error;

pub type BspResult<T> = Result<T, BspError>;

#[derive(Debug, Error)]
pub enum BspError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("vertex {id} declared twice (second declaration at line {line})")]
    DuplicateVertex { id: u64, line: u64 },

    #[error("edge {src_id} -> {target_id} references an undeclared vertex")]
    UnknownDestination { src_id: u64, target_id: u64 },

    #[error("message for unknown vertex {target} in superstep {superstep}")]
    UndeliverableMessage { target: String, superstep: u64 },

    #[error("vertex {vertex_id} failed in superstep {superstep}: {message}")]
    VertexCompute {
        vertex_id: String,
        superstep: u64,
        message: String,
    },

    #[error("no convergence after {max_supersteps} supersteps")]
    NonConvergence { max_supersteps: u64 },

    #[error("run cancelled before superstep {superstep}")]
    Cancelled { superstep: u64 },
}
