pub mod execution_plan;
pub mod job_spec;
