pub mod execution_plan;
pub mod job_spec;

pub use execution_plan::ExecutionPlan;
pub use job_spec::{EngineSpec, GraphSource, JobSpec, OutputSpec};
