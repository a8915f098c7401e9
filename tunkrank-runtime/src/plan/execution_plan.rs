use tracing::{debug, warn};
use tunkrank_common::error::{TunkRankError, TunkRankResult};

use crate::algorithms::tunkrank::TunkRankConfig;
use crate::engine::{EngineConfig, EngineKind};
use crate::plan::job_spec::{GraphSource, JobSpec};
use crate::scheduler::Schedule;

/// A validated job with every default resolved.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub name: String,
    pub source: GraphSource,
    pub program: TunkRankConfig,
    pub engine: EngineConfig,
    pub partitions: usize,
    pub save_prefix: Option<String>,
}

impl ExecutionPlan {
    pub fn from_job_spec(job: &JobSpec) -> TunkRankResult<Self> {
        job.program.validate()?;
        let source = job.source.clone().ok_or(TunkRankError::MissingInput)?;
        if let GraphSource::PowerLaw(spec) = &source {
            spec.validate()?;
        }

        let partitions = job.engine.partitions.unwrap_or_else(num_cpus::get);
        if partitions == 0 {
            return Err(TunkRankError::InvalidArgument(
                "partitions must be at least 1".to_string(),
            ));
        }
        let threads = job.engine.threads.unwrap_or_else(num_cpus::get);
        if threads == 0 {
            return Err(TunkRankError::InvalidArgument(
                "threads must be at least 1".to_string(),
            ));
        }

        let engine = if job.program.is_fixed() {
            let n = job.program.fixed_iterations;
            if job.engine.kind == EngineKind::Asynchronous {
                warn!(
                    iterations = n,
                    "fixed iterations requested, forcing the synchronous engine"
                );
            }
            if let Some(max) = job.engine.max_iterations.filter(|&m| m != n) {
                debug!(max_iterations = max, iterations = n, "iterations override max_iterations");
            }
            EngineConfig {
                kind: EngineKind::Synchronous,
                schedule: Schedule::AllVertices,
                max_iterations: Some(n),
                threads,
            }
        } else {
            EngineConfig {
                kind: job.engine.kind,
                schedule: Schedule::Dynamic,
                max_iterations: job.engine.max_iterations,
                threads,
            }
        };

        let save_prefix = job.output.as_ref().map(|o| o.save_prefix.clone());
        if save_prefix.as_deref() == Some("") {
            return Err(TunkRankError::InvalidArgument(
                "save prefix must not be empty".to_string(),
            ));
        }

        Ok(Self {
            name: job.name.clone(),
            source,
            program: job.program,
            engine,
            partitions,
            save_prefix,
        })
    }
}
