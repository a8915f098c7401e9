use std::path::PathBuf;

use tracing::info;
use tunkrank_api::graph::PGraph;
use tunkrank_common::error::TunkRankResult;
use tunkrank_common::types::VertexId;

use crate::algorithms::tunkrank::{init_vertex, TunkRankProgram, INITIAL_INFLUENCE};
use crate::engine::{Engine, RunSummary};
use crate::graph::builder::GraphBuilder;
use crate::graph::partitioned_graph::PartitionedGraph;
use crate::io::{generate_powerlaw, load_graph, save_partitioned};
use crate::plan::{ExecutionPlan, GraphSource, JobSpec};

pub struct JobResult {
    pub graph: PartitionedGraph<f64>,
    pub summary: RunSummary,
    /// Shard files, empty when no save prefix was configured.
    pub output_files: Vec<PathBuf>,
}

impl JobResult {
    pub fn influence(&self, id: VertexId) -> Option<f64> {
        self.graph.value_of(id)
    }
}

pub struct TunkRankJob {
    plan: ExecutionPlan,
}

impl TunkRankJob {
    pub fn new(plan: ExecutionPlan) -> Self {
        Self { plan }
    }

    pub fn from_spec(spec: &JobSpec) -> TunkRankResult<Self> {
        ExecutionPlan::from_job_spec(spec).map(Self::new)
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn build_graph(&self) -> TunkRankResult<PartitionedGraph<f64>> {
        let mut builder = GraphBuilder::new(INITIAL_INFLUENCE);
        match &self.plan.source {
            GraphSource::File { path, format } => {
                info!(path = %path, %format, "loading graph");
                load_graph(&mut builder, path, *format)?;
            }
            GraphSource::PowerLaw(spec) => {
                info!(vertices = spec.vertices, "generating powerlaw graph");
                generate_powerlaw(&mut builder, spec)?;
            }
        }
        let graph = builder.finalize(self.plan.partitions);
        info!(
            vertices = graph.num_vertices(),
            edges = graph.num_edges(),
            partitions = graph.num_partitions(),
            "graph finalized"
        );
        Ok(graph)
    }

    pub fn execute(&self) -> TunkRankResult<JobResult> {
        let program = TunkRankProgram::new(self.plan.program)?;
        let mut graph = self.build_graph()?;
        graph.transform_vertices(init_vertex);

        let summary = {
            let mut engine = Engine::new(&mut graph, &program, &self.plan.engine)?;
            engine.signal_all();
            engine.start()?
        };
        info!(
            job = %self.plan.name,
            engine = %summary.kind,
            supersteps = summary.supersteps,
            updates = summary.updates,
            seconds = summary.elapsed_seconds(),
            "finished running engine"
        );

        let output_files = match &self.plan.save_prefix {
            Some(prefix) => save_partitioned(&graph, prefix)?,
            None => Vec::new(),
        };
        Ok(JobResult {
            graph,
            summary,
            output_files,
        })
    }
}
