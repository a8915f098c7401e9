use std::time::Instant;

use rayon::prelude::*;
use tracing::info;
use tunkrank_api::function::{EdgeView, GatherValue, VertexProgram};
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::VertexId;

use crate::engine::{EngineConfig, EngineKind, RunSummary, StepContext};
use crate::graph::partitioned_graph::{GraphPartition, PartitionedGraph};
use crate::scheduler::cycle_scheduler::{CycleScheduler, SuperstepExecutor, SuperstepStats};
use crate::scheduler::{ActiveSet, Schedule};
use crate::shuffle::{LocalShuffle, Outbox, SignalShuffle};

type Gathered<G> = Vec<(usize, G)>;
type Applied<S> = (Vec<(usize, S)>, Outbox);

/// Gather, apply and scatter run over all shards in parallel, separated by
/// barriers.
pub struct SynchronousEngine<'g, P: VertexProgram> {
    graph: &'g mut PartitionedGraph<P::Value>,
    program: &'g P,
    schedule: Schedule,
    max_iterations: Option<u64>,
    active: Vec<ActiveSet>,
    shuffle: LocalShuffle,
    pool: rayon::ThreadPool,
    iterations_done: u64,
}

impl<'g, P: VertexProgram> SynchronousEngine<'g, P> {
    pub fn new(
        graph: &'g mut PartitionedGraph<P::Value>,
        program: &'g P,
        config: &EngineConfig,
    ) -> TunkRankResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|i| format!("tunkrank-sync-{i}"))
            .build()
            .map_err(|e| TunkRankError::Internal(format!("thread pool: {e}")))?;
        let active = graph
            .partitions()
            .iter()
            .map(|p| ActiveSet::empty(p.len()))
            .collect();
        Ok(Self {
            graph,
            program,
            schedule: config.schedule,
            max_iterations: config.max_iterations,
            active,
            shuffle: LocalShuffle,
            pool,
            iterations_done: 0,
        })
    }

    pub fn signal_all(&mut self) {
        self.active.iter_mut().for_each(ActiveSet::activate_all);
    }

    pub fn signal(&mut self, vertex_id: VertexId) -> TunkRankResult<()> {
        self.shuffle
            .route_outbox(&*self.graph, vec![vertex_id], &mut self.active)?;
        Ok(())
    }

    pub fn num_active(&self) -> usize {
        self.active.iter().map(ActiveSet::count).sum()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations_done
    }

    pub fn graph(&self) -> &PartitionedGraph<P::Value> {
        &*self.graph
    }

    /// Runs exactly one superstep, ignoring the iteration cap.
    pub fn run_superstep(&mut self) -> TunkRankResult<SuperstepStats> {
        let iteration = self.iterations_done + 1;
        self.superstep(iteration)
    }

    pub fn start(&mut self) -> TunkRankResult<RunSummary> {
        let started = Instant::now();
        info!(program = self.program.name(), "synchronous engine started");
        let max_iterations = self.max_iterations;
        let result = CycleScheduler::run(self, max_iterations)?;
        let summary = RunSummary {
            kind: EngineKind::Synchronous,
            supersteps: result.executed_iterations,
            updates: result.updates,
            elapsed: started.elapsed(),
        };
        info!(
            program = self.program.name(),
            supersteps = summary.supersteps,
            updates = summary.updates,
            seconds = summary.elapsed_seconds(),
            "synchronous engine finished"
        );
        Ok(summary)
    }
}

impl<'g, P: VertexProgram> SuperstepExecutor for SynchronousEngine<'g, P> {
    fn has_active(&self) -> bool {
        self.active.iter().any(|a| !a.is_empty())
    }

    fn superstep(&mut self, iteration: u64) -> TunkRankResult<SuperstepStats> {
        let started = Instant::now();
        let program = self.program;
        let active = std::mem::take(&mut self.active);
        let active_vertices: usize = active.iter().map(ActiveSet::count).sum();

        let gathered = {
            let graph: &PartitionedGraph<P::Value> = &*self.graph;
            self.pool.install(|| gather_phase(graph, program, &active))
        };

        let applied = {
            let partitions = self.graph.partitions_mut();
            self.pool.install(|| apply_phase(partitions, program, gathered))
        };

        let outboxes = {
            let graph: &PartitionedGraph<P::Value> = &*self.graph;
            self.pool.install(|| scatter_phase(graph, program, applied))
        };

        let mut next: Vec<ActiveSet> = self
            .graph
            .partitions()
            .iter()
            .map(|p| match self.schedule {
                Schedule::Dynamic => ActiveSet::empty(p.len()),
                Schedule::AllVertices => ActiveSet::full(p.len()),
            })
            .collect();

        let mut signals = 0;
        for outbox in outboxes {
            signals += outbox.len();
            self.shuffle.route_outbox(&*self.graph, outbox, &mut next)?;
        }
        let next_active = next.iter().map(ActiveSet::count).sum();
        self.active = next;
        self.iterations_done = iteration;

        metrics::counter!("tunkrank_superstep_active_vertices").increment(active_vertices as u64);
        metrics::counter!("tunkrank_superstep_signals_total").increment(signals as u64);
        metrics::histogram!("tunkrank_superstep_duration_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(SuperstepStats {
            iteration,
            active_vertices,
            signals,
            next_active,
        })
    }
}

fn gather_phase<P: VertexProgram>(
    graph: &PartitionedGraph<P::Value>,
    program: &P,
    active: &[ActiveSet],
) -> Vec<Gathered<P::Gather>> {
    graph
        .partitions()
        .par_iter()
        .zip(active.par_iter())
        .map(|(part, active)| {
            active
                .iter_active()
                .map(|local| (local, gather_vertex(graph, program, part, local)))
                .collect()
        })
        .collect()
}

fn gather_vertex<P: VertexProgram>(
    graph: &PartitionedGraph<P::Value>,
    program: &P,
    part: &GraphPartition<P::Value>,
    local: usize,
) -> P::Gather {
    let vertex = part.view(local);
    let direction = program.gather_edges(&vertex);
    let mut total = <P::Gather as GatherValue>::zero();
    if direction.includes_in() {
        for &src in part.in_edges(local) {
            let edge = EdgeView {
                source: graph.view(src),
                target: vertex,
            };
            total = total.combine(program.gather(&vertex, &edge));
        }
    }
    if direction.includes_out() {
        for &target in part.out_edges(local) {
            let edge = EdgeView {
                source: vertex,
                target: graph.view(target),
            };
            total = total.combine(program.gather(&vertex, &edge));
        }
    }
    total
}

fn apply_phase<P: VertexProgram>(
    partitions: &mut [GraphPartition<P::Value>],
    program: &P,
    gathered: Vec<Gathered<P::Gather>>,
) -> Vec<Applied<P::State>> {
    partitions
        .par_iter_mut()
        .zip(gathered.into_par_iter())
        .map(|(part, gathered)| {
            let mut ctx = StepContext::new(Vec::new());
            let applied = gathered
                .into_iter()
                .map(|(local, total)| {
                    let mut vertex = part.view(local);
                    let state = program.apply(&mut ctx, &mut vertex, total);
                    part.set_value(local, vertex.value);
                    (local, state)
                })
                .collect();
            (applied, ctx.outbox)
        })
        .collect()
}

fn scatter_phase<P: VertexProgram>(
    graph: &PartitionedGraph<P::Value>,
    program: &P,
    applied: Vec<Applied<P::State>>,
) -> Vec<Outbox> {
    graph
        .partitions()
        .par_iter()
        .zip(applied.into_par_iter())
        .map(|(part, (applied, outbox))| {
            let mut ctx = StepContext::new(outbox);
            for (local, state) in applied {
                let vertex = part.view(local);
                let direction = program.scatter_edges(&vertex, &state);
                if direction.includes_out() {
                    for &target in part.out_edges(local) {
                        let edge = EdgeView {
                            source: vertex,
                            target: graph.view(target),
                        };
                        program.scatter(&mut ctx, &vertex, &edge);
                    }
                }
                if direction.includes_in() {
                    for &src in part.in_edges(local) {
                        let edge = EdgeView {
                            source: graph.view(src),
                            target: vertex,
                        };
                        program.scatter(&mut ctx, &vertex, &edge);
                    }
                }
            }
            ctx.outbox
        })
        .collect()
}
