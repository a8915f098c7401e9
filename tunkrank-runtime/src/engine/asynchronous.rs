use std::sync::atomic::{fence, AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};
use tunkrank_api::function::{EdgeView, GatherValue, VertexProgram, VertexValue, VertexView};
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::VertexId;

use crate::engine::{EngineConfig, EngineKind, RunSummary, StepContext};
use crate::graph::partitioned_graph::{PartitionedGraph, VertexAddr};
use crate::scheduler::{ActiveSet, Schedule};
use crate::shuffle::{LocalShuffle, SignalShuffle};

const IDLE: u8 = 0;
const QUEUED: u8 = 1;
const RUNNING: u8 = 2;
const RESCHEDULE: u8 = 3;

enum Task {
    Run(VertexAddr),
    Stop,
}

/// A vertex is queued at most once and never runs on two workers at once. A
/// signal that arrives while it runs makes it run once more afterwards.
pub struct AsynchronousEngine<'g, P: VertexProgram> {
    graph: &'g mut PartitionedGraph<P::Value>,
    program: &'g P,
    threads: usize,
    initial: Vec<ActiveSet>,
    shuffle: LocalShuffle,
}

impl<'g, P: VertexProgram> AsynchronousEngine<'g, P> {
    pub fn new(
        graph: &'g mut PartitionedGraph<P::Value>,
        program: &'g P,
        config: &EngineConfig,
    ) -> TunkRankResult<Self> {
        if config.schedule == Schedule::AllVertices {
            return Err(TunkRankError::InvalidArgument(
                "the all-vertices schedule requires the synchronous engine".to_string(),
            ));
        }
        if let Some(max) = config.max_iterations {
            warn!(
                max_iterations = max,
                "asynchronous engine has no supersteps, ignoring max_iterations"
            );
        }
        let initial = graph
            .partitions()
            .iter()
            .map(|p| ActiveSet::empty(p.len()))
            .collect();
        Ok(Self {
            graph,
            program,
            threads: config.threads.max(1),
            initial,
            shuffle: LocalShuffle,
        })
    }

    pub fn signal_all(&mut self) {
        self.initial.iter_mut().for_each(ActiveSet::activate_all);
    }

    pub fn signal(&mut self, vertex_id: VertexId) -> TunkRankResult<()> {
        self.shuffle
            .route_outbox(&*self.graph, vec![vertex_id], &mut self.initial)?;
        Ok(())
    }

    pub fn start(&mut self) -> TunkRankResult<RunSummary> {
        let started = Instant::now();
        info!(
            program = self.program.name(),
            threads = self.threads,
            "asynchronous engine started"
        );
        let initial = std::mem::take(&mut self.initial);

        let (values, updates) = {
            let graph: &PartitionedGraph<P::Value> = &*self.graph;
            let (sender, receiver) = crossbeam_channel::unbounded();
            let shared = SharedState::new(graph, self.program, sender, self.threads);

            for (p, active) in initial.iter().enumerate() {
                for local in active.iter_active() {
                    shared.signal(VertexAddr {
                        partition: p as u32,
                        local: local as u32,
                    })?;
                }
            }

            if shared.pending.load(Ordering::Acquire) > 0 {
                shared.run_workers(&receiver)?;
            }
            let updates = shared.updates.load(Ordering::Acquire);
            (shared.into_values(), updates)
        };

        for (part, values) in self.graph.partitions_mut().iter_mut().zip(values) {
            for (local, value) in values.into_iter().enumerate() {
                part.set_value(local, value);
            }
        }

        metrics::counter!("tunkrank_async_updates_total").increment(updates);
        let summary = RunSummary {
            kind: EngineKind::Asynchronous,
            supersteps: 0,
            updates,
            elapsed: started.elapsed(),
        };
        info!(
            program = self.program.name(),
            updates = summary.updates,
            seconds = summary.elapsed_seconds(),
            "asynchronous engine finished"
        );
        Ok(summary)
    }
}

struct SharedState<'a, P: VertexProgram> {
    graph: &'a PartitionedGraph<P::Value>,
    program: &'a P,
    values: Vec<Vec<AtomicU64>>,
    status: Vec<Vec<AtomicU8>>,
    /// Vertices queued or running.
    pending: AtomicUsize,
    updates: AtomicU64,
    aborted: AtomicBool,
    sender: Sender<Task>,
    threads: usize,
}

impl<'a, P: VertexProgram> SharedState<'a, P> {
    fn new(
        graph: &'a PartitionedGraph<P::Value>,
        program: &'a P,
        sender: Sender<Task>,
        threads: usize,
    ) -> Self {
        let values = graph
            .partitions()
            .iter()
            .map(|p| {
                (0..p.len())
                    .map(|l| AtomicU64::new(p.value(l).to_bits()))
                    .collect()
            })
            .collect();
        let status = graph
            .partitions()
            .iter()
            .map(|p| (0..p.len()).map(|_| AtomicU8::new(IDLE)).collect())
            .collect();
        Self {
            graph,
            program,
            values,
            status,
            pending: AtomicUsize::new(0),
            updates: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
            sender,
            threads,
        }
    }

    fn into_values(self) -> Vec<Vec<P::Value>> {
        self.values
            .into_iter()
            .map(|cells| {
                cells
                    .into_iter()
                    .map(|c| <P::Value as VertexValue>::from_bits(c.into_inner()))
                    .collect()
            })
            .collect()
    }

    fn value(&self, addr: VertexAddr) -> P::Value {
        let cell = &self.values[addr.partition as usize][addr.local as usize];
        let bits = cell.load(Ordering::Acquire);
        <P::Value as VertexValue>::from_bits(bits)
    }

    fn view(&self, addr: VertexAddr) -> VertexView<P::Value> {
        self.graph.partitions()[addr.partition as usize]
            .view_with(addr.local as usize, self.value(addr))
    }

    fn signal(&self, addr: VertexAddr) -> TunkRankResult<()> {
        let cell = &self.status[addr.partition as usize][addr.local as usize];
        let mut current = cell.load(Ordering::Acquire);
        loop {
            let next = match current {
                IDLE => QUEUED,
                RUNNING => RESCHEDULE,
                _ => return Ok(()),
            };
            match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    if next == QUEUED {
                        self.enqueue(addr)?;
                    }
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn enqueue(&self, addr: VertexAddr) -> TunkRankResult<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.sender
            .send(Task::Run(addr))
            .map_err(|e| TunkRankError::Internal(format!("activation queue closed: {e}")))
    }

    fn broadcast_stop(&self) {
        for _ in 0..self.threads {
            let _ = self.sender.send(Task::Stop);
        }
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.broadcast_stop();
    }

    fn run_workers(&self, receiver: &Receiver<Task>) -> TunkRankResult<()> {
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..self.threads)
                .map(|i| {
                    let receiver = receiver.clone();
                    std::thread::Builder::new()
                        .name(format!("tunkrank-async-{i}"))
                        .spawn_scoped(s, move || self.worker(receiver))
                })
                .collect();

            let mut result = Ok(());
            for handle in handles {
                let joined = match handle {
                    Ok(h) => h
                        .join()
                        .map_err(|_| TunkRankError::Internal("worker panicked".to_string()))
                        .and_then(|r| r),
                    Err(e) => {
                        self.abort();
                        Err(TunkRankError::Internal(format!("spawn worker: {e}")))
                    }
                };
                if result.is_ok() {
                    result = joined;
                }
            }
            result
        })
    }

    fn worker(&self, receiver: Receiver<Task>) -> TunkRankResult<()> {
        for task in receiver.iter() {
            let addr = match task {
                Task::Stop => break,
                Task::Run(addr) => addr,
            };
            if !self.aborted.load(Ordering::Acquire) {
                if let Err(e) = self.run_vertex(addr) {
                    self.abort();
                    return Err(e);
                }
            }
            if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                debug!("activation queue drained");
                self.broadcast_stop();
            }
        }
        Ok(())
    }

    fn run_vertex(&self, addr: VertexAddr) -> TunkRankResult<()> {
        let program = self.program;
        let status = &self.status[addr.partition as usize][addr.local as usize];
        status.store(RUNNING, Ordering::Release);
        // Pairs with the fence after the value store: a concurrent signaller
        // either sees RUNNING or its new value is visible to this gather.
        fence(Ordering::SeqCst);

        let part = &self.graph.partitions()[addr.partition as usize];
        let local = addr.local as usize;
        let mut vertex = self.view(addr);

        let direction = program.gather_edges(&vertex);
        let mut total = <P::Gather as GatherValue>::zero();
        if direction.includes_in() {
            for &src in part.in_edges(local) {
                let edge = EdgeView {
                    source: self.view(src),
                    target: vertex,
                };
                total = total.combine(program.gather(&vertex, &edge));
            }
        }
        if direction.includes_out() {
            for &target in part.out_edges(local) {
                let edge = EdgeView {
                    source: vertex,
                    target: self.view(target),
                };
                total = total.combine(program.gather(&vertex, &edge));
            }
        }

        let mut ctx = StepContext::new(Vec::new());
        let state = program.apply(&mut ctx, &mut vertex, total);
        self.values[addr.partition as usize][local].store(vertex.value.to_bits(), Ordering::Release);
        fence(Ordering::SeqCst);
        self.updates.fetch_add(1, Ordering::Relaxed);

        // Self-signals from apply are dropped; scatter may still reschedule.
        let vertex_id = vertex.id;
        ctx.outbox.retain(|&id| id != vertex_id);

        let direction = program.scatter_edges(&vertex, &state);
        if direction.includes_out() {
            for &target in part.out_edges(local) {
                let edge = EdgeView {
                    source: vertex,
                    target: self.view(target),
                };
                program.scatter(&mut ctx, &vertex, &edge);
            }
        }
        if direction.includes_in() {
            for &src in part.in_edges(local) {
                let edge = EdgeView {
                    source: self.view(src),
                    target: vertex,
                };
                program.scatter(&mut ctx, &vertex, &edge);
            }
        }

        for id in ctx.outbox {
            let target = self.graph.addr_of(id).ok_or_else(|| {
                TunkRankError::InvalidArgument(format!("signal to unknown vertex {id}"))
            })?;
            self.signal(target)?;
        }

        if status
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            status.store(QUEUED, Ordering::Release);
            self.enqueue(addr)?;
        }
        Ok(())
    }
}
