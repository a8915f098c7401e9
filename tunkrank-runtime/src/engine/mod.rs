//! Synchronous (BSP) and asynchronous GAS engines.

pub mod asynchronous;
pub mod synchronous;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tunkrank_api::function::{VertexProgram, VertexProgramContext};
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::VertexId;

use crate::graph::partitioned_graph::PartitionedGraph;
use crate::scheduler::Schedule;
use crate::shuffle::Outbox;

pub use asynchronous::AsynchronousEngine;
pub use synchronous::SynchronousEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Synchronous,
    Asynchronous,
}

impl FromStr for EngineKind {
    type Err = TunkRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synchronous" | "sync" => Ok(EngineKind::Synchronous),
            "asynchronous" | "async" => Ok(EngineKind::Asynchronous),
            other => Err(TunkRankError::Config(format!(
                "unknown engine type '{other}', expected synchronous or asynchronous"
            ))),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Synchronous => f.write_str("synchronous"),
            EngineKind::Asynchronous => f.write_str("asynchronous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub schedule: Schedule,
    /// Upper bound on supersteps; only the synchronous engine counts them.
    pub max_iterations: Option<u64>,
    pub threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Synchronous,
            schedule: Schedule::Dynamic,
            max_iterations: None,
            threads: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub kind: EngineKind,
    /// Always 0 for the asynchronous engine.
    pub supersteps: u64,
    pub updates: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

pub(crate) struct StepContext {
    pub(crate) outbox: Outbox,
}

impl StepContext {
    pub(crate) fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl VertexProgramContext for StepContext {
    fn signal(&mut self, vertex_id: VertexId) {
        self.outbox.push(vertex_id);
    }
}

pub enum Engine<'g, P: VertexProgram> {
    Synchronous(SynchronousEngine<'g, P>),
    Asynchronous(AsynchronousEngine<'g, P>),
}

impl<'g, P: VertexProgram> Engine<'g, P> {
    pub fn new(
        graph: &'g mut PartitionedGraph<P::Value>,
        program: &'g P,
        config: &EngineConfig,
    ) -> TunkRankResult<Self> {
        Ok(match config.kind {
            EngineKind::Synchronous => {
                Engine::Synchronous(SynchronousEngine::new(graph, program, config)?)
            }
            EngineKind::Asynchronous => {
                Engine::Asynchronous(AsynchronousEngine::new(graph, program, config)?)
            }
        })
    }

    pub fn signal_all(&mut self) {
        match self {
            Engine::Synchronous(e) => e.signal_all(),
            Engine::Asynchronous(e) => e.signal_all(),
        }
    }

    pub fn signal(&mut self, vertex_id: VertexId) -> TunkRankResult<()> {
        match self {
            Engine::Synchronous(e) => e.signal(vertex_id),
            Engine::Asynchronous(e) => e.signal(vertex_id),
        }
    }

    pub fn start(&mut self) -> TunkRankResult<RunSummary> {
        match self {
            Engine::Synchronous(e) => e.start(),
            Engine::Asynchronous(e) => e.start(),
        }
    }
}
