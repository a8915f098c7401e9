use tracing::{debug, info};
use tunkrank_common::error::TunkRankResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperstepStats {
    pub iteration: u64,
    pub active_vertices: usize,
    /// Signals emitted during apply and scatter, before collapsing.
    pub signals: usize,
    pub next_active: usize,
}

pub trait SuperstepExecutor {
    fn has_active(&self) -> bool;

    fn superstep(&mut self, iteration: u64) -> TunkRankResult<SuperstepStats>;
}

#[derive(Debug, Clone)]
pub struct SchedulerResult {
    pub executed_iterations: u64,
    pub updates: u64,
}

#[derive(Debug, Clone)]
enum State {
    Init,
    Running { iteration: u64 },
    Finished { executed: u64 },
}

/// Drives supersteps until quiescence or until `max_iterations` have run.
pub struct CycleScheduler;

impl CycleScheduler {
    pub fn run<E: SuperstepExecutor>(
        executor: &mut E,
        max_iterations: Option<u64>,
    ) -> TunkRankResult<SchedulerResult> {
        let max_iterations = max_iterations.unwrap_or(u64::MAX);
        let mut state = State::Init;
        let mut updates: u64 = 0;

        loop {
            state = match state {
                State::Init => State::Running { iteration: 1 },
                State::Running { iteration } => {
                    if iteration > max_iterations || !executor.has_active() {
                        State::Finished {
                            executed: iteration - 1,
                        }
                    } else {
                        let stats = executor.superstep(iteration)?;
                        updates += stats.active_vertices as u64;
                        debug!(
                            iteration,
                            active = stats.active_vertices,
                            signals = stats.signals,
                            next_active = stats.next_active,
                            "superstep done"
                        );
                        State::Running {
                            iteration: iteration + 1,
                        }
                    }
                }
                State::Finished { executed } => {
                    info!(iterations = executed, updates, "scheduler finished");
                    return Ok(SchedulerResult {
                        executed_iterations: executed,
                        updates,
                    });
                }
            };
        }
    }
}
