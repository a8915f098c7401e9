use tunkrank_common::error::TunkRankResult;
use tunkrank_runtime::engine::EngineKind;
use tunkrank_runtime::scheduler::cycle_scheduler::{
    CycleScheduler, SuperstepExecutor, SuperstepStats,
};

struct Countdown {
    remaining: usize,
    seen: Vec<u64>,
}

impl SuperstepExecutor for Countdown {
    fn has_active(&self) -> bool {
        self.remaining > 0
    }

    fn superstep(&mut self, iteration: u64) -> TunkRankResult<SuperstepStats> {
        self.seen.push(iteration);
        self.remaining -= 1;
        Ok(SuperstepStats {
            iteration,
            active_vertices: 1,
            signals: self.remaining,
            next_active: self.remaining,
        })
    }
}

#[test]
fn test_scheduler_stops_at_quiescence() {
    let mut exec = Countdown {
        remaining: 3,
        seen: Vec::new(),
    };
    let result = CycleScheduler::run(&mut exec, None).unwrap();
    assert_eq!(result.executed_iterations, 3);
    assert_eq!(result.updates, 3);
    assert_eq!(exec.seen, vec![1, 2, 3]);
}

#[test]
fn test_scheduler_stops_at_iteration_cap() {
    let mut exec = Countdown {
        remaining: 100,
        seen: Vec::new(),
    };
    let result = CycleScheduler::run(&mut exec, Some(5)).unwrap();
    assert_eq!(result.executed_iterations, 5);
    assert_eq!(exec.remaining, 95);
}

#[test]
fn test_scheduler_without_active_vertices_runs_nothing() {
    let mut exec = Countdown {
        remaining: 0,
        seen: Vec::new(),
    };
    let result = CycleScheduler::run(&mut exec, Some(10)).unwrap();
    assert_eq!(result.executed_iterations, 0);
    assert!(exec.seen.is_empty());
}

#[test]
fn test_engine_kind_parse() {
    assert_eq!(
        "synchronous".parse::<EngineKind>().unwrap(),
        EngineKind::Synchronous
    );
    assert_eq!(
        "ASYNC".parse::<EngineKind>().unwrap(),
        EngineKind::Asynchronous
    );
    assert!("threaded".parse::<EngineKind>().is_err());
    assert_eq!(EngineKind::Asynchronous.to_string(), "asynchronous");
}
