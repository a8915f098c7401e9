//! influence(v) = sum over followers u of (1 + p * influence(u)) / out_degree(u)

use serde::{Deserialize, Serialize};
use tunkrank_api::function::{
    EdgeDirection, EdgeView, VertexProgram, VertexProgramContext, VertexView,
};
use tunkrank_common::config::{keys, Configuration};
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::VertexId;

pub const INITIAL_INFLUENCE: f64 = 1.0;
pub const DEFAULT_RETWEET_PROBABILITY: f64 = 0.05;
pub const DEFAULT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunkRankConfig {
    pub retweet_probability: f64,
    pub tolerance: f64,
    pub fixed_iterations: u64,
}

impl Default for TunkRankConfig {
    fn default() -> Self {
        Self {
            retweet_probability: DEFAULT_RETWEET_PROBABILITY,
            tolerance: DEFAULT_TOLERANCE,
            fixed_iterations: 0,
        }
    }
}

impl TunkRankConfig {
    pub fn from_configuration(conf: &Configuration) -> TunkRankResult<Self> {
        let defaults = Self::default();
        let config = Self {
            retweet_probability: conf
                .get_f64(keys::RETWEET_PROBABILITY, defaults.retweet_probability)?,
            tolerance: conf.get_f64(keys::TOLERANCE, defaults.tolerance)?,
            fixed_iterations: conf.get_u64(keys::FIXED_ITERATIONS, defaults.fixed_iterations)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TunkRankResult<()> {
        if !self.retweet_probability.is_finite() || !(0.0..=1.0).contains(&self.retweet_probability)
        {
            return Err(TunkRankError::Config(format!(
                "retweet probability must be within [0, 1], got {}",
                self.retweet_probability
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(TunkRankError::Config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_iterations > 0
    }
}

pub fn init_vertex(_id: VertexId, influence: &mut f64) {
    *influence = INITIAL_INFLUENCE;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunkRankState {
    /// None in fixed-iteration mode.
    pub last_change: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TunkRankProgram {
    config: TunkRankConfig,
}

impl TunkRankProgram {
    pub fn new(config: TunkRankConfig) -> TunkRankResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn contribution(&self, follower_influence: f64, follower_out_degree: usize) -> f64 {
        if follower_out_degree == 0 {
            return 0.0;
        }
        (1.0 + self.config.retweet_probability * follower_influence) / follower_out_degree as f64
    }
}

impl VertexProgram for TunkRankProgram {
    type Value = f64;
    type Gather = f64;
    type State = TunkRankState;

    fn name(&self) -> &str {
        "tunkrank"
    }

    fn gather(&self, _vertex: &VertexView<f64>, edge: &EdgeView<f64>) -> f64 {
        self.contribution(edge.source.value, edge.source.num_out_edges)
    }

    fn apply(
        &self,
        context: &mut dyn VertexProgramContext,
        vertex: &mut VertexView<f64>,
        total: f64,
    ) -> TunkRankState {
        let last_change = (total - vertex.value).abs();
        vertex.value = total;
        if self.config.is_fixed() {
            context.signal(vertex.id);
            TunkRankState { last_change: None }
        } else {
            TunkRankState {
                last_change: Some(last_change),
            }
        }
    }

    fn scatter_edges(&self, _vertex: &VertexView<f64>, state: &TunkRankState) -> EdgeDirection {
        if self.config.is_fixed() {
            return EdgeDirection::None;
        }
        match state.last_change {
            Some(change) if change > self.config.tolerance => EdgeDirection::Out,
            _ => EdgeDirection::None,
        }
    }

    fn scatter(
        &self,
        context: &mut dyn VertexProgramContext,
        _vertex: &VertexView<f64>,
        edge: &EdgeView<f64>,
    ) {
        context.signal(edge.target.id);
    }
}
