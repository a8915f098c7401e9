use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::{Edge, VertexId};

use crate::graph::builder::GraphBuilder;

pub const DEFAULT_ALPHA: f64 = 2.0;
pub const DEFAULT_TRUNCATE: usize = 100_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerLawSpec {
    pub vertices: usize,
    pub alpha: f64,
    pub truncate: usize,
    pub seed: u64,
    pub in_degree: bool,
}

impl Default for PowerLawSpec {
    fn default() -> Self {
        Self {
            vertices: 0,
            alpha: DEFAULT_ALPHA,
            truncate: DEFAULT_TRUNCATE,
            seed: 0,
            in_degree: false,
        }
    }
}

impl PowerLawSpec {
    pub fn new(vertices: usize) -> Self {
        Self {
            vertices,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> TunkRankResult<()> {
        if self.vertices == 0 {
            return Err(TunkRankError::InvalidArgument(
                "powerlaw graph needs at least one vertex".to_string(),
            ));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(TunkRankError::InvalidArgument(format!(
                "powerlaw alpha must be positive, got {}",
                self.alpha
            )));
        }
        if self.truncate == 0 {
            return Err(TunkRankError::InvalidArgument(
                "powerlaw truncate must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn max_degree(&self) -> usize {
        self.vertices.saturating_sub(1).min(self.truncate)
    }
}

fn degree_cdf(alpha: f64, max_degree: usize) -> Vec<f64> {
    let mut cdf = Vec::with_capacity(max_degree);
    let mut acc = 0.0;
    for k in 1..=max_degree {
        acc += (k as f64).powf(-alpha);
        cdf.push(acc);
    }
    if acc > 0.0 {
        cdf.iter_mut().for_each(|c| *c /= acc);
    }
    cdf
}

fn sample_degree(cdf: &[f64], rng: &mut SmallRng) -> usize {
    let u: f64 = rng.random::<f64>();
    let idx = cdf.partition_point(|&c| c < u);
    idx.min(cdf.len() - 1) + 1
}

/// Returns the number of edges added. Duplicate edges are possible, self
/// loops are not.
pub fn generate_powerlaw<VV>(
    builder: &mut GraphBuilder<VV>,
    spec: &PowerLawSpec,
) -> TunkRankResult<usize>
where
    VV: Copy + Send + Sync + 'static,
{
    spec.validate()?;
    let n = spec.vertices as VertexId;
    for id in 0..n {
        builder.declare_vertex(id);
    }

    let max_degree = spec.max_degree();
    if max_degree == 0 {
        info!(vertices = spec.vertices, "powerlaw graph has a single vertex");
        return Ok(0);
    }

    let cdf = degree_cdf(spec.alpha, max_degree);
    let mut rng = SmallRng::seed_from_u64(spec.seed);
    let mut edges = Vec::new();
    for s in 0..n {
        let degree = sample_degree(&cdf, &mut rng);
        for _ in 0..degree {
            let mut t = rng.random_range(0..n - 1);
            if t >= s {
                t += 1;
            }
            edges.push(if spec.in_degree {
                Edge::new(t, s)
            } else {
                Edge::new(s, t)
            });
        }
    }
    let edges_added = edges.len();
    builder.add_edges(edges);
    info!(
        vertices = spec.vertices,
        edges = edges_added,
        alpha = spec.alpha,
        seed = spec.seed,
        "generated powerlaw graph"
    );
    Ok(edges_added)
}
