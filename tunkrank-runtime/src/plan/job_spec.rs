use std::path::Path;

use serde::{Deserialize, Serialize};
use tunkrank_common::config::{keys, Configuration};
use tunkrank_common::error::{TunkRankError, TunkRankResult};

use crate::algorithms::tunkrank::TunkRankConfig;
use crate::engine::EngineKind;
use crate::io::generator::PowerLawSpec;
use crate::io::loader::GraphFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    #[serde(default)]
    pub source: Option<GraphSource>,
    #[serde(default)]
    pub program: TunkRankConfig,
    #[serde(default)]
    pub engine: EngineSpec,
    #[serde(default)]
    pub output: Option<OutputSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphSource {
    File { path: String, format: GraphFormat },
    PowerLaw(PowerLawSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSpec {
    pub kind: EngineKind,
    /// Defaults to the number of CPUs.
    pub partitions: Option<usize>,
    /// Defaults to the number of CPUs.
    pub threads: Option<usize>,
    pub max_iterations: Option<u64>,
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            kind: EngineKind::Synchronous,
            partitions: None,
            threads: None,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub save_prefix: String,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, source: GraphSource) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
            program: TunkRankConfig::default(),
            engine: EngineSpec::default(),
            output: None,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TunkRankResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            TunkRankError::Config(format!(
                "job file {}: {e}",
                path.as_ref().display()
            ))
        })
    }

    /// Assembles a job from key/value settings. `source` comes from the
    /// caller since graph inputs are not part of the key space.
    pub fn from_configuration(
        name: impl Into<String>,
        source: Option<GraphSource>,
        conf: &Configuration,
    ) -> TunkRankResult<Self> {
        let program = TunkRankConfig::from_configuration(conf)?;
        let kind: EngineKind = conf.get_string(keys::ENGINE, "synchronous").parse()?;
        let engine = EngineSpec {
            kind,
            partitions: optional(conf, keys::GRAPH_PARTITIONS, Configuration::get_usize)?,
            threads: optional(conf, keys::ENGINE_THREADS, Configuration::get_usize)?,
            max_iterations: optional(conf, keys::ENGINE_MAX_ITERATIONS, Configuration::get_u64)?,
        };
        let output = conf.get(keys::SAVE_PREFIX).map(|prefix| OutputSpec {
            save_prefix: prefix.clone(),
        });
        Ok(Self {
            name: name.into(),
            source,
            program,
            engine,
            output,
        })
    }
}

fn optional<T: Default>(
    conf: &Configuration,
    key: &str,
    get: fn(&Configuration, &str, T) -> TunkRankResult<T>,
) -> TunkRankResult<Option<T>> {
    if conf.contains(key) {
        get(conf, key, T::default()).map(Some)
    } else {
        Ok(None)
    }
}
