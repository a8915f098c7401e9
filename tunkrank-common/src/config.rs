use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{TunkRankError, TunkRankResult};

pub mod keys {
    pub const RETWEET_PROBABILITY: &str = "tunkrank.retweet.probability";
    pub const TOLERANCE: &str = "tunkrank.tolerance";
    pub const FIXED_ITERATIONS: &str = "tunkrank.iterations";
    pub const ENGINE: &str = "engine.type";
    pub const ENGINE_MAX_ITERATIONS: &str = "engine.max.iterations";
    pub const ENGINE_THREADS: &str = "engine.threads";
    pub const GRAPH_PARTITIONS: &str = "graph.partitions";
    pub const SAVE_PREFIX: &str = "output.saveprefix";
}

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    config: HashMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            config: HashMap::new(),
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    /// Parses a `key=value` override as given on the command line.
    pub fn put_pair(&mut self, pair: &str) -> TunkRankResult<()> {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            TunkRankError::Config(format!("expected key=value, got '{pair}'"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TunkRankError::Config(format!("empty key in '{pair}'")));
        }
        self.put(key, value.trim());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    pub fn get_string(&self, key: &str, default_value: &str) -> String {
        self.config
            .get(key)
            .cloned()
            .unwrap_or_else(|| default_value.to_string())
    }

    pub fn get_f64(&self, key: &str, default_value: f64) -> TunkRankResult<f64> {
        self.get_parsed(key, default_value)
    }

    pub fn get_u64(&self, key: &str, default_value: u64) -> TunkRankResult<u64> {
        self.get_parsed(key, default_value)
    }

    pub fn get_usize(&self, key: &str, default_value: usize) -> TunkRankResult<usize> {
        self.get_parsed(key, default_value)
    }

    fn get_parsed<T>(&self, key: &str, default_value: T) -> TunkRankResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.config.get(key) {
            None => Ok(default_value),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| TunkRankError::Config(format!("{key}='{raw}': {e}"))),
        }
    }
}
