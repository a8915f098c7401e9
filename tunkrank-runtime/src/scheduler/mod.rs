pub mod cycle_scheduler;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Dynamic,
    AllVertices,
}

/// Duplicate activations collapse.
#[derive(Debug, Clone)]
pub struct ActiveSet {
    flags: Vec<bool>,
    count: usize,
}

impl ActiveSet {
    pub fn empty(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            count: 0,
        }
    }

    pub fn full(len: usize) -> Self {
        Self {
            flags: vec![true; len],
            count: len,
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_active(&self, local: usize) -> bool {
        self.flags[local]
    }

    /// Returns true if the vertex was not active before.
    pub fn activate(&mut self, local: usize) -> bool {
        if self.flags[local] {
            return false;
        }
        self.flags[local] = true;
        self.count += 1;
        true
    }

    pub fn activate_all(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = true);
        self.count = self.flags.len();
    }

    pub fn iter_active(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &active)| active.then_some(i))
    }
}
