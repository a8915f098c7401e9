use std::collections::HashMap;

use tracing::debug;
use tunkrank_common::types::{Edge, VertexId};

use crate::graph::partitioned_graph::{GraphPartition, PartitionedGraph, VertexAddr};
use crate::shuffle::partitioner::partition_of;

/// Endpoints of an edge are declared implicitly with the default value.
pub struct GraphBuilder<VV> {
    default_value: VV,
    ids: Vec<VertexId>,
    slots: HashMap<VertexId, usize>,
    values: Vec<VV>,
    out_degree: Vec<usize>,
    in_degree: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

impl<VV> GraphBuilder<VV>
where
    VV: Copy + Send + Sync + 'static,
{
    pub fn new(default_value: VV) -> Self {
        Self {
            default_value,
            ids: Vec::new(),
            slots: HashMap::new(),
            values: Vec::new(),
            out_degree: Vec::new(),
            in_degree: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.ids.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Declares `id`, overwriting its value if it already exists.
    pub fn add_vertex(&mut self, id: VertexId, value: VV) {
        let slot = self.slot_of(id);
        self.values[slot] = value;
    }

    pub fn declare_vertex(&mut self, id: VertexId) {
        self.slot_of(id);
    }

    pub fn add_edge(&mut self, src_id: VertexId, target_id: VertexId) {
        let src = self.slot_of(src_id);
        let target = self.slot_of(target_id);
        self.out_degree[src] += 1;
        self.in_degree[target] += 1;
        self.edges.push((src, target));
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge<VertexId>>) {
        for e in edges {
            self.add_edge(e.src_id, e.target_id);
        }
    }

    pub fn out_degree(&self, id: VertexId) -> Option<usize> {
        self.slots.get(&id).map(|&slot| self.out_degree[slot])
    }

    fn slot_of(&mut self, id: VertexId) -> usize {
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let slot = self.ids.len();
        self.ids.push(id);
        self.values.push(self.default_value);
        self.out_degree.push(0);
        self.in_degree.push(0);
        self.slots.insert(id, slot);
        slot
    }

    pub fn finalize(self, partitions: usize) -> PartitionedGraph<VV> {
        let partitions = partitions.max(1);

        let mut addrs: Vec<VertexAddr> = Vec::with_capacity(self.ids.len());
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); partitions];
        for (slot, &id) in self.ids.iter().enumerate() {
            let p = partition_of(id, partitions);
            addrs.push(VertexAddr {
                partition: p as u32,
                local: members[p].len() as u32,
            });
            members[p].push(slot);
        }

        let mut parts: Vec<GraphPartition<VV>> = members
            .iter()
            .map(|slots| {
                let mut in_offsets = Vec::with_capacity(slots.len() + 1);
                let mut out_offsets = Vec::with_capacity(slots.len() + 1);
                in_offsets.push(0);
                out_offsets.push(0);
                for &slot in slots {
                    in_offsets.push(in_offsets[in_offsets.len() - 1] + self.in_degree[slot]);
                    out_offsets.push(out_offsets[out_offsets.len() - 1] + self.out_degree[slot]);
                }
                let in_len = in_offsets[slots.len()];
                let out_len = out_offsets[slots.len()];
                GraphPartition {
                    ids: slots.iter().map(|&s| self.ids[s]).collect(),
                    values: slots.iter().map(|&s| self.values[s]).collect(),
                    in_offsets,
                    in_sources: vec![VertexAddr::default(); in_len],
                    out_offsets,
                    out_targets: vec![VertexAddr::default(); out_len],
                }
            })
            .collect();

        let mut in_cursor: Vec<Vec<usize>> = parts
            .iter()
            .map(|p| p.in_offsets[..p.ids.len()].to_vec())
            .collect();
        let mut out_cursor: Vec<Vec<usize>> = parts
            .iter()
            .map(|p| p.out_offsets[..p.ids.len()].to_vec())
            .collect();

        for &(src, target) in &self.edges {
            let s = addrs[src];
            let t = addrs[target];

            let c = &mut out_cursor[s.partition as usize][s.local as usize];
            parts[s.partition as usize].out_targets[*c] = t;
            *c += 1;

            let c = &mut in_cursor[t.partition as usize][t.local as usize];
            parts[t.partition as usize].in_sources[*c] = s;
            *c += 1;
        }

        let index: HashMap<VertexId, VertexAddr> = self
            .ids
            .iter()
            .zip(addrs.iter())
            .map(|(&id, &addr)| (id, addr))
            .collect();

        debug!(
            vertices = self.ids.len(),
            edges = self.edges.len(),
            partitions,
            "graph finalized"
        );

        PartitionedGraph::from_parts(parts, index, self.edges.len())
    }
}
