use std::collections::HashMap;

use rayon::prelude::*;
use tunkrank_api::function::VertexView;
use tunkrank_api::graph::PGraph;
use tunkrank_common::types::{Vertex, VertexId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VertexAddr {
    pub partition: u32,
    pub local: u32,
}

/// CSR adjacency; offsets have length `len() + 1`.
pub struct GraphPartition<VV> {
    pub(crate) ids: Vec<VertexId>,
    pub(crate) values: Vec<VV>,
    pub(crate) in_offsets: Vec<usize>,
    pub(crate) in_sources: Vec<VertexAddr>,
    pub(crate) out_offsets: Vec<usize>,
    pub(crate) out_targets: Vec<VertexAddr>,
}

impl<VV: Copy> GraphPartition<VV> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, local: usize) -> VertexId {
        self.ids[local]
    }

    pub fn value(&self, local: usize) -> VV {
        self.values[local]
    }

    pub fn set_value(&mut self, local: usize, value: VV) {
        self.values[local] = value;
    }

    pub fn in_edges(&self, local: usize) -> &[VertexAddr] {
        &self.in_sources[self.in_offsets[local]..self.in_offsets[local + 1]]
    }

    pub fn out_edges(&self, local: usize) -> &[VertexAddr] {
        &self.out_targets[self.out_offsets[local]..self.out_offsets[local + 1]]
    }

    pub fn in_degree(&self, local: usize) -> usize {
        self.in_offsets[local + 1] - self.in_offsets[local]
    }

    pub fn out_degree(&self, local: usize) -> usize {
        self.out_offsets[local + 1] - self.out_offsets[local]
    }

    pub fn view(&self, local: usize) -> VertexView<VV> {
        self.view_with(local, self.values[local])
    }

    pub fn view_with(&self, local: usize, value: VV) -> VertexView<VV> {
        VertexView {
            id: self.ids[local],
            value,
            num_in_edges: self.in_degree(local),
            num_out_edges: self.out_degree(local),
        }
    }
}

pub struct PartitionedGraph<VV> {
    partitions: Vec<GraphPartition<VV>>,
    index: HashMap<VertexId, VertexAddr>,
    num_edges: usize,
}

impl<VV> PartitionedGraph<VV>
where
    VV: Copy + Send + Sync + 'static,
{
    pub(crate) fn from_parts(
        partitions: Vec<GraphPartition<VV>>,
        index: HashMap<VertexId, VertexAddr>,
        num_edges: usize,
    ) -> Self {
        Self {
            partitions,
            index,
            num_edges,
        }
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[GraphPartition<VV>] {
        &self.partitions
    }

    pub(crate) fn partitions_mut(&mut self) -> &mut [GraphPartition<VV>] {
        &mut self.partitions
    }

    pub fn addr_of(&self, id: VertexId) -> Option<VertexAddr> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn id_at(&self, addr: VertexAddr) -> VertexId {
        self.partitions[addr.partition as usize].id(addr.local as usize)
    }

    pub fn view(&self, addr: VertexAddr) -> VertexView<VV> {
        self.partitions[addr.partition as usize].view(addr.local as usize)
    }

    pub fn value_of(&self, id: VertexId) -> Option<VV> {
        self.addr_of(id)
            .map(|a| self.partitions[a.partition as usize].value(a.local as usize))
    }

    pub fn out_degree(&self, id: VertexId) -> Option<usize> {
        self.addr_of(id)
            .map(|a| self.partitions[a.partition as usize].out_degree(a.local as usize))
    }

    pub fn in_degree(&self, id: VertexId) -> Option<usize> {
        self.addr_of(id)
            .map(|a| self.partitions[a.partition as usize].in_degree(a.local as usize))
    }

    /// Sources of the edges pointing at `id`, i.e. its followers.
    pub fn in_neighbors(&self, id: VertexId) -> Option<Vec<VertexId>> {
        self.addr_of(id).map(|a| {
            self.partitions[a.partition as usize]
                .in_edges(a.local as usize)
                .iter()
                .map(|&s| self.id_at(s))
                .collect()
        })
    }

    pub fn out_neighbors(&self, id: VertexId) -> Option<Vec<VertexId>> {
        self.addr_of(id).map(|a| {
            self.partitions[a.partition as usize]
                .out_edges(a.local as usize)
                .iter()
                .map(|&t| self.id_at(t))
                .collect()
        })
    }
}

impl<VV> PGraph<VV> for PartitionedGraph<VV>
where
    VV: Copy + Send + Sync + 'static,
{
    fn num_vertices(&self) -> usize {
        self.index.len()
    }

    fn num_edges(&self) -> usize {
        self.num_edges
    }

    fn transform_vertices<F>(&mut self, f: F)
    where
        F: Fn(VertexId, &mut VV) + Send + Sync,
    {
        self.partitions.par_iter_mut().for_each(|p| {
            for (id, value) in p.ids.iter().zip(p.values.iter_mut()) {
                f(*id, value);
            }
        });
    }

    fn vertices(&self) -> Vec<Vertex<VertexId, VV>> {
        self.partitions
            .iter()
            .flat_map(|p| {
                p.ids
                    .iter()
                    .zip(p.values.iter())
                    .map(|(&id, &value)| Vertex::new(id, value))
            })
            .collect()
    }
}
