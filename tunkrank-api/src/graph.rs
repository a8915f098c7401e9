pub use tunkrank_common::types::{Edge, Vertex, VertexId};

pub trait PGraph<VV> {
    fn num_vertices(&self) -> usize;

    fn num_edges(&self) -> usize;

    fn transform_vertices<F>(&mut self, f: F)
    where
        F: Fn(VertexId, &mut VV) + Send + Sync;

    fn vertices(&self) -> Vec<Vertex<VertexId, VV>>;
}
