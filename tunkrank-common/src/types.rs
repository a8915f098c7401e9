use serde::{Deserialize, Serialize};

pub type VertexId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Vertex<K, VV> {
    pub id: K,
    pub value: VV,
}

impl<K, VV> Vertex<K, VV> {
    pub fn new(id: K, value: VV) -> Self {
        Self { id, value }
    }
}

/// A directed edge without payload. `src_id -> target_id` reads as
/// "src follows target".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Edge<K> {
    pub src_id: K,
    pub target_id: K,
}

impl<K> Edge<K> {
    pub fn new(src_id: K, target_id: K) -> Self {
        Self { src_id, target_id }
    }
}
