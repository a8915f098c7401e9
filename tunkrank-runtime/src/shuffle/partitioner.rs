use tunkrank_common::types::VertexId;

pub fn partition_of(id: VertexId, partitions: usize) -> usize {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    id.hash(&mut h);
    (h.finish() as usize) % partitions.max(1)
}
