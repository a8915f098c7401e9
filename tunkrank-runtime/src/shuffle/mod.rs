pub mod partitioner;

use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::VertexId;

use crate::graph::partitioned_graph::PartitionedGraph;
use crate::scheduler::ActiveSet;

pub type Outbox = Vec<VertexId>;

pub trait SignalShuffle: Send + Sync {
    /// Returns how many vertices became newly active.
    fn route_outbox<VV>(
        &self,
        graph: &PartitionedGraph<VV>,
        outbox: Outbox,
        next: &mut [ActiveSet],
    ) -> TunkRankResult<usize>
    where
        VV: Copy + Send + Sync + 'static;
}

pub struct LocalShuffle;

impl SignalShuffle for LocalShuffle {
    fn route_outbox<VV>(
        &self,
        graph: &PartitionedGraph<VV>,
        outbox: Outbox,
        next: &mut [ActiveSet],
    ) -> TunkRankResult<usize>
    where
        VV: Copy + Send + Sync + 'static,
    {
        let mut activated = 0;
        for target in outbox {
            let addr = graph.addr_of(target).ok_or_else(|| {
                TunkRankError::InvalidArgument(format!("signal to unknown vertex {target}"))
            })?;
            if next[addr.partition as usize].activate(addr.local as usize) {
                activated += 1;
            }
        }
        Ok(activated)
    }
}
