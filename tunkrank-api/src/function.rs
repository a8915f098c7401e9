use tunkrank_common::types::VertexId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    None,
    In,
    Out,
    All,
}

impl EdgeDirection {
    pub fn includes_in(self) -> bool {
        matches!(self, EdgeDirection::In | EdgeDirection::All)
    }

    pub fn includes_out(self) -> bool {
        matches!(self, EdgeDirection::Out | EdgeDirection::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexView<VV> {
    pub id: VertexId,
    pub value: VV,
    pub num_in_edges: usize,
    pub num_out_edges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView<VV> {
    pub source: VertexView<VV>,
    pub target: VertexView<VV>,
}

/// Values that fit in a lock-free 64-bit cell.
pub trait VertexValue: Copy + Send + Sync + 'static {
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

impl VertexValue for f64 {
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

/// `combine` must be associative and commutative.
pub trait GatherValue: Copy + Send + Sync + 'static {
    fn zero() -> Self;
    fn combine(self, other: Self) -> Self;
}

impl GatherValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn combine(self, other: Self) -> Self {
        self + other
    }
}

pub trait VertexProgramContext {
    fn signal(&mut self, vertex_id: VertexId);
}

/// Gather-Apply-Scatter vertex program. `apply` is the only place a vertex
/// value changes; the `State` it returns lives until the scatter of the same
/// step.
pub trait VertexProgram: Send + Sync + 'static {
    type Value: VertexValue;
    type Gather: GatherValue;
    type State: Send + 'static;

    fn name(&self) -> &str;

    fn gather_edges(&self, _vertex: &VertexView<Self::Value>) -> EdgeDirection {
        EdgeDirection::In
    }

    fn gather(&self, vertex: &VertexView<Self::Value>, edge: &EdgeView<Self::Value>)
        -> Self::Gather;

    fn apply(
        &self,
        context: &mut dyn VertexProgramContext,
        vertex: &mut VertexView<Self::Value>,
        total: Self::Gather,
    ) -> Self::State;

    fn scatter_edges(&self, vertex: &VertexView<Self::Value>, state: &Self::State)
        -> EdgeDirection;

    fn scatter(
        &self,
        _context: &mut dyn VertexProgramContext,
        _vertex: &VertexView<Self::Value>,
        _edge: &EdgeView<Self::Value>,
    ) {
    }
}
