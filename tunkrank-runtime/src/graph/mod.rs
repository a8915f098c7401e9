pub mod builder;
pub mod partitioned_graph;
