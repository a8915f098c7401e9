pub mod function;
pub mod graph;
