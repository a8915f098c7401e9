//! Graph sources and result sinks.

pub mod generator;
pub mod loader;
pub mod writer;

pub use generator::{generate_powerlaw, PowerLawSpec};
pub use loader::{load_graph, GraphFormat};
pub use writer::save_partitioned;
