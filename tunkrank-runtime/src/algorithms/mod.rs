pub mod tunkrank;
