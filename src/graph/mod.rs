//! Dependency graph analysis over meta-repo projects
//!
//! Built on petgraph for the reverse-edge query; the index is never persisted.

pub mod blast_radius;

pub use blast_radius::{blast_radius, calculate};
