//! CLI command implementations
//!
//! - **test**: run the test command across a project's work set (default)
//! - **affected**: print a project's blast radius without running anything
//!
//! All commands accept `&MetaRepoContext` so the root and config load once.

pub mod affected;

pub use affected::{OutputFormat, run_affected};
pub use test::run_test;
