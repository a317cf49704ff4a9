//! Core building blocks shared by every command
//!
//! - **config**: blastradius.toml parsing and validation
//! - **context**: meta-repo root plus config, built once in main.rs
//! - **error**: error types with contextual help messages

pub mod config;
pub mod context;
pub mod error;
