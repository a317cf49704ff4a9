//! Terminal output helpers

pub mod report;

pub use report::Palette;
