//! Project manifests and meta-repo loading

pub mod loader;
pub mod package_json;

pub use loader::{Projects, load_repos};
