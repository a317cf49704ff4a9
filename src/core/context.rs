//! Meta-repo context - build once, pass everywhere
//!
//! Holds the meta-repo root and its configuration. Projects and the blast
//! radius index are deliberately not cached here: every calculation reloads
//! manifests from disk.

use crate::core::config::BlastConfig;
use crate::core::error::{BlastResult, ResultExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MetaRepoContext {
  /// Meta-repo root directory (absolute path)
  pub root: PathBuf,

  /// blastradius.toml, or defaults when absent
  pub config: Arc<BlastConfig>,
}

impl MetaRepoContext {
  /// Build context from a root directory.
  pub fn build(root: &Path) -> BlastResult<Self> {
    let root = root
      .canonicalize()
      .with_context(|| format!("Failed to resolve meta-repo root {}", root.display()))?;
    let config = Arc::new(BlastConfig::load(&root)?);

    Ok(Self { root, config })
  }

  /// Get meta-repo root as Path reference (convenience)
  pub fn root(&self) -> &Path {
    &self.root
  }
}
