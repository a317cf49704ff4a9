//! Meta-repo project discovery
//!
//! A project is an immediate, non-hidden subdirectory of the meta-repo root
//! that contains a manifest. Anything else is skipped without error.
//!
//! Loading is all-or-nothing: a listing failure or a single unreadable
//! manifest aborts the whole load.

use super::package_json::PackageJson;
use crate::core::config::ManifestConfig;
use crate::core::error::{BlastError, BlastResult};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A project in the meta-repo, keyed by its directory name.
#[derive(Debug, Clone)]
pub struct Project {
  pub name: String,
  pub dir: PathBuf,
  /// Every dependency name the manifest declares, local or not
  pub dependencies: BTreeSet<String>,
}

/// All projects found under a meta-repo root
pub type Projects = BTreeMap<String, Project>;

/// Load every project under `root`.
///
/// Manifests are read and parsed in parallel; directory enumeration is not.
pub fn load_repos(root: &Path, manifest: &ManifestConfig) -> BlastResult<Projects> {
  let candidates = candidate_dirs(root)?;
  tracing::debug!(root = %root.display(), candidates = candidates.len(), "scanning meta-repo");

  let loaded: Vec<Option<Project>> = candidates
    .into_par_iter()
    .map(|(name, dir)| load_project(name, dir, manifest))
    .collect::<BlastResult<_>>()?;

  let projects: Projects = loaded.into_iter().flatten().map(|p| (p.name.clone(), p)).collect();

  tracing::debug!(projects = projects.len(), "loaded projects");
  Ok(projects)
}

/// Immediate subdirectories of `root`, skipping files and dot-directories
fn candidate_dirs(root: &Path) -> BlastResult<Vec<(String, PathBuf)>> {
  let mut dirs = Vec::new();

  for entry in fs::read_dir(root)? {
    let entry = entry?;
    // file_type() does not follow symlinks
    if !entry.file_type()?.is_dir() {
      continue;
    }

    let Some(name) = entry.file_name().to_str().map(str::to_string) else {
      tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 directory name");
      continue;
    };

    if name.starts_with('.') {
      continue;
    }

    dirs.push((name, entry.path()));
  }

  Ok(dirs)
}

fn load_project(name: String, dir: PathBuf, manifest: &ManifestConfig) -> BlastResult<Option<Project>> {
  let manifest_path = dir.join(&manifest.file);
  if !manifest_path.exists() {
    tracing::trace!(project = %name, "no manifest, not a project");
    return Ok(None);
  }

  let bytes = fs::read(&manifest_path).map_err(|e| BlastError::parse(&name, e))?;
  let pkg = PackageJson::from_slice(&bytes).map_err(|e| BlastError::parse(&name, e))?;

  // Projects are keyed by directory; a differing package name is only noted
  if let Some(declared) = pkg.name.as_deref().filter(|n| *n != name) {
    tracing::debug!(project = %name, package_name = declared, "manifest name differs from directory name");
  }

  Ok(Some(Project {
    dependencies: pkg.declared_dependencies(manifest.include_dev_dependencies),
    name,
    dir,
  }))
}
