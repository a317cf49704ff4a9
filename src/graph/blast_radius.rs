//! Reverse-dependency ("blast radius") analysis
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A declares a dependency on B"
//! - **Nodes**: meta-repo projects only
//! - **Edges**: only dependencies on other loaded projects; registry packages
//!   are dropped since they cannot be tested locally
//!
//! The blast radius of B is its set of incoming neighbours. It is one hop only:
//! dependents of dependents are not included.

use crate::core::config::ManifestConfig;
use crate::core::error::{BlastError, BlastResult};
use crate::manifest::{Projects, load_repos};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Reverse-dependency index over one loaded meta-repo.
///
/// Built fresh for each calculation and discarded afterwards.
pub struct BlastRadiusIndex {
  graph: DiGraph<String, ()>,
  name_to_node: HashMap<String, NodeIndex>,
}

impl BlastRadiusIndex {
  /// Build the index from loaded projects. O(P × D).
  pub fn build(projects: &Projects) -> Self {
    let mut graph = DiGraph::with_capacity(projects.len(), 0);
    let mut name_to_node = HashMap::with_capacity(projects.len());

    for name in projects.keys() {
      let idx = graph.add_node(name.clone());
      name_to_node.insert(name.clone(), idx);
    }

    for (name, project) in projects {
      let from = name_to_node[name];

      for dep in &project.dependencies {
        let Some(&to) = name_to_node.get(dep) else {
          tracing::trace!(project = %name, dependency = %dep, "external dependency, dropped");
          continue;
        };

        // A project never counts as affecting itself
        if to == from {
          tracing::debug!(project = %name, "ignoring self-dependency");
          continue;
        }

        graph.add_edge(from, to, ());
      }
    }

    tracing::debug!(
      projects = graph.node_count(),
      edges = graph.edge_count(),
      "built blast radius index"
    );

    Self { graph, name_to_node }
  }

  /// Whether `name` is a known project
  pub fn contains(&self, name: &str) -> bool {
    self.name_to_node.contains_key(name)
  }

  /// Projects that directly declare a dependency on `name`.
  ///
  /// Unknown names have no dependents.
  pub fn dependents_of(&self, name: &str) -> BTreeSet<String> {
    let Some(&idx) = self.name_to_node.get(name) else {
      return BTreeSet::new();
    };

    self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|n| self.graph[n].clone())
      .collect()
  }

  /// Number of retained (local) dependency edges
  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }
}

/// Projects directly affected by a change to `project`, from already-loaded data.
pub fn blast_radius(root: &Path, projects: &Projects, project: &str) -> BlastResult<BTreeSet<String>> {
  let index = BlastRadiusIndex::build(projects);
  if !index.contains(project) {
    return Err(BlastError::not_found(project, root));
  }

  let affected = index.dependents_of(project);
  tracing::debug!(
    project,
    affected = affected.len(),
    local_edges = index.edge_count(),
    "calculated blast radius"
  );
  Ok(affected)
}

/// Load the meta-repo at `root` and compute the blast radius of `project`.
///
/// Fails with `NotFound` if `project` is not a loaded project. A project
/// nobody depends on yields an empty set.
pub fn calculate(root: &Path, project: &str, manifest: &ManifestConfig) -> BlastResult<BTreeSet<String>> {
  let projects = load_repos(root, manifest)?;
  blast_radius(root, &projects, project)
}
