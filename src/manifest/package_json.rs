//! package.json structure (minimal fields we care about)
//!
//! Only dependency names matter. Version specifiers are kept as raw JSON and
//! never interpreted: `"^1.2.0"`, `"file:../a"` and `{ "version": .. }` shapes
//! all deserialize.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub dependencies: BTreeMap<String, Value>,
  #[serde(default)]
  #[serde(rename = "devDependencies")]
  pub dev_dependencies: BTreeMap<String, Value>,
}

impl PackageJson {
  pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
    serde_json::from_slice(bytes)
  }

  /// Deduplicated names this manifest declares a dependency on
  pub fn declared_dependencies(&self, include_dev: bool) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = self.dependencies.keys().cloned().collect();
    if include_dev {
      names.extend(self.dev_dependencies.keys().cloned());
    }
    names
  }
}
