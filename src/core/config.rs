use crate::core::error::{BlastResult, ConfigError, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for blastradius
/// Searched in order: blastradius.toml, .blastradius.toml, .config/blastradius.toml
///
/// Every field has a default, so a meta-repo without a config file behaves
/// exactly like one with an empty file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlastConfig {
  #[serde(default)]
  pub test: TestConfig,
  #[serde(default)]
  pub manifest: ManifestConfig,
}

/// How each affected project is tested
///
/// # Example
///
/// ```toml
/// [test]
/// command = ["npm", "test"]
/// timeout_secs = 600
/// max_output_bytes = 1048576
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
  /// Program plus arguments, run with the project directory as cwd
  #[serde(default = "default_test_command")]
  pub command: Vec<String>,

  /// Kill a test command that runs longer than this (no limit when unset)
  #[serde(default)]
  pub timeout_secs: Option<u64>,

  /// Keep at most this many bytes of combined output per project
  /// Output is otherwise held fully in memory
  #[serde(default)]
  pub max_output_bytes: Option<usize>,
}

fn default_test_command() -> Vec<String> {
  vec!["yarn".to_string(), "test".to_string()]
}

impl Default for TestConfig {
  fn default() -> Self {
    Self {
      command: default_test_command(),
      timeout_secs: None,
      max_output_bytes: None,
    }
  }
}

impl TestConfig {
  /// Validate test configuration
  pub fn validate(&self) -> BlastResult<()> {
    if self.command.len() < 2 {
      return Err(
        ConfigError::InvalidField {
          field: "test.command".to_string(),
          reason: format!("expected a program and at least one argument, got {:?}", self.command),
        }
        .into(),
      );
    }

    if self.timeout_secs == Some(0) {
      return Err(
        ConfigError::InvalidField {
          field: "test.timeout_secs".to_string(),
          reason: "must be greater than zero".to_string(),
        }
        .into(),
      );
    }

    Ok(())
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_secs.map(Duration::from_secs)
  }
}

/// Where and how project manifests are read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
  /// Manifest file name inside each project directory
  #[serde(default = "default_manifest_file")]
  pub file: String,

  /// Treat devDependencies as edges too
  #[serde(default)]
  pub include_dev_dependencies: bool,
}

fn default_manifest_file() -> String {
  "package.json".to_string()
}

impl Default for ManifestConfig {
  fn default() -> Self {
    Self {
      file: default_manifest_file(),
      include_dev_dependencies: false,
    }
  }
}

impl ManifestConfig {
  pub fn validate(&self) -> BlastResult<()> {
    if self.file.trim().is_empty() {
      return Err(
        ConfigError::InvalidField {
          field: "manifest.file".to_string(),
          reason: "must not be empty".to_string(),
        }
        .into(),
      );
    }
    Ok(())
  }
}

impl BlastConfig {
  /// Find config file in search order: blastradius.toml, .blastradius.toml, .config/blastradius.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("blastradius.toml"),
      path.join(".blastradius.toml"),
      path.join(".config").join("blastradius.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the meta-repo root, falling back to defaults when no file exists
  pub fn load(path: &Path) -> BlastResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no config file found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: BlastConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate()?;

    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
  }

  pub fn validate(&self) -> BlastResult<()> {
    self.test.validate()?;
    self.manifest.validate()
  }
}
