//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway meta-repo: one directory per project, each with a package.json
pub struct TestMetaRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestMetaRepo {
  /// Create an empty meta-repo with a `.git` directory, like a real checkout
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::create_dir_all(path.join(".git"))?;
    std::fs::write(path.join(".git").join("HEAD"), "ref: refs/heads/main\n")?;
    Ok(Self { _root: root, path })
  }

  /// Add a project whose manifest depends on `deps` (any version)
  pub fn add_project(&self, name: &str, deps: &[&str]) -> Result<PathBuf> {
    let deps_json = deps
      .iter()
      .map(|d| format!("    \"{}\": \"*\"", d))
      .collect::<Vec<_>>()
      .join(",\n");

    let manifest = format!(
      r#"{{
  "name": "{}",
  "version": "1.0.0",
  "dependencies": {{
{}
  }}
}}
"#,
      name, deps_json
    );

    self.add_project_raw(name, &manifest)
  }

  /// Add a project with a literal manifest body
  pub fn add_project_raw(&self, name: &str, manifest: &str) -> Result<PathBuf> {
    let project_path = self.path.join(name);
    std::fs::create_dir_all(&project_path)?;
    std::fs::write(project_path.join("package.json"), manifest)?;
    Ok(project_path)
  }

  /// Drop a file inside a project (used by test commands as a failure marker)
  pub fn touch(&self, project: &str, file: &str) -> Result<()> {
    std::fs::write(self.path.join(project).join(file), "")?;
    Ok(())
  }

  /// Write blastradius.toml at the root
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("blastradius.toml"), content)?;
    Ok(())
  }
}

/// Run the blastradius binary, returning its output whatever the exit status
pub fn run_blastradius(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_blastradius");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env("NO_COLOR", "1")
    .env_remove("BLASTRADIUS_LOG")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run blastradius")
}

/// Run the blastradius binary and fail unless it exits zero
pub fn run_blastradius_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_blastradius(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "blastradius command failed: blastradius {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
