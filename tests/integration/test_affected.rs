//! Integration tests for `blastradius --affected`

use crate::helpers::{TestMetaRepo, run_blastradius, run_blastradius_ok, stdout};
use anyhow::Result;

fn names(meta: &TestMetaRepo, project: &str) -> Result<Vec<String>> {
  let output = run_blastradius_ok(&meta.path, &["--affected", "--format", "names-only", project])?;
  Ok(stdout(&output).lines().map(String::from).filter(|l| !l.is_empty()).collect())
}

#[test]
fn test_affected_chain() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project("b", &["a"])?;
  meta.add_project("c", &["b"])?;

  assert_eq!(names(&meta, "a")?, vec!["b"]);
  assert_eq!(names(&meta, "b")?, vec!["c"]);
  assert!(names(&meta, "c")?.is_empty());

  Ok(())
}

#[test]
fn test_affected_ignores_registry_packages() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project("d", &["left-pad", "a"])?;

  assert_eq!(names(&meta, "a")?, vec!["d"]);

  // left-pad is not a project of this meta-repo
  let output = run_blastradius(&meta.path, &["--affected", "left-pad"])?;
  assert_eq!(output.status.code(), Some(1));

  Ok(())
}

#[test]
fn test_affected_json_output() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("core", &[])?;
  meta.add_project("web", &["core"])?;
  meta.add_project("api", &["core"])?;

  let output = run_blastradius_ok(&meta.path, &["--affected", "--format", "json", "core"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout(&output))?;

  assert_eq!(json["project"], "core");
  assert_eq!(json["affected"], serde_json::json!(["api", "web"]));
  assert_eq!(json["work_set"].as_array().map(|a| a.len()), Some(3));

  Ok(())
}

#[test]
fn test_affected_with_root_flag() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project("b", &["a"])?;

  let elsewhere = tempfile::TempDir::new()?;
  let root = meta.path.display().to_string();
  let output = run_blastradius_ok(
    elsewhere.path(),
    &["--root", &root, "--affected", "--format", "names-only", "a"],
  )?;
  assert_eq!(stdout(&output).trim(), "b");

  Ok(())
}

#[test]
fn test_missing_root_names_the_path() -> Result<()> {
  let elsewhere = tempfile::TempDir::new()?;
  let missing = elsewhere.path().join("no-such-meta-repo");
  let root = missing.display().to_string();

  let output = run_blastradius(elsewhere.path(), &["--root", &root, "--affected", "a"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Failed to resolve meta-repo root"));
  assert!(stderr.contains("no-such-meta-repo"));

  Ok(())
}

#[test]
fn test_unknown_project_fails() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;

  let output = run_blastradius(&meta.path, &["--affected", "nonexistent"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("nonexistent not found"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_broken_manifest_aborts() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project_raw("b", "{ \"dependencies\": ")?;

  let output = run_blastradius(&meta.path, &["--affected", "a"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Couldn't read manifest in b"), "stderr: {}", stderr);
  assert!(stdout(&output).is_empty());

  Ok(())
}

#[test]
fn test_dirs_without_manifest_are_skipped() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  std::fs::create_dir(meta.path.join("docs"))?;
  std::fs::create_dir(meta.path.join(".github"))?;
  std::fs::write(meta.path.join(".github").join("package.json"), "not json")?;

  let output = run_blastradius_ok(&meta.path, &["--affected", "a"])?;
  assert!(stdout(&output).contains("No other project depends on it"));

  Ok(())
}

#[test]
fn test_dev_dependencies_from_config() -> Result<()> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project_raw("b", r#"{ "devDependencies": { "a": "*" } }"#)?;

  assert!(names(&meta, "a")?.is_empty());

  meta.write_config("[manifest]\ninclude_dev_dependencies = true\n")?;
  assert_eq!(names(&meta, "a")?, vec!["b"]);

  Ok(())
}
