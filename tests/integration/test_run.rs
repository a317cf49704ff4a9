//! Integration tests for running tests across a blast radius

use crate::helpers::{TestMetaRepo, run_blastradius, run_blastradius_ok, stdout};
use anyhow::Result;

const FAIL_IF_MARKED: &str = "if [ -f fail ]; then echo \"broken in $(basename \"$PWD\")\"; exit 3; fi";

fn chain() -> Result<TestMetaRepo> {
  let meta = TestMetaRepo::new()?;
  meta.add_project("a", &[])?;
  meta.add_project("b", &["a"])?;
  meta.add_project("c", &["b"])?;
  meta.add_project("d", &["a", "left-pad"])?;
  Ok(meta)
}

#[test]
fn test_all_pass() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius_ok(&meta.path, &["a", "--", "sh", "-c", FAIL_IF_MARKED])?;
  let out = stdout(&output);

  assert!(out.contains("Test pass: a"));
  assert!(out.contains("Test pass: b"));
  assert!(out.contains("Test pass: d"));
  // c only depends on b, not on a
  assert!(!out.contains("Test pass: c"));
  assert!(out.contains("3 passed, 0 failed"));

  Ok(())
}

#[test]
fn test_exit_status_is_sum_of_failures() -> Result<()> {
  let meta = chain()?;
  meta.touch("b", "fail")?;
  meta.touch("d", "fail")?;

  let output = run_blastradius(&meta.path, &["a", "--", "sh", "-c", FAIL_IF_MARKED])?;
  assert_eq!(output.status.code(), Some(6));

  let out = stdout(&output);
  assert!(out.contains("Test pass: a"));
  assert!(out.contains("Test failed: b (exit 3)"));
  assert!(out.contains("broken in b"));
  assert!(out.contains("Test failed: d (exit 3)"));
  assert!(out.contains("1 passed, 2 failed"));

  Ok(())
}

#[test]
fn test_leaf_project_tests_only_itself() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius_ok(&meta.path, &["c", "--", "sh", "-c", "exit 0"])?;
  let out = stdout(&output);
  assert!(out.contains("Test pass: c"));
  assert!(out.contains("1 passed, 0 failed"));

  Ok(())
}

#[test]
fn test_unknown_project_runs_nothing() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius(&meta.path, &["nonexistent", "--", "sh", "-c", "touch ran"])?;
  assert_eq!(output.status.code(), Some(1));
  for project in ["a", "b", "c", "d"] {
    assert!(!meta.path.join(project).join("ran").exists());
  }

  Ok(())
}

#[test]
fn test_single_token_command_rejected() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius(&meta.path, &["a", "--", "true"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Not enough arguments"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_unstartable_command_is_reported() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius(&meta.path, &["c", "--", "definitely-not-a-real-program-xyz", "test"])?;
  assert_eq!(output.status.code(), Some(1));
  let out = stdout(&output);
  assert!(out.contains("Test could not run: c"), "stdout: {}", out);

  Ok(())
}

#[test]
fn test_command_from_config() -> Result<()> {
  let meta = chain()?;
  meta.write_config("[test]\ncommand = [\"sh\", \"-c\", \"touch ran\"]\n")?;

  run_blastradius_ok(&meta.path, &["b"])?;
  assert!(meta.path.join("b").join("ran").exists());
  assert!(meta.path.join("c").join("ran").exists());
  assert!(!meta.path.join("a").join("ran").exists());

  Ok(())
}

#[test]
fn test_timeout_flag() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius(&meta.path, &["c", "--timeout", "1", "--", "sh", "-c", "exec sleep 30"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stdout(&output).contains("Test timed out: c"));

  Ok(())
}

#[test]
fn test_dry_run_spawns_nothing() -> Result<()> {
  let meta = chain()?;

  let output = run_blastradius_ok(&meta.path, &["a", "--dry-run", "--", "sh", "-c", "touch ran"])?;
  let out = stdout(&output);
  assert!(out.contains("DRY RUN: Would execute in 3 project(s)"));
  assert!(!meta.path.join("a").join("ran").exists());

  Ok(())
}
