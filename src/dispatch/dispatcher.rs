//! Concurrent test dispatch over a project's blast radius
//!
//! ```text
//! run_tests_on()            supervisor thread            workers (one per project)
//!   validate + calculate  ─▶  thread::scope  ──spawn──▶    execute_tests()
//!   return ResultStream       join all N     ◀──────────   send exactly one TestedProject
//!                             drop sender => stream closes
//! ```
//!
//! Every project in the work set gets its own OS thread, started at once. The
//! platform parallelism only sizes the result buffer; it never caps the number
//! of workers. Results arrive in completion order.

use super::executor::{TestCommand, TestedProject, execute_tests};
use crate::core::context::MetaRepoContext;
use crate::core::error::{BlastError, BlastResult};
use crate::graph::blast_radius;
use crate::manifest::{Projects, load_repos};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, SyncSender, channel, sync_channel};
use std::thread;
use std::time::Instant;

/// One project to test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTarget {
  pub name: String,
  pub dir: PathBuf,
}

/// Stream of per-project results, closed once every worker has finished.
///
/// Iterating blocks until the next result arrives and ends after exactly
/// `expected()` results.
pub struct ResultStream {
  rx: Receiver<TestedProject>,
  expected: usize,
}

impl ResultStream {
  /// Size of the work set, i.e. how many results will be yielded
  pub fn expected(&self) -> usize {
    self.expected
  }
}

impl Iterator for ResultStream {
  type Item = TestedProject;

  fn next(&mut self) -> Option<Self::Item> {
    self.rx.recv().ok()
  }
}

/// Everything that must be tested for a change to `project`: the project
/// itself first, then its direct dependents in name order.
pub fn work_set(ctx: &MetaRepoContext, projects: &Projects, project: &str) -> BlastResult<Vec<TestTarget>> {
  let affected = blast_radius(ctx.root(), projects, project)?;

  let mut targets = Vec::with_capacity(affected.len() + 1);
  targets.push(project.to_string());
  targets.extend(affected);

  Ok(
    targets
      .into_iter()
      .filter_map(|name| {
        projects.get(&name).map(|p| TestTarget {
          name,
          dir: p.dir.clone(),
        })
      })
      .collect(),
  )
}

/// Test `project` and every project that directly depends on it.
///
/// Loading, lookup and command validation happen before this returns, so a
/// missing project or broken manifest fails here and nothing is spawned. The
/// returned stream fills in as workers finish.
pub fn run_tests_on(ctx: &MetaRepoContext, project: &str, command: &TestCommand) -> BlastResult<ResultStream> {
  command.validate()?;

  let projects = load_repos(ctx.root(), &ctx.config.manifest)?;
  let targets = work_set(ctx, &projects, project)?;

  tracing::info!(
    project,
    work_set = targets.len(),
    command = %command.display(),
    "dispatching tests"
  );

  Ok(dispatch(targets, command.clone()))
}

/// Spawn one worker per target and hand back the result stream immediately.
pub fn dispatch(targets: Vec<TestTarget>, command: TestCommand) -> ResultStream {
  let expected = targets.len();
  let buffer = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
  let (tx, rx) = sync_channel(buffer);

  // Detached: the caller reads the stream while workers run
  let supervisor = thread::Builder::new()
    .name("blastradius-supervisor".to_string())
    .spawn({
      let targets = targets.clone();
      move || supervise(targets, &command, tx)
    });

  match supervisor {
    Ok(_) => ResultStream { rx, expected },
    Err(e) => {
      tracing::error!(error = %e, "failed to spawn supervisor thread");
      not_run(targets, &BlastError::from(e))
    }
  }
}

/// A closed stream reporting every target as not run.
///
/// Filled on the calling thread before anyone reads it, so the channel is
/// unbounded.
fn not_run(targets: Vec<TestTarget>, err: &BlastError) -> ResultStream {
  let expected = targets.len();
  let (tx, rx) = channel();
  for target in targets {
    let _ = tx.send(TestedProject::dispatch_failed(target.name, err));
  }
  ResultStream { rx, expected }
}

/// Run all workers and return once every one of them has sent its result.
///
/// The scope is the counting join; dropping `tx` afterwards closes the stream.
fn supervise(targets: Vec<TestTarget>, command: &TestCommand, tx: SyncSender<TestedProject>) {
  thread::scope(|s| {
    for target in targets {
      let worker_tx = tx.clone();
      let spawned = thread::Builder::new()
        .name(format!("test-{}", target.name))
        .spawn_scoped(s, {
          let target = target.clone();
          move || {
            let result = run_worker(&target, command);
            // The consumer may have stopped listening; nothing else to do then
            let _ = worker_tx.send(result);
          }
        });

      if let Err(e) = spawned {
        tracing::error!(project = %target.name, error = %e, "failed to spawn worker");
        let _ = tx.send(TestedProject::dispatch_failed(target.name, &BlastError::from(e)));
      }
    }
  });

  tracing::debug!("all workers finished, closing result stream");
}

fn run_worker(target: &TestTarget, command: &TestCommand) -> TestedProject {
  let started = Instant::now();
  tracing::debug!(project = %target.name, dir = %target.dir.display(), "worker started");

  let result = match execute_tests(&target.name, &target.dir, command) {
    Ok(result) => result,
    Err(e) => {
      tracing::warn!(project = %target.name, error = %e, "test command could not be run");
      TestedProject::dispatch_failed(&target.name, &e)
    }
  };

  tracing::debug!(
    project = %target.name,
    exit_code = result.exit_code,
    elapsed_ms = started.elapsed().as_millis() as u64,
    "worker finished"
  );
  result
}
