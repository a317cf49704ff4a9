//! Single test-command execution
//!
//! Runs one command in one project directory and turns the outcome into a
//! `TestedProject`. stdout and stderr are drained by two reader threads into
//! one shared buffer, so the result holds both streams interleaved roughly in
//! the order the child wrote them.
//!
//! Output is held in memory until the command exits. A command that prints
//! without bound grows the buffer without bound unless `max_output_bytes` is
//! set; bytes past the cap are read and discarded.

use crate::core::config::TestConfig;
use crate::core::error::{BlastError, BlastResult};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Exit code reported when the test command could not be started at all.
/// Real processes never report a negative status.
pub const EXIT_DISPATCH_FAILED: i32 = -1;

/// Exit code reported when the test command was killed after its timeout.
pub const EXIT_TIMED_OUT: i32 = -2;

/// Exit code used when a process ended without a code or a signal
const EXIT_UNKNOWN: i32 = 1;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long readers may drain after a timed-out group is killed
const READER_GRACE: Duration = Duration::from_millis(500);

/// Outcome of testing one project. Produced exactly once per dispatched project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestedProject {
  pub name: String,
  pub exit_code: i32,
  /// Raw combined stdout + stderr
  pub output: Vec<u8>,
}

impl TestedProject {
  /// Result for a project whose command never ran
  pub fn dispatch_failed(name: impl Into<String>, err: &BlastError) -> Self {
    Self {
      name: name.into(),
      exit_code: EXIT_DISPATCH_FAILED,
      output: format!("failed to run test command: {}\n", err).into_bytes(),
    }
  }

  pub fn passed(&self) -> bool {
    self.exit_code == 0
  }

  /// The test command never produced a real exit status
  pub fn is_sentinel(&self) -> bool {
    self.exit_code < 0
  }

  pub fn output_lossy(&self) -> String {
    String::from_utf8_lossy(&self.output).into_owned()
  }
}

/// The command each affected project is tested with.
#[derive(Debug, Clone)]
pub struct TestCommand {
  /// Program followed by its arguments
  pub argv: Vec<String>,
  pub timeout: Option<Duration>,
  pub max_output_bytes: Option<usize>,
}

impl TestCommand {
  pub fn new(argv: Vec<String>) -> Self {
    Self {
      argv,
      timeout: None,
      max_output_bytes: None,
    }
  }

  pub fn from_config(config: &TestConfig) -> Self {
    Self {
      timeout: config.timeout(),
      max_output_bytes: config.max_output_bytes,
      ..Self::new(config.command.clone())
    }
  }

  /// A command needs a program and at least one argument
  pub fn validate(&self) -> BlastResult<()> {
    if self.argv.len() < 2 {
      return Err(BlastError::InvalidArgument(
        "Not enough arguments passed for command".to_string(),
      ));
    }
    Ok(())
  }

  /// Shell-ish rendering for plans and logs
  pub fn display(&self) -> String {
    self.argv.join(" ")
  }
}

/// Run `command` with `dir` as its working directory.
///
/// A command that runs and exits nonzero is `Ok`. `Err` means it never ran:
/// too few tokens, or the program could not be spawned.
///
/// With a timeout the command leads its own process group, and the deadline
/// covers the whole group: anything it started in the background and that
/// still holds the output pipes at the deadline is killed along with it.
pub fn execute_tests(name: &str, dir: &Path, command: &TestCommand) -> BlastResult<TestedProject> {
  command.validate()?;

  let mut cmd = Command::new(&command.argv[0]);
  cmd
    .args(&command.argv[1..])
    .current_dir(dir)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

  #[cfg(unix)]
  if command.timeout.is_some() {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
  }

  let mut child = cmd.spawn()?;

  let buffer = Arc::new(Mutex::new(OutputBuffer::new(command.max_output_bytes)));
  let readers = [
    child.stdout.take().map(|s| spawn_reader(s, Arc::clone(&buffer))),
    child.stderr.take().map(|s| spawn_reader(s, Arc::clone(&buffer))),
  ];

  let exit_code = match command.timeout {
    Some(timeout) => {
      let deadline = Instant::now() + timeout;
      match wait_until(&mut child, deadline)? {
        Some(status) if join_readers_until(&readers, deadline) => resolve_exit_code(status),
        Some(_) => {
          tracing::warn!(
            project = %name,
            timeout_secs = timeout.as_secs(),
            "test command exited but left processes holding its output, killed"
          );
          kill_process_group(&mut child);
          timed_out(&buffer, &readers, timeout)
        }
        None => {
          tracing::warn!(project = %name, timeout_secs = timeout.as_secs(), "test command timed out, killed");
          kill_process_group(&mut child);
          let _ = child.wait();
          timed_out(&buffer, &readers, timeout)
        }
      }
    }
    None => {
      let status = child.wait()?;
      join_readers(readers);
      resolve_exit_code(status)
    }
  };

  let output = lock(&buffer).take();
  Ok(TestedProject {
    name: name.to_string(),
    exit_code,
    output,
  })
}

fn timed_out(buffer: &Mutex<OutputBuffer>, readers: &Readers, timeout: Duration) -> i32 {
  // Give the readers a moment to drain what the killed group already wrote
  join_readers_until(readers, Instant::now() + READER_GRACE);
  lock(buffer).note(&format!("\n[blastradius] test command timed out after {:?}\n", timeout));
  EXIT_TIMED_OUT
}

/// Map a process exit status to an integer.
///
/// Signal deaths follow the shell convention of `128 + signal`. A status with
/// neither a code nor a signal is reported as a failure, never as success.
pub fn resolve_exit_code(status: ExitStatus) -> i32 {
  if let Some(code) = status.code() {
    return code;
  }

  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return 128 + signal;
    }
  }

  EXIT_UNKNOWN
}

/// Wait for `child` until `deadline`; `None` if it is still running then
fn wait_until(child: &mut Child, deadline: Instant) -> BlastResult<Option<ExitStatus>> {
  loop {
    if let Some(status) = child.try_wait()? {
      return Ok(Some(status));
    }
    if Instant::now() >= deadline {
      return Ok(None);
    }
    thread::sleep(POLL_INTERVAL);
  }
}

/// SIGKILL every process in the child's group
#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
  use nix::errno::Errno;
  use nix::sys::signal::{Signal, killpg};
  use nix::unistd::Pid;

  // The child was spawned as group leader, so its pid is the group id
  match killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
    Ok(()) | Err(Errno::ESRCH) => {}
    Err(e) => {
      tracing::warn!(pid = child.id(), error = %e, "failed to kill process group, killing child only");
      let _ = child.kill();
    }
  }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
  let _ = child.kill();
}

type Readers = [Option<JoinHandle<()>>; 2];

fn spawn_reader<R: Read + Send + 'static>(mut source: R, buffer: Arc<Mutex<OutputBuffer>>) -> JoinHandle<()> {
  thread::spawn(move || {
    let mut chunk = [0u8; 8192];
    loop {
      match source.read(&mut chunk) {
        Ok(0) | Err(_) => break,
        Ok(n) => lock(&buffer).push(&chunk[..n]),
      }
    }
  })
}

fn join_readers(readers: Readers) {
  for reader in readers.into_iter().flatten() {
    let _ = reader.join();
  }
}

/// Wait for both readers to hit EOF, giving up at `deadline`.
///
/// Readers hit EOF once every process holding the pipes has exited. A reader
/// still running when this gives up stays detached and its later bytes are lost.
fn join_readers_until(readers: &Readers, deadline: Instant) -> bool {
  loop {
    if readers.iter().flatten().all(|r| r.is_finished()) {
      return true;
    }
    if Instant::now() >= deadline {
      return false;
    }
    thread::sleep(POLL_INTERVAL);
  }
}

fn lock(buffer: &Mutex<OutputBuffer>) -> std::sync::MutexGuard<'_, OutputBuffer> {
  // A reader that panicked mid-push leaves valid bytes behind
  buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Combined output with an optional byte cap
struct OutputBuffer {
  bytes: Vec<u8>,
  limit: Option<usize>,
  truncated: bool,
}

impl OutputBuffer {
  fn new(limit: Option<usize>) -> Self {
    Self {
      bytes: Vec::new(),
      limit,
      truncated: false,
    }
  }

  fn push(&mut self, chunk: &[u8]) {
    let room = match self.limit {
      Some(limit) => limit.saturating_sub(self.bytes.len()),
      None => chunk.len(),
    };
    if room < chunk.len() {
      self.truncated = true;
    }
    self.bytes.extend_from_slice(&chunk[..room.min(chunk.len())]);
  }

  /// Append a message regardless of the cap
  fn note(&mut self, msg: &str) {
    self.bytes.extend_from_slice(msg.as_bytes());
  }

  fn take(&mut self) -> Vec<u8> {
    if self.truncated {
      self.truncated = false;
      self.note("\n[blastradius] output truncated (max_output_bytes reached)\n");
    }
    std::mem::take(&mut self.bytes)
  }
}
