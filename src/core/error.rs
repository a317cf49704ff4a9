//! Error types for blastradius with contextual messages and exit codes
//!
//! Loading and validation errors are raised synchronously, before any test
//! worker is spawned. A test command that runs and exits nonzero is a reported
//! result, never a `BlastError`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for blastradius failures (not test results)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (unknown project, bad config, invalid args)
  User = 1,
  /// System error (I/O, unreadable manifests)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for blastradius
#[derive(Debug)]
pub enum BlastError {
  /// Directory listing or file read failure
  Io(io::Error),

  /// A manifest exists but could not be read or deserialized
  Parse { project: String, message: String },

  /// The requested project is not part of the meta-repo
  NotFound { project: String, root: PathBuf },

  /// Malformed invocation (e.g. a test command with fewer than two tokens)
  InvalidArgument(String),

  /// Configuration errors
  Config(ConfigError),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl BlastError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    BlastError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  pub fn not_found(project: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    BlastError::NotFound {
      project: project.into(),
      root: root.into(),
    }
  }

  pub fn parse(project: impl Into<String>, message: impl fmt::Display) -> Self {
    BlastError::Parse {
      project: project.into(),
      message: message.to_string(),
    }
  }

  /// Add context to an existing error
  ///
  /// The variant is kept so callers can still match on it and the exit code
  /// does not change. `NotFound` and `Parse` already name their project and
  /// are returned untouched.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      BlastError::Io(e) => BlastError::Io(io::Error::new(e.kind(), format!("{}: {}", ctx_str, e))),
      BlastError::Message { message, context, help } => BlastError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      BlastError::Io(_) => ExitCode::System,
      BlastError::Parse { .. } => ExitCode::System,
      BlastError::NotFound { .. } => ExitCode::User,
      BlastError::InvalidArgument(_) => ExitCode::User,
      BlastError::Config(_) => ExitCode::User,
      BlastError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      BlastError::NotFound { root, .. } => Some(format!(
        "Projects are the subdirectories of {} that contain a manifest. Run with --affected on a known project to inspect the graph.",
        root.display()
      )),
      BlastError::Parse { project, .. } => Some(format!("Fix the manifest in '{}' and run again.", project)),
      BlastError::InvalidArgument(_) => {
        Some("A test command needs a program and at least one argument, e.g. `yarn test`.".to_string())
      }
      BlastError::Config(e) => e.help_message(),
      BlastError::Message { help, .. } => help.clone(),
      BlastError::Io(_) => None,
    }
  }
}

impl fmt::Display for BlastError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BlastError::Io(e) => write!(f, "I/O error: {}", e),
      BlastError::Parse { project, message } => {
        write!(f, "Couldn't read manifest in {}: {}", project, message)
      }
      BlastError::NotFound { project, .. } => write!(f, "{} not found", project),
      BlastError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
      BlastError::Config(e) => write!(f, "{}", e),
      BlastError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for BlastError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      BlastError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for BlastError {
  fn from(err: io::Error) -> Self {
    BlastError::Io(err)
  }
}

impl From<toml_edit::de::Error> for BlastError {
  fn from(err: toml_edit::de::Error) -> Self {
    BlastError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for BlastError {
  fn from(err: serde_json::Error) -> Self {
    BlastError::message(format!("JSON error: {}", err))
  }
}

impl From<ConfigError> for BlastError {
  fn from(err: ConfigError) -> Self {
    BlastError::Config(err)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Field present but with an unusable value
  InvalidField { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::InvalidField { field, .. } if field == "test.command" => {
        Some("Set `command = [\"yarn\", \"test\"]` under [test] in blastradius.toml.".to_string())
      }
      ConfigError::InvalidField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid value for {} in config: {}", field, reason)
      }
    }
  }
}

/// Result type alias for blastradius
pub type BlastResult<T> = Result<T, BlastError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> BlastResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<BlastError>,
{
  fn with_context<F>(self, f: F) -> BlastResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &BlastError) {
  eprintln!("\n❌ Could not load project: {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
