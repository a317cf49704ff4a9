mod commands;
mod core;
mod dispatch;
mod graph;
mod manifest;
mod ui;

use clap::{ArgAction, Parser};
use crate::core::context::MetaRepoContext;
use crate::core::error::{BlastError, BlastResult, print_error};
use crate::dispatch::TestCommand;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Test a meta-repo project and every project that directly depends on it
#[derive(Parser)]
#[command(name = "blastradius")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Project (directory name) that changed
  project: String,

  /// Meta-repo root (default: current directory)
  #[arg(long)]
  root: Option<PathBuf>,

  /// Only print the projects affected by a change, run nothing
  #[arg(long)]
  affected: bool,

  /// Output format for --affected: text (default), json, names-only
  #[arg(long, default_value = "text")]
  format: String,

  /// Show the test plan without execution
  #[arg(long, conflicts_with = "affected")]
  dry_run: bool,

  /// Kill a project's test command after this many seconds
  #[arg(long)]
  timeout: Option<u64>,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,

  /// Test command override, e.g. `-- npm test`
  #[arg(last = true)]
  command: Vec<String>,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr; BLASTRADIUS_LOG or RUST_LOG override the -v level
fn init_logging(verbose: u8) {
  let default_level = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_env("BLASTRADIUS_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

/// Config values, overridden by CLI flags
fn test_command(ctx: &MetaRepoContext, cli: &Cli) -> BlastResult<TestCommand> {
  let mut command = TestCommand::from_config(&ctx.config.test);

  if !cli.command.is_empty() {
    command.argv = cli.command.clone();
  }

  if let Some(secs) = cli.timeout {
    if secs == 0 {
      return Err(BlastError::InvalidArgument("--timeout must be greater than zero".to_string()));
    }
    command.timeout = Some(Duration::from_secs(secs));
  }

  Ok(command)
}

fn run(cli: Cli) -> BlastResult<i32> {
  let root = match &cli.root {
    Some(root) => root.clone(),
    None => std::env::current_dir()?,
  };

  let ctx = MetaRepoContext::build(&root)?;

  if cli.affected {
    let format = commands::OutputFormat::parse(&cli.format)?;
    commands::run_affected(&ctx, &cli.project, format)?;
    return Ok(0);
  }

  let command = test_command(&ctx, &cli)?;
  commands::run_test(&ctx, &cli.project, &command, cli.dry_run)
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli) {
    Ok(code) => std::process::exit(code),
    Err(err) => handle_error(err),
  }
}

fn handle_error(err: BlastError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
