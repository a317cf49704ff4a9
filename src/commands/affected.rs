//! `blastradius --affected <project>` - Show which projects a change would affect
//!
//! Prints the blast radius only; no test command is run.

use crate::core::context::MetaRepoContext;
use crate::core::error::{BlastError, BlastResult};
use crate::graph::calculate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Output format for affected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  NamesOnly,
}

impl OutputFormat {
  pub fn parse(s: &str) -> BlastResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::NamesOnly),
      _ => Err(BlastError::InvalidArgument(format!(
        "Unknown format '{}'. Valid formats: text, json, names-only",
        s
      ))),
    }
  }
}

#[derive(Debug, Serialize)]
struct AffectedReport<'a> {
  project: &'a str,
  /// Direct dependents only
  affected: &'a BTreeSet<String>,
  /// `project` plus `affected`
  work_set: Vec<&'a str>,
}

/// Run the affected command
pub fn run_affected(ctx: &MetaRepoContext, project: &str, format: OutputFormat) -> BlastResult<()> {
  let affected = calculate(ctx.root(), project, &ctx.config.manifest)?;
  println!("{}", render(project, &affected, format)?);
  Ok(())
}

fn render(project: &str, affected: &BTreeSet<String>, format: OutputFormat) -> BlastResult<String> {
  let rendered = match format {
    OutputFormat::Text => {
      let mut out = format!("Blast radius of {}\n", project);
      out.push_str(&"=".repeat(out.len() - 1));
      out.push('\n');
      if affected.is_empty() {
        out.push_str("No other project depends on it\n");
      } else {
        out.push_str(&format!("{} project(s) depend on it:\n", affected.len()));
        for name in affected {
          out.push_str(&format!("  ⬆  {}\n", name));
        }
      }
      out.push_str(&format!("\nWork set: {} project(s)", affected.len() + 1));
      out
    }
    OutputFormat::Json => {
      let report = AffectedReport {
        project,
        affected,
        work_set: std::iter::once(project).chain(affected.iter().map(String::as_str)).collect(),
      };
      serde_json::to_string_pretty(&report)?
    }
    OutputFormat::NamesOnly => affected.iter().cloned().collect::<Vec<_>>().join("\n"),
  };
  Ok(rendered)
}
