//! Colored pass/fail report lines
//!
//! Styling uses `anstyle`, like the `--help` styles in main.rs. Color is dropped when
//! stdout is not a terminal or `NO_COLOR` is set.

use anstyle::{AnsiColor, Color, Style};
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
  enabled: bool,
}

impl Palette {
  /// Colors on for an interactive stdout
  pub fn detect() -> Self {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    if no_color || !std::io::stdout().is_terminal() {
      return Self::plain();
    }
    Self { enabled: true }
  }

  pub fn plain() -> Self {
    Self { enabled: false }
  }

  fn paint(&self, style: Style, text: &str) -> String {
    if self.enabled {
      format!("{}{}{}", style.render(), text, style.render_reset())
    } else {
      text.to_string()
    }
  }

  pub fn green(&self, text: &str) -> String {
    self.paint(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))), text)
  }

  pub fn red(&self, text: &str) -> String {
    self.paint(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))), text)
  }
}
