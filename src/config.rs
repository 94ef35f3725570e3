//! Knobs shared by the library and the command-line driver.

use std::str::FromStr;

use snafu::Snafu;

/// Assembler dialect used when rendering a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
  /// `.intel_syntax noprefix`, destination first.
  #[default]
  Intel,
  /// `.att_syntax prefix`, source first, `%`/`$` sigils.
  Att,
}

/// Which stage the driver prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
  #[default]
  Asm,
  Tokens,
  Ast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
  pub syntax: Syntax,
  pub emit: Emit,
}

impl Options {
  pub fn with_syntax(mut self, syntax: Syntax) -> Self {
    self.syntax = syntax;
    self
  }

  pub fn with_emit(mut self, emit: Emit) -> Self {
    self.emit = emit;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("unknown {what}: '{value}'"))]
pub struct UnknownValue {
  what: &'static str,
  value: String,
}

impl FromStr for Syntax {
  type Err = UnknownValue;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "intel" => Ok(Self::Intel),
      "att" | "at&t" => Ok(Self::Att),
      _ => UnknownValueSnafu {
        what: "syntax",
        value: s,
      }
      .fail(),
    }
  }
}

impl FromStr for Emit {
  type Err = UnknownValue;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "asm" => Ok(Self::Asm),
      "tokens" => Ok(Self::Tokens),
      "ast" => Ok(Self::Ast),
      _ => UnknownValueSnafu {
        what: "emit mode",
        value: s,
      }
      .fail(),
    }
  }
}
