//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – these routines format
//! messages in a style reminiscent of chibicc, pointing at the offending
//! byte with a caret. Lexing and parsing failures stay distinct variants so
//! callers can tell them apart and recover the offending offset.

use std::fmt;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Why the tokenizer gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
  /// A character that starts no token (`=`, letters, stray symbols).
  InvalidToken,
  /// A digit run that does not fit in a machine integer.
  NumberOutOfRange,
}

impl fmt::Display for LexErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidToken => f.write_str("invalid token"),
      Self::NumberOutOfRange => f.write_str("number out of range"),
    }
  }
}

/// Why the parser gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
  /// `(` whose matching `)` never showed up.
  UnmatchedParen,
  /// Something other than a number or `(` where an operand was required.
  ExpectedPrimary,
  /// Tokens left over after a complete expression.
  TrailingInput,
}

impl fmt::Display for ParseErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnmatchedParen => f.write_str("unmatched opening parenthesis"),
      Self::ExpectedPrimary => f.write_str("expected number or parenthesis"),
      Self::TrailingInput => f.write_str("unexpected trailing input"),
    }
  }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{}", caret(expr, *loc, &format!("{kind}: '{fragment}'"))))]
  Lex {
    expr: String,
    loc: usize,
    fragment: String,
    kind: LexErrorKind,
  },

  #[snafu(display("{}", caret(expr, *loc, &format!("{kind}, but got \"{got}\""))))]
  Parse {
    expr: String,
    loc: usize,
    got: String,
    kind: ParseErrorKind,
  },
}

impl CompileError {
  /// Byte offset into the source where the problem was detected.
  pub fn loc(&self) -> usize {
    match self {
      Self::Lex { loc, .. } | Self::Parse { loc, .. } => *loc,
    }
  }

  pub fn is_lex(&self) -> bool {
    matches!(self, Self::Lex { .. })
  }

  pub fn is_parse(&self) -> bool {
    matches!(self, Self::Parse { .. })
  }

  pub fn lex_kind(&self) -> Option<LexErrorKind> {
    match self {
      Self::Lex { kind, .. } => Some(*kind),
      Self::Parse { .. } => None,
    }
  }

  pub fn parse_kind(&self) -> Option<ParseErrorKind> {
    match self {
      Self::Parse { kind, .. } => Some(*kind),
      Self::Lex { .. } => None,
    }
  }
}

/// Render `message` under the quoted source with a caret at byte `loc`.
fn caret(expr: &str, loc: usize, message: &str) -> String {
  let expr_line = format!("'{expr}'");
  let mut safe_loc = loc.min(expr.len());
  while !expr.is_char_boundary(safe_loc) {
    safe_loc -= 1;
  }
  let char_offset = expr[..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  format!("{expr_line}\n{marker} {message}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caret_points_at_offending_byte() {
    let err = CompileError::Lex {
      expr: "1+a".to_string(),
      loc: 2,
      fragment: "a".to_string(),
      kind: LexErrorKind::InvalidToken,
    };
    assert_eq!(err.to_string(), "'1+a'\n   ^ invalid token: 'a'");
    assert_eq!(err.loc(), 2);
    assert!(err.is_lex());
    assert_eq!(err.parse_kind(), None);
  }

  #[test]
  fn caret_at_end_of_input() {
    let err = CompileError::Parse {
      expr: "(1".to_string(),
      loc: 2,
      got: "EOF".to_string(),
      kind: ParseErrorKind::UnmatchedParen,
    };
    assert_eq!(
      err.to_string(),
      "'(1'\n   ^ unmatched opening parenthesis, but got \"EOF\""
    );
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnmatchedParen));
  }

  #[test]
  fn caret_counts_characters_not_bytes() {
    let rendered = caret("é+x", 3, "boom");
    assert_eq!(rendered, "'é+x'\n   ^ boom");
  }
}
