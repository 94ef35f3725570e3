//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! Only operators, parentheses and decimal literals exist. Two-character
//! comparisons are probed before single characters so `<=` never splits into
//! `<` and a stray `=`. Signs are left to the parser.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{CompileResult, LexErrorKind, LexSnafu};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Num(i64),
  Eof,
  Eq,
  Ne,
  Le,
  Ge,
  Plus,
  Minus,
  Star,
  Slash,
  LParen,
  RParen,
  Lt,
  Gt,
}

impl TokenKind {
  fn punctuator(text: &str) -> Option<Self> {
    let kind = match text {
      "==" => Self::Eq,
      "!=" => Self::Ne,
      "<=" => Self::Le,
      ">=" => Self::Ge,
      "+" => Self::Plus,
      "-" => Self::Minus,
      "*" => Self::Star,
      "/" => Self::Slash,
      "(" => Self::LParen,
      ")" => Self::RParen,
      "<" => Self::Lt,
      ">" => Self::Gt,
      _ => return None,
    };
    Some(kind)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Num(value) => write!(f, "{value}"),
      Self::Eof => f.write_str("EOF"),
      Self::Eq => f.write_str("=="),
      Self::Ne => f.write_str("!="),
      Self::Le => f.write_str("<="),
      Self::Ge => f.write_str(">="),
      Self::Plus => f.write_str("+"),
      Self::Minus => f.write_str("-"),
      Self::Star => f.write_str("*"),
      Self::Slash => f.write_str("/"),
      Self::LParen => f.write_str("("),
      Self::RParen => f.write_str(")"),
      Self::Lt => f.write_str("<"),
      Self::Gt => f.write_str(">"),
    }
  }
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:>4}  {}", self.loc, self.kind)
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if let Some((kind, len)) = ["==", "!=", "<=", ">="]
      .into_iter()
      .find(|op| input[i..].starts_with(op))
      .and_then(|op| TokenKind::punctuator(op).map(|kind| (kind, op.len())))
    {
      tokens.push(Token::new(kind, i, len));
      i += len;
      continue;
    }

    if c.is_ascii()
      && let Some(kind) = TokenKind::punctuator(&input[i..i + 1])
    {
      tokens.push(Token::new(kind, i, 1));
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text.parse::<i64>().map_err(|_| {
        LexSnafu {
          expr: input,
          loc: start,
          fragment: text,
          kind: LexErrorKind::NumberOutOfRange,
        }
        .build()
      })?;
      tokens.push(Token::new(TokenKind::Num(value), start, i - start));
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return LexSnafu {
      expr: input,
      loc: i,
      fragment: invalid_char.to_string(),
      kind: LexErrorKind::InvalidToken,
    }
    .fail();
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));

  for token in &tokens {
    trace!(loc = token.loc, kind = %token.kind, "token");
  }
  debug!(count = tokens.len(), "tokenized input");
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
