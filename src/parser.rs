//! Recursive-descent parser producing a binary expression tree.
//!
//! The parser mirrors the classic chibicc structure: one helper per
//! precedence level, lowest first, each folding its operands to the left.
//! `>` and `>=` never reach the tree; they are rewritten as `<` and `<=` with
//! the operands swapped, so later stages only see four comparison operators.

use std::fmt;

use tracing::debug;

use crate::error::{CompileResult, ParseErrorKind, ParseSnafu};
use crate::tokenizer::{Token, TokenKind, describe_token};

/// Binary operators that survive into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Eq => "==",
      Self::Ne => "!=",
      Self::Lt => "<",
      Self::Le => "<=",
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  /// Negation is spelled as subtraction from zero.
  pub fn negate(operand: AstNode) -> Self {
    Self::binary(BinaryOp::Sub, Self::number(0), operand)
  }

  /// Height of the tree; a lone literal has depth 1.
  pub fn depth(&self) -> usize {
    match self {
      Self::Num { .. } => 1,
      Self::Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
    }
  }
}

/// Fully parenthesised prefix form, e.g. `(+ 1 (* 2 3))`.
impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Num { value } => write!(f, "{value}"),
      Self::Binary { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
    }
  }
}

/// Parse a single expression from the token stream.
///
/// Tokens after the expression are left alone; use [`parse_all`] when the
/// whole input must be consumed.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<AstNode> {
  let mut stream = TokenStream::new(tokens, source);
  parse_equality(&mut stream)
}

/// Parse a single expression and reject anything left before `Eof`.
pub fn parse_all(tokens: Vec<Token>, source: &str) -> CompileResult<AstNode> {
  let mut stream = TokenStream::new(tokens, source);
  let node = parse_equality(&mut stream)?;

  if !stream.is_eof() {
    return stream.error(ParseErrorKind::TrailingInput);
  }

  debug!(depth = node.depth(), "parsed expression");
  Ok(node)
}

fn parse_equality(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_relational(stream)?;

  loop {
    if stream.equal(TokenKind::Eq) {
      let rhs = parse_relational(stream)?;
      node = AstNode::binary(BinaryOp::Eq, node, rhs);
    } else if stream.equal(TokenKind::Ne) {
      let rhs = parse_relational(stream)?;
      node = AstNode::binary(BinaryOp::Ne, node, rhs);
    } else {
      return Ok(node);
    }
  }
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_add(stream)?;

  loop {
    if stream.equal(TokenKind::Le) {
      let rhs = parse_add(stream)?;
      node = AstNode::binary(BinaryOp::Le, node, rhs);
    } else if stream.equal(TokenKind::Ge) {
      let rhs = parse_add(stream)?;
      node = AstNode::binary(BinaryOp::Le, rhs, node);
    } else if stream.equal(TokenKind::Lt) {
      let rhs = parse_add(stream)?;
      node = AstNode::binary(BinaryOp::Lt, node, rhs);
    } else if stream.equal(TokenKind::Gt) {
      let rhs = parse_add(stream)?;
      node = AstNode::binary(BinaryOp::Lt, rhs, node);
    } else {
      return Ok(node);
    }
  }
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_mul(stream)?;

  loop {
    let op = if stream.equal(TokenKind::Plus) {
      BinaryOp::Add
    } else if stream.equal(TokenKind::Minus) {
      BinaryOp::Sub
    } else {
      return Ok(node);
    };

    let rhs = parse_mul(stream)?;
    node = AstNode::binary(op, node, rhs);
  }
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_unary(stream)?;

  loop {
    let op = if stream.equal(TokenKind::Star) {
      BinaryOp::Mul
    } else if stream.equal(TokenKind::Slash) {
      BinaryOp::Div
    } else {
      return Ok(node);
    };

    let rhs = parse_unary(stream)?;
    node = AstNode::binary(op, node, rhs);
  }
}

fn parse_unary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal(TokenKind::Plus) {
    return parse_primary(stream);
  }

  if stream.equal(TokenKind::Minus) {
    let operand = parse_primary(stream)?;
    return Ok(AstNode::negate(operand));
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal(TokenKind::LParen) {
    let node = parse_equality(stream)?;
    if !stream.equal(TokenKind::RParen) {
      return stream.error(ParseErrorKind::UnmatchedParen);
    }
    return Ok(node);
  }

  if let Some(value) = stream.get_number() {
    return Ok(AstNode::number(value));
  }

  stream.error(ParseErrorKind::ExpectedPrimary)
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Consume the current token if it is of the given punctuator kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if let Some(token) = self.peek()
      && token.kind == kind
      && kind != TokenKind::Eof
    {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume the current token if it is an integer literal.
  fn get_number(&mut self) -> Option<i64> {
    if let Some(token) = self.peek()
      && let TokenKind::Num(value) = token.kind
    {
      self.pos += 1;
      return Some(value);
    }
    None
  }

  /// Fail at the current token.
  fn error<T>(&self, kind: ParseErrorKind) -> CompileResult<T> {
    let token = self.peek();
    ParseSnafu {
      expr: self.source,
      loc: token.map_or(self.source.len(), |token| token.loc),
      got: describe_token(token, self.source),
      kind,
    }
    .fail()
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof) | None)
  }
}
