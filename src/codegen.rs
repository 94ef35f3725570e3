//! Code generation: lower the parsed AST into x86-64 assembly.
//!
//! The emitter uses a simple stack machine: every expression leaves a single
//! value on the stack. Binary nodes evaluate the left operand, then the
//! right, pop them into `%rdi` (right) and `%rax` (left), combine into
//! `%rax` and push the result back. Instructions are kept as data until the
//! very end so the same program can be printed in either assembler dialect.

use std::fmt::Write as _;

use tracing::debug;

use crate::config::Syntax;
use crate::parser::{AstNode, BinaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Rax,
  Rdi,
}

impl Reg {
  fn name(self, syntax: Syntax) -> &'static str {
    match (self, syntax) {
      (Self::Rax, Syntax::Intel) => "rax",
      (Self::Rdi, Syntax::Intel) => "rdi",
      (Self::Rax, Syntax::Att) => "%rax",
      (Self::Rdi, Syntax::Att) => "%rdi",
    }
  }
}

/// Condition tested by a `setcc` after a signed compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
  Eq,
  Ne,
  Lt,
  Le,
}

impl Cond {
  fn suffix(self) -> &'static str {
    match self {
      Self::Eq => "e",
      Self::Ne => "ne",
      Self::Lt => "l",
      Self::Le => "le",
    }
  }
}

/// The handful of x86-64 instructions the stack machine needs.
///
/// Two-register forms are `(dst, src)`; `Cmp` is `(lhs, rhs)` and sets flags
/// for `lhs - rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
  /// Push a literal that fits a sign-extended 32-bit immediate.
  PushImm(i64),
  MovImm(Reg, i64),
  Push(Reg),
  Pop(Reg),
  Add(Reg, Reg),
  Sub(Reg, Reg),
  Imul(Reg, Reg),
  /// Sign-extend `%rax` into `%rdx:%rax`.
  Cqo,
  /// Signed divide `%rdx:%rax`; quotient lands in `%rax`.
  Idiv(Reg),
  Cmp(Reg, Reg),
  /// `setcc %al`.
  Set(Cond),
  /// Zero-extend `%al` into the whole of `%rax`.
  MovzxAl,
  Ret,
}

impl Instr {
  /// Change in operand-stack depth caused by this instruction.
  pub fn stack_effect(self) -> isize {
    match self {
      Self::PushImm(_) | Self::Push(_) => 1,
      Self::Pop(_) => -1,
      _ => 0,
    }
  }

  pub fn render(self, syntax: Syntax) -> String {
    match syntax {
      Syntax::Intel => self.render_intel(),
      Syntax::Att => self.render_att(),
    }
  }

  fn render_intel(self) -> String {
    let r = |reg: Reg| reg.name(Syntax::Intel);
    match self {
      Self::PushImm(value) => format!("push {value}"),
      Self::MovImm(dst, value) => format!("mov {}, {value}", r(dst)),
      Self::Push(reg) => format!("push {}", r(reg)),
      Self::Pop(reg) => format!("pop {}", r(reg)),
      Self::Add(dst, src) => format!("add {}, {}", r(dst), r(src)),
      Self::Sub(dst, src) => format!("sub {}, {}", r(dst), r(src)),
      Self::Imul(dst, src) => format!("imul {}, {}", r(dst), r(src)),
      Self::Cqo => "cqo".to_string(),
      Self::Idiv(reg) => format!("idiv {}", r(reg)),
      Self::Cmp(lhs, rhs) => format!("cmp {}, {}", r(lhs), r(rhs)),
      Self::Set(cond) => format!("set{} al", cond.suffix()),
      Self::MovzxAl => "movzx eax, al".to_string(),
      Self::Ret => "ret".to_string(),
    }
  }

  fn render_att(self) -> String {
    let r = |reg: Reg| reg.name(Syntax::Att);
    match self {
      Self::PushImm(value) => format!("push ${value}"),
      Self::MovImm(dst, value) => format!("mov ${value}, {}", r(dst)),
      Self::Push(reg) => format!("push {}", r(reg)),
      Self::Pop(reg) => format!("pop {}", r(reg)),
      Self::Add(dst, src) => format!("add {}, {}", r(src), r(dst)),
      Self::Sub(dst, src) => format!("sub {}, {}", r(src), r(dst)),
      Self::Imul(dst, src) => format!("imul {}, {}", r(src), r(dst)),
      Self::Cqo => "cqo".to_string(),
      Self::Idiv(reg) => format!("idiv {}", r(reg)),
      Self::Cmp(lhs, rhs) => format!("cmp {}, {}", r(rhs), r(lhs)),
      Self::Set(cond) => format!("set{} %al", cond.suffix()),
      Self::MovzxAl => "movzbl %al, %eax".to_string(),
      Self::Ret => "ret".to_string(),
    }
  }
}

/// A complete `main`: the expression body followed by the return trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
  instrs: Vec<Instr>,
}

impl Program {
  /// Wrap an expression body that leaves exactly one value on the stack.
  pub fn new(mut body: Vec<Instr>) -> Self {
    body.push(Instr::Pop(Reg::Rax));
    body.push(Instr::Ret);
    Self { instrs: body }
  }

  pub fn instrs(&self) -> &[Instr] {
    &self.instrs
  }

  /// Print the program as a standalone assembly file.
  pub fn render(&self, syntax: Syntax) -> String {
    let mut asm = String::new();
    match syntax {
      Syntax::Intel => asm.push_str(".intel_syntax noprefix\n"),
      Syntax::Att => asm.push_str(".att_syntax prefix\n"),
    }
    asm.push_str(".global main\n");
    asm.push_str("main:\n");
    for instr in &self.instrs {
      let _ = writeln!(asm, "    {}", instr.render(syntax));
    }
    asm
  }
}

/// Emit stack-machine code for an expression tree.
///
/// The returned sequence leaves exactly one value, the expression's result,
/// on the stack.
pub fn generate(node: &AstNode) -> Vec<Instr> {
  let mut emitter = Emitter::default();
  emitter.emit_expr(node);
  debug_assert_eq!(emitter.depth, 1, "expression must leave one value on the stack");
  debug!(count = emitter.instrs.len(), "generated instructions");
  emitter.instrs
}

#[derive(Default)]
struct Emitter {
  instrs: Vec<Instr>,
  depth: isize,
}

impl Emitter {
  fn push(&mut self, instr: Instr) {
    self.depth += instr.stack_effect();
    self.instrs.push(instr);
  }

  /// Emit stack-based code for a single expression node.
  fn emit_expr(&mut self, node: &AstNode) {
    match node {
      AstNode::Num { value } => {
        if i32::try_from(*value).is_ok() {
          self.push(Instr::PushImm(*value));
        } else {
          self.push(Instr::MovImm(Reg::Rax, *value));
          self.push(Instr::Push(Reg::Rax));
        }
      }
      AstNode::Binary { op, lhs, rhs } => {
        self.emit_expr(lhs);
        self.emit_expr(rhs);
        self.push(Instr::Pop(Reg::Rdi));
        self.push(Instr::Pop(Reg::Rax));
        match op {
          BinaryOp::Add => self.push(Instr::Add(Reg::Rax, Reg::Rdi)),
          BinaryOp::Sub => self.push(Instr::Sub(Reg::Rax, Reg::Rdi)),
          BinaryOp::Mul => self.push(Instr::Imul(Reg::Rax, Reg::Rdi)),
          BinaryOp::Div => {
            self.push(Instr::Cqo);
            self.push(Instr::Idiv(Reg::Rdi));
          }
          BinaryOp::Eq => self.compare(Cond::Eq),
          BinaryOp::Ne => self.compare(Cond::Ne),
          BinaryOp::Lt => self.compare(Cond::Lt),
          BinaryOp::Le => self.compare(Cond::Le),
        }
        self.push(Instr::Push(Reg::Rax));
      }
    }
  }

  fn compare(&mut self, cond: Cond) {
    self.push(Instr::Cmp(Reg::Rax, Reg::Rdi));
    self.push(Instr::Set(cond));
    self.push(Instr::MovzxAl);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse_all;
  use crate::tokenizer::tokenize;

  fn body(input: &str) -> Vec<Instr> {
    let tokens = tokenize(input).unwrap();
    generate(&parse_all(tokens, input).unwrap())
  }

  fn depth(instrs: &[Instr]) -> isize {
    instrs.iter().map(|instr| instr.stack_effect()).sum()
  }

  #[test]
  fn literal_is_a_single_push() {
    assert_eq!(body("42"), vec![Instr::PushImm(42)]);
  }

  #[test]
  fn wide_literal_goes_through_rax() {
    assert_eq!(
      body("4294967296"),
      vec![Instr::MovImm(Reg::Rax, 4294967296), Instr::Push(Reg::Rax)]
    );
  }

  #[test]
  fn binary_operands_in_order() {
    assert_eq!(
      body("7-2"),
      vec![
        Instr::PushImm(7),
        Instr::PushImm(2),
        Instr::Pop(Reg::Rdi),
        Instr::Pop(Reg::Rax),
        Instr::Sub(Reg::Rax, Reg::Rdi),
        Instr::Push(Reg::Rax),
      ]
    );
  }

  #[test]
  fn division_sign_extends() {
    let instrs = body("9/3");
    assert_eq!(&instrs[4..6], &[Instr::Cqo, Instr::Idiv(Reg::Rdi)]);
  }

  #[test]
  fn greater_than_compares_swapped_operands() {
    assert_eq!(
      body("1>2"),
      vec![
        Instr::PushImm(2),
        Instr::PushImm(1),
        Instr::Pop(Reg::Rdi),
        Instr::Pop(Reg::Rax),
        Instr::Cmp(Reg::Rax, Reg::Rdi),
        Instr::Set(Cond::Lt),
        Instr::MovzxAl,
        Instr::Push(Reg::Rax),
      ]
    );
  }

  #[test]
  fn every_expression_leaves_one_value() {
    for input in ["1", "1+2*3", "(1+2)*(3-4)/5", "-1<=2==(3>4)", "1!=2!=3"] {
      assert_eq!(depth(&body(input)), 1, "{input}");
    }
  }

  #[test]
  fn program_trailer_pops_result() {
    let program = Program::new(body("5"));
    assert_eq!(
      program.instrs(),
      &[Instr::PushImm(5), Instr::Pop(Reg::Rax), Instr::Ret]
    );
    assert_eq!(depth(program.instrs()), 0);
  }

  #[test]
  fn render_intel() {
    let asm = Program::new(body("1<2")).render(Syntax::Intel);
    let expected = "\
.intel_syntax noprefix
.global main
main:
    push 1
    push 2
    pop rdi
    pop rax
    cmp rax, rdi
    setl al
    movzx eax, al
    push rax
    pop rax
    ret
";
    assert_eq!(asm, expected);
  }

  #[test]
  fn render_att() {
    let asm = Program::new(body("6/3*2")).render(Syntax::Att);
    let expected = "\
.att_syntax prefix
.global main
main:
    push $6
    push $3
    pop %rdi
    pop %rax
    cqo
    idiv %rdi
    push %rax
    push $2
    pop %rdi
    pop %rax
    imul %rdi, %rax
    push %rax
    pop %rax
    ret
";
    assert_eq!(asm, expected);
  }

  #[test]
  fn render_wide_literal() {
    let program = Program::new(body("4294967296"));
    assert!(program.render(Syntax::Intel).contains("    mov rax, 4294967296\n"));
    assert!(program.render(Syntax::Att).contains("    mov $4294967296, %rax\n"));
  }
}
