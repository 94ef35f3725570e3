//! Reference interpreter for emitted instruction streams.
//!
//! Executes a `Program` the way an x86-64 CPU would for the small subset of
//! instructions the code generator produces, so tests can check what a
//! compiled expression evaluates to without an assembler.

use r9cc::Program;
use r9cc::codegen::{Cond, Instr, Reg};

#[derive(Default)]
struct Machine {
  rax: i64,
  rdi: i64,
  rdx: i64,
  flags: (i64, i64),
  stack: Vec<i64>,
}

impl Machine {
  fn reg(&mut self, reg: Reg) -> &mut i64 {
    match reg {
      Reg::Rax => &mut self.rax,
      Reg::Rdi => &mut self.rdi,
    }
  }

  fn get(&mut self, reg: Reg) -> i64 {
    *self.reg(reg)
  }
}

/// Run `program` and return the value left in `%rax` at `ret`.
///
/// Panics if the program pops an empty stack or returns with values still
/// pushed, which would corrupt the caller's frame on real hardware.
pub fn run(program: &Program) -> i64 {
  let mut m = Machine::default();

  for &instr in program.instrs() {
    match instr {
      Instr::PushImm(value) => m.stack.push(value),
      Instr::MovImm(reg, value) => *m.reg(reg) = value,
      Instr::Push(reg) => {
        let value = m.get(reg);
        m.stack.push(value);
      }
      Instr::Pop(reg) => {
        let value = m.stack.pop().expect("pop from empty stack");
        *m.reg(reg) = value;
      }
      Instr::Add(dst, src) => {
        let rhs = m.get(src);
        let lhs = m.reg(dst);
        *lhs = lhs.wrapping_add(rhs);
      }
      Instr::Sub(dst, src) => {
        let rhs = m.get(src);
        let lhs = m.reg(dst);
        *lhs = lhs.wrapping_sub(rhs);
      }
      Instr::Imul(dst, src) => {
        let rhs = m.get(src);
        let lhs = m.reg(dst);
        *lhs = lhs.wrapping_mul(rhs);
      }
      Instr::Cqo => m.rdx = if m.rax < 0 { -1 } else { 0 },
      Instr::Idiv(reg) => {
        let divisor = m.get(reg) as i128;
        let dividend = ((m.rdx as i128) << 64) | (m.rax as u64 as i128);
        assert!(divisor != 0, "division by zero");
        m.rax = (dividend / divisor) as i64;
        m.rdx = (dividend % divisor) as i64;
      }
      Instr::Cmp(lhs, rhs) => m.flags = (m.get(lhs), m.get(rhs)),
      Instr::Set(cond) => {
        let (lhs, rhs) = m.flags;
        let bit = match cond {
          Cond::Eq => lhs == rhs,
          Cond::Ne => lhs != rhs,
          Cond::Lt => lhs < rhs,
          Cond::Le => lhs <= rhs,
        };
        m.rax = (m.rax & !0xff) | i64::from(bit);
      }
      Instr::MovzxAl => m.rax &= 0xff,
      Instr::Ret => {
        assert!(m.stack.is_empty(), "returned with {} values on the stack", m.stack.len());
        return m.rax;
      }
    }
  }

  panic!("program fell off the end without ret");
}

/// Compile and evaluate `expr`, panicking on compile errors.
pub fn eval(expr: &str) -> i64 {
  let program = r9cc::compile(expr).unwrap_or_else(|err| panic!("{expr}: {err}"));
  run(&program)
}
