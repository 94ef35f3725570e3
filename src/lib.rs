//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns an expression tree.
//! - `codegen` lowers the tree into x86-64 stack-machine code.
//! - `config` carries the dialect and output knobs used by the driver.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod codegen;
pub mod config;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use codegen::{Instr, Program};
pub use config::{Emit, Options, Syntax};
pub use error::{CompileError, CompileResult, LexErrorKind, ParseErrorKind};
pub use parser::{AstNode, BinaryOp};

/// Tokenize and parse the whole expression.
pub fn parse_expr(expr: &str) -> CompileResult<AstNode> {
  let tokens = tokenizer::tokenize(expr)?;
  parser::parse_all(tokens, expr)
}

/// Compile a source string into a `main` that returns its value.
pub fn compile(expr: &str) -> CompileResult<Program> {
  let node = parse_expr(expr)?;
  Ok(Program::new(codegen::generate(&node)))
}

/// Compile a source string into Intel-syntax assembly.
pub fn generate_assembly(expr: &str) -> CompileResult<String> {
  generate_assembly_with(expr, Syntax::default())
}

/// Compile a source string into assembly in the requested dialect.
pub fn generate_assembly_with(expr: &str, syntax: Syntax) -> CompileResult<String> {
  Ok(compile(expr)?.render(syntax))
}

/// Produce the output selected by `options.emit`.
pub fn emit(expr: &str, options: &Options) -> CompileResult<String> {
  match options.emit {
    Emit::Asm => generate_assembly_with(expr, options.syntax),
    Emit::Tokens => {
      let mut out = String::new();
      for token in tokenizer::tokenize(expr)? {
        out.push_str(&token.to_string());
        out.push('\n');
      }
      Ok(out)
    }
    Emit::Ast => Ok(format!("{}\n", parse_expr(expr)?)),
  }
}
