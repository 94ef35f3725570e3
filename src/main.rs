use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use r9cc::{CompileError, Emit, Options, Syntax};
use snafu::{ResultExt, Snafu};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Compile an arithmetic expression into x86-64 assembly for `main`.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
  /// Expression to compile, e.g. "1+2*3" or "-5+8".
  #[arg(allow_hyphen_values = true)]
  expr: String,

  /// Assembler dialect: intel or att.
  #[arg(long, default_value = "intel")]
  syntax: Syntax,

  /// What to print: asm, tokens or ast.
  #[arg(long, default_value = "asm")]
  emit: Emit,

  /// Write output to this file instead of stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,
}

#[derive(Debug, Snafu)]
enum DriverError {
  #[snafu(display("{source}"))]
  Compile { source: CompileError },

  #[snafu(display("cannot write '{}': {source}", path.display()))]
  Write { path: PathBuf, source: io::Error },
}

fn run(args: Args) -> Result<(), DriverError> {
  let options = Options::default()
    .with_syntax(args.syntax)
    .with_emit(args.emit);
  debug!(?options, expr = %args.expr, "compiling");

  let out = r9cc::emit(&args.expr, &options).context(CompileSnafu)?;

  match args.output {
    Some(path) => fs::write(&path, out).context(WriteSnafu { path })?,
    None => print!("{out}"),
  }
  Ok(())
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  if let Err(err) = run(Args::parse()) {
    eprintln!("{err}");
    process::exit(1);
  }
}
