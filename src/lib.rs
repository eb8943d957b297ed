//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `parser` delegates lexing and parsing to the pest grammar and hands
//!   back the raw parse tree.
//! - `ast` rewrites the raw tree, bottom-up, into typed node variants.
//! - `state` owns the per-function symbol tables and label counters.
//! - `codegen` lowers the typed tree into stack-machine instruction text.
//! - `error` centralises the failure taxonomy shared by the other modules.

pub mod ast;
pub mod error;
pub mod parser;
pub mod state;

mod codegen;

pub use error::{CompileError, CompileResult};
pub use state::{CompileState, GLOBAL_SCOPE};

/// Compile a source string into instruction text.
pub fn compile(source: &str) -> CompileResult<String> {
  let (instructions, _) = compile_with_state(source)?;
  Ok(instructions)
}

/// Compile and keep the populated `CompileState` so the resolved symbol
/// tables can be inspected afterwards.
pub fn compile_with_state(source: &str) -> CompileResult<(String, CompileState)> {
  let tree = parser::parse(source)?;
  let program = ast::build(tree);
  let mut state = CompileState::new();
  let instructions = codegen::generate(&program, &mut state, GLOBAL_SCOPE)?;
  Ok((instructions, state))
}
