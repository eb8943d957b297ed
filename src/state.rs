//! Compile state: per-function symbol tables and label counters.
//!
//! Slot indices are positional: a local or argument is addressed by its
//! 0-based position in its function's table at the moment it was first
//! inserted, and reusing a name never creates a new slot. The label
//! counters are shared across the whole compilation so every construct
//! instance gets a number unique for the run.

use std::fmt;

use snafu::ensure;

use crate::ast::Type;
use crate::error::{CompileResult, DuplicateFunctionSnafu, MissingTypeSnafu, UndefinedNameSnafu};

/// Name of the pseudo-function holding top-level statements.
pub const GLOBAL_SCOPE: &str = "global";

/// Symbol table of one function. Both tables are ordered: position is the
/// slot index used by push/pop instructions.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
  pub return_type: Type,
  pub arguments: Vec<(String, Type)>,
  pub locals: Vec<(String, Type)>,
}

/// Where an identifier resolved, with its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
  Local(usize),
  Argument(usize),
}

/// Mutable context threaded through code generation. Created once per
/// compilation; afterwards only inspected for diagnostics.
#[derive(Debug)]
pub struct CompileState {
  functions: Vec<(String, FunctionInfo)>,
  if_count: usize,
  while_count: usize,
  for_count: usize,
}

impl CompileState {
  pub fn new() -> Self {
    let global = FunctionInfo {
      return_type: Type::void(),
      arguments: Vec::new(),
      locals: Vec::new(),
    };
    Self {
      functions: vec![(GLOBAL_SCOPE.to_string(), global)],
      if_count: 0,
      while_count: 0,
      for_count: 0,
    }
  }

  /// Register a function's symbol table with an empty locals mapping.
  /// A second declaration of the same name is refused rather than
  /// silently overwritten.
  pub fn declare_function(
    &mut self,
    name: &str,
    arguments: Vec<(String, Type)>,
    return_type: Type,
  ) -> CompileResult<()> {
    ensure!(
      self.functions.iter().all(|(existing, _)| existing != name),
      DuplicateFunctionSnafu { name }
    );
    self.functions.push((
      name.to_string(),
      FunctionInfo {
        return_type,
        arguments,
        locals: Vec::new(),
      },
    ));
    Ok(())
  }

  pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
    self
      .functions
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, info)| info)
  }

  fn function_mut(&mut self, name: &str) -> &mut FunctionInfo {
    self
      .functions
      .iter_mut()
      .find(|(existing, _)| existing == name)
      .map(|(_, info)| info)
      .expect("scope is registered before code generation")
  }

  /// Return the slot for `name` in `function`, appending a fresh local on
  /// its first assignment. A new name must carry its type annotation; a
  /// re-supplied annotation on a known name is ignored.
  pub fn declare_or_get_slot(
    &mut self,
    function: &str,
    name: &str,
    annotation: Option<&Type>,
  ) -> CompileResult<usize> {
    let info = self.function_mut(function);
    if let Some(index) = info.locals.iter().position(|(local, _)| local == name) {
      return Ok(index);
    }
    let Some(annotation) = annotation else {
      return MissingTypeSnafu { name, function }.fail();
    };
    let index = info.locals.len();
    info.locals.push((name.to_string(), annotation.clone()));
    Ok(index)
  }

  /// Resolve an identifier within one function's scope, locals first.
  pub fn resolve(&self, function: &str, name: &str) -> CompileResult<Binding> {
    let info = self
      .function(function)
      .expect("scope is registered before code generation");
    if let Some(index) = info.locals.iter().position(|(local, _)| local == name) {
      return Ok(Binding::Local(index));
    }
    if let Some(index) = info
      .arguments
      .iter()
      .position(|(argument, _)| argument == name)
    {
      return Ok(Binding::Argument(index));
    }
    UndefinedNameSnafu { name, function }.fail()
  }

  pub fn locals_count(&self, function: &str) -> usize {
    self
      .function(function)
      .map(|info| info.locals.len())
      .unwrap_or(0)
  }

  pub fn next_if_label(&mut self) -> usize {
    let number = self.if_count;
    self.if_count += 1;
    number
  }

  pub fn next_while_label(&mut self) -> usize {
    let number = self.while_count;
    self.while_count += 1;
    number
  }

  pub fn next_for_label(&mut self) -> usize {
    let number = self.for_count;
    self.for_count += 1;
    number
  }
}

impl Default for CompileState {
  fn default() -> Self {
    Self::new()
  }
}

/// Debug dump of the resolved function symbol tables.
impl fmt::Display for CompileState {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for (name, info) in &self.functions {
      writeln!(f, "function {name} -> {}", info.return_type.0)?;
      for (index, (argument, ty)) in info.arguments.iter().enumerate() {
        writeln!(f, "  arg {index}: {argument}: {}", ty.0)?;
      }
      for (index, (local, ty)) in info.locals.iter().enumerate() {
        writeln!(f, "  local {index}: {local}: {}", ty.0)?;
      }
    }
    Ok(())
  }
}
