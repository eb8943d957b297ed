//! Shared error taxonomy for the compilation pipeline.
//!
//! Every error here is fatal: the first one aborts compilation with no
//! partial instruction text and no diagnostic aggregation.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// Rendered diagnostic from the grammar collaborator.
  #[snafu(display("{message}"))]
  Parse { message: String },

  /// The first assignment to a name must carry its type annotation.
  #[snafu(display("first assignment to \"{name}\" in {function} is missing a type annotation"))]
  MissingType { name: String, function: String },

  /// An identifier was referenced before any assignment in its scope.
  #[snafu(display("name \"{name}\" is not defined in {function}"))]
  UndefinedName { name: String, function: String },

  /// The operator has no entry in the lowering table.
  #[snafu(display("operator \"{operator}\" has no lowering"))]
  UnknownOperator { operator: String },

  /// Two functions share a name; the symbol table refuses to overwrite.
  #[snafu(display("function \"{name}\" is declared more than once"))]
  DuplicateFunction { name: String },
}
